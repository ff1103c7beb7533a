use dioxus::prelude::*;

use crate::api::{self, PopulationAreaData, PredictionData};
use sheltermap_shared::predict::BASE_YEAR;

fn area_label(area: &PopulationAreaData) -> String {
    let name = area
        .name
        .clone()
        .unwrap_or_else(|| area.grunnkretsnummer.clone());
    match &area.municipality {
        Some(municipality) => format!("{} ({})", name, municipality),
        None => name,
    }
}

/// Population projection form: pick a grunnkrets (or click one on the
/// map), pick a year, call the prediction API.
#[component]
pub fn PredictionPanel(areas: Vec<PopulationAreaData>, selected_area: Signal<String>) -> Element {
    let mut year = use_signal(|| BASE_YEAR + 6);
    let mut result = use_signal(|| None::<Result<PredictionData, String>>);

    let current = selected_area.read().clone();
    let chosen_year = *year.read();

    let population_line: Option<Element> = areas
        .iter()
        .find(|a| a.grunnkretsnummer == current)
        .map(|a| a.population)
        .map(|population| {
            rsx! {
                p { class: "muted", "Befolkning i dag: {population} personer" }
            }
        });

    let result_view: Option<Element> = match &*result.read() {
        Some(Ok(prediction)) => {
            let growth = format!(
                "Endring: {:+} personer ({:+.1} %)",
                prediction.predicted_growth, prediction.growth_percentage
            );
            let projected = format!(
                "Framskrevet befolkning {}: {}",
                chosen_year, prediction.predicted_population
            );
            Some(rsx! {
                div { class: "prediction-result",
                    p { "{projected}" }
                    p { "{growth}" }
                }
            })
        }
        Some(Err(message)) => {
            let message = message.clone();
            Some(rsx! {
                p { class: "error", "{message}" }
            })
        }
        None => None,
    };

    rsx! {
        div { class: "panel",
            h3 { "Befolkningsframskrivning" }

            select {
                value: "{current}",
                onchange: move |evt: Event<FormData>| {
                    selected_area.set(evt.value().to_string());
                    result.set(None);
                },
                option {
                    value: "",
                    disabled: true,
                    selected: current.is_empty(),
                    "Velg grunnkrets"
                }
                for area in &areas {
                    option {
                        value: "{area.grunnkretsnummer}",
                        selected: current == area.grunnkretsnummer,
                        {area_label(area)}
                    }
                }
            }

            {population_line}

            label { "År" }
            input {
                r#type: "number",
                min: "{BASE_YEAR}",
                max: "2100",
                value: "{chosen_year}",
                oninput: move |evt: Event<FormData>| {
                    if let Ok(parsed) = evt.value().parse::<i32>() {
                        year.set(parsed);
                    }
                },
            }

            button {
                disabled: current.is_empty(),
                onclick: move |_| {
                    let area = selected_area.read().clone();
                    if area.is_empty() {
                        return;
                    }
                    let target_year = *year.read();
                    spawn(async move {
                        result.set(Some(api::predict(&area, target_year).await));
                    });
                },
                "Beregn"
            }

            {result_view}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(nummer: &str, name: Option<&str>, municipality: Option<&str>) -> PopulationAreaData {
        PopulationAreaData {
            grunnkretsnummer: nummer.to_string(),
            name: name.map(str::to_string),
            municipality: municipality.map(str::to_string),
            population: 100,
            geometry: None,
        }
    }

    #[test]
    fn test_area_label_full() {
        let label = area_label(&area("42010101", Some("Kvadraturen"), Some("Kristiansand")));
        assert_eq!(label, "Kvadraturen (Kristiansand)");
    }

    #[test]
    fn test_area_label_falls_back_to_number() {
        let label = area_label(&area("42010101", None, None));
        assert_eq!(label, "42010101");
    }
}
