use dioxus::prelude::*;
use sheltermap_shared::styles;

/// Layer checkboxes and the isochrone bulk buttons.
///
/// Hiding the shelter, bunker, or isochrone layer also clears any active
/// isochrones — rings without their source markers are just confusing.
#[component]
pub fn LayerControls(
    show_shelters: Signal<bool>,
    show_bunkers: Signal<bool>,
    show_isochrones: Signal<bool>,
    show_population: Signal<bool>,
    on_isochrones_enabled: EventHandler<()>,
    on_isochrones_cleared: EventHandler<()>,
    on_show_all: EventHandler<()>,
    on_clear: EventHandler<()>,
) -> Element {
    let legend = styles::population_legend();
    let population_visible = *show_population.read();

    rsx! {
        div { class: "panel",
            h3 { "Kartlag" }

            label { class: "layer-toggle",
                input {
                    r#type: "checkbox",
                    checked: "{show_shelters}",
                    onchange: move |evt: Event<FormData>| {
                        let checked = evt.checked();
                        show_shelters.set(checked);
                        if !checked {
                            on_isochrones_cleared.call(());
                        }
                    },
                }
                "Alternative tilfluktsrom"
            }

            label { class: "layer-toggle",
                input {
                    r#type: "checkbox",
                    checked: "{show_bunkers}",
                    onchange: move |evt: Event<FormData>| {
                        let checked = evt.checked();
                        show_bunkers.set(checked);
                        if !checked {
                            on_isochrones_cleared.call(());
                        }
                    },
                }
                "Offentlige tilfluktsrom"
            }

            label { class: "layer-toggle",
                input {
                    r#type: "checkbox",
                    checked: "{show_isochrones}",
                    onchange: move |evt: Event<FormData>| {
                        let checked = evt.checked();
                        show_isochrones.set(checked);
                        if checked {
                            on_isochrones_enabled.call(());
                        } else {
                            on_isochrones_cleared.call(());
                        }
                    },
                }
                "Isokroner (gåavstand)"
            }

            label { class: "layer-toggle",
                input {
                    r#type: "checkbox",
                    checked: "{show_population}",
                    onchange: move |evt: Event<FormData>| {
                        show_population.set(evt.checked());
                    },
                }
                "Befolkning"
            }

            div { class: "layer-buttons",
                button {
                    onclick: move |_| on_show_all.call(()),
                    "Vis alle isokroner"
                }
                button {
                    id: "clear-isochrones-button",
                    onclick: move |_| on_clear.call(()),
                    "Fjern isokroner"
                }
            }

            if population_visible {
                div { class: "legend",
                    h4 { "Befolkning" }
                    for (color, range) in legend {
                        div { class: "legend-row",
                            span {
                                class: "legend-swatch",
                                style: "background-color: {color};",
                            }
                            span { "{range}" }
                        }
                    }
                }
            }
        }
    }
}
