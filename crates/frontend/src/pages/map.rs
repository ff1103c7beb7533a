use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use sheltermap_shared::engine::{IsochroneEngine, ToggleOutcome};
use sheltermap_shared::geometry::{self, PolygonFeature};
use sheltermap_shared::styles;

use crate::api::{self, BunkerData, PopulationAreaData, ShelterData};
use crate::components::info_panel::InfoPanel;
use crate::components::layer_controls::LayerControls;
use crate::components::map_view::{
    marker_type_label, MapView, MarkerKind, MarkerPoint, PopulationCell,
};
use crate::components::prediction_panel::PredictionPanel;

const DEFAULT_STATUS: &str = "Klikk på et tilfluktsrom for å se gåavstander.";

/// Milliseconds before a status message falls back to the default hint.
const STATUS_TIMEOUT_MS: u32 = 8_000;

/// Show a status message, reverting to the default hint after a while
/// unless a newer message took over in the meantime.
fn set_status(mut message: Signal<String>, mut epoch: Signal<u64>, text: String) {
    message.set(text);
    let current = *epoch.read() + 1;
    epoch.set(current);
    spawn(async move {
        TimeoutFuture::new(STATUS_TIMEOUT_MS).await;
        if *epoch.read() == current {
            message.set(DEFAULT_STATUS.to_string());
        }
    });
}

#[component]
pub fn MapPage() -> Element {
    // Data resources
    let shelters_resource = use_resource(|| api::fetch_shelters());
    let bunkers_resource = use_resource(|| api::fetch_bunkers());
    let isochrones_resource = use_resource(|| api::fetch_isochrones());
    let population_resource = use_resource(|| api::fetch_population_areas());

    // The ring engine lives with this view and dies with it
    let mut engine = use_signal(IsochroneEngine::new);
    let info_message = use_signal(|| DEFAULT_STATUS.to_string());
    let message_epoch = use_signal(|| 0u64);
    let selected_area = use_signal(String::new);

    let show_shelters = use_signal(|| true);
    let show_bunkers = use_signal(|| true);
    let mut show_isochrones = use_signal(|| false);
    let show_population = use_signal(|| true);

    // Normalized isochrone features for marker toggles
    let features = use_memo(move || match &*isochrones_resource.read() {
        Some(Ok(rows)) => rows
            .iter()
            .filter_map(geometry::adapt_record)
            .collect::<Vec<PolygonFeature>>(),
        _ => Vec::new(),
    });

    // Choropleth cells from the population areas
    let population_cells = use_memo(move || match &*population_resource.read() {
        Some(Ok(areas)) => areas
            .iter()
            .filter_map(|area| {
                let geometry = geometry::parse_geometry(area.geometry.as_ref()?)?;
                Some(PopulationCell {
                    grunnkretsnummer: area.grunnkretsnummer.clone(),
                    population: area.population,
                    fill: styles::population_color(area.population),
                    geometry,
                })
            })
            .collect::<Vec<PopulationCell>>(),
        _ => Vec::new(),
    });

    let rings = use_memo(move || engine.read().rendered_rings());

    let shelters: Vec<ShelterData> = match &*shelters_resource.read() {
        Some(Ok(s)) => s.clone(),
        _ => vec![],
    };
    let bunkers: Vec<BunkerData> = match &*bunkers_resource.read() {
        Some(Ok(b)) => b.clone(),
        _ => vec![],
    };
    let population_areas: Vec<PopulationAreaData> = match &*population_resource.read() {
        Some(Ok(p)) => p.clone(),
        _ => vec![],
    };

    // Marker view models, active state read from the engine
    let mut markers: Vec<MarkerPoint> = Vec::new();
    {
        let engine_state = engine.read();
        if *show_shelters.read() {
            for shelter in &shelters {
                markers.push(MarkerPoint {
                    kind: MarkerKind::Shelter,
                    lat: shelter.lat,
                    lng: shelter.lng,
                    title: "Alternativt tilfluktsrom".to_string(),
                    active: engine_state.is_marker_active(shelter.lat, shelter.lng),
                });
            }
        }
        if *show_bunkers.read() {
            for bunker in &bunkers {
                let title = match (&bunker.address, bunker.capacity) {
                    (Some(address), Some(capacity)) => {
                        format!("Offentlig tilfluktsrom – {} ({} plasser)", address, capacity)
                    }
                    (Some(address), None) => format!("Offentlig tilfluktsrom – {}", address),
                    _ => "Offentlig tilfluktsrom".to_string(),
                };
                markers.push(MarkerPoint {
                    kind: MarkerKind::Bunker,
                    lat: bunker.lat,
                    lng: bunker.lng,
                    title,
                    active: engine_state.is_marker_active(bunker.lat, bunker.lng),
                });
            }
        }
    }

    let rings_prop = if *show_isochrones.read() {
        rings.read().clone()
    } else {
        vec![]
    };
    let cells_prop = if *show_population.read() {
        population_cells.read().clone()
    } else {
        vec![]
    };

    let areas_for_click = population_areas.clone();

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "Tilfluktsrom og befolkning i Agder" }
            }

            div { class: "sidebar",
                LayerControls {
                    show_shelters: show_shelters,
                    show_bunkers: show_bunkers,
                    show_isochrones: show_isochrones,
                    show_population: show_population,
                    on_isochrones_enabled: move |_| {
                        set_status(
                            info_message,
                            message_epoch,
                            "Isokroner aktivert – klikk på tilfluktsrom for å se gåavstander!"
                                .to_string(),
                        );
                    },
                    on_isochrones_cleared: move |_| {
                        engine.write().hide_all();
                        set_status(info_message, message_epoch, "Alle isokroner fjernet".to_string());
                    },
                    on_show_all: move |_| {
                        let records = match &*isochrones_resource.read() {
                            Some(Ok(rows)) => rows.clone(),
                            _ => vec![],
                        };
                        engine.write().show_all(&records);
                        let band_count = engine.read().bands().count();
                        show_isochrones.set(true);
                        set_status(
                            info_message,
                            message_epoch,
                            format!("Viser alle isokroner ({} tidssoner)", band_count),
                        );
                    },
                    on_clear: move |_| {
                        engine.write().hide_all();
                        set_status(info_message, message_epoch, "Alle isokroner fjernet".to_string());
                    },
                }

                InfoPanel { message: info_message.read().clone() }

                PredictionPanel {
                    areas: population_areas.clone(),
                    selected_area: selected_area,
                }
            }

            MapView {
                markers: markers,
                rings: rings_prop,
                population: cells_prop,
                on_marker_click: move |(kind, lat, lng): (MarkerKind, f64, f64)| {
                    let label = marker_type_label(kind);
                    let outcome = {
                        let features = features.read();
                        engine.write().toggle_marker(lat, lng, &features)
                    };
                    let text = match outcome {
                        ToggleOutcome::Activated { bands, .. } => {
                            format!("Isokroner vist for {} ({} tidssoner)", label, bands.len())
                        }
                        ToggleOutcome::Deactivated { .. } => {
                            format!("Isokroner skjult for {}", label)
                        }
                        ToggleOutcome::NothingFound { .. } => {
                            format!("Ingen isokroner funnet for denne {}", label)
                        }
                    };
                    set_status(info_message, message_epoch, text);
                },
                on_area_click: move |grunnkretsnummer: String| {
                    let mut selected_area = selected_area;
                    if let Some(area) = areas_for_click
                        .iter()
                        .find(|a| a.grunnkretsnummer == grunnkretsnummer)
                    {
                        set_status(
                            info_message,
                            message_epoch,
                            format!("Befolkning: {} personer", area.population),
                        );
                    }
                    selected_area.set(grunnkretsnummer);
                },
            }
        }
    }
}
