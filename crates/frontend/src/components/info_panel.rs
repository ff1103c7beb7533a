use dioxus::prelude::*;

/// Status text channel for the map: toggle results, layer hints, and
/// "nothing found" messages all land here instead of raising errors.
#[component]
pub fn InfoPanel(message: String) -> Element {
    rsx! {
        div { class: "panel info-panel", id: "position-info",
            p { "{message}" }
        }
    }
}
