use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use geo::{Contains, MultiPolygon, Point};
use sheltermap_shared::engine::RenderedRing;
use sheltermap_shared::styles;

use crate::coords;

const MAP_CONTAINER_ID: &str = "shelter-map-container";

/// Drag threshold in pixels — movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

const ZOOM_MIN: f64 = 1.0;
const ZOOM_MAX: f64 = 10.0;
const ZOOM_STEP: f64 = 1.1;

/// Distance threshold (in native view pixels, before zoom) for marker hits.
const MARKER_HIT_THRESHOLD: f64 = 18.0;

const SHELTER_COLOR: &str = "#1565C0";
const BUNKER_COLOR: &str = "#4527A0";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerKind {
    Shelter,
    Bunker,
}

/// Norwegian shelter-type label used in info messages.
pub fn marker_type_label(kind: MarkerKind) -> &'static str {
    match kind {
        MarkerKind::Shelter => "alternativt tilfluktsrom",
        MarkerKind::Bunker => "offentlig tilfluktsrom",
    }
}

/// One clickable marker on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPoint {
    pub kind: MarkerKind,
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    /// Whether this marker currently has isochrones toggled on.
    pub active: bool,
}

/// One population grid cell of the choropleth layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationCell {
    pub grunnkretsnummer: String,
    pub population: i64,
    pub geometry: MultiPolygon<f64>,
    pub fill: &'static str,
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

/// Get the bounding client rect of the map container element.
fn container_rect() -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    Some(element.get_bounding_client_rect())
}

// ---------------------------------------------------------------------------
// Zoom / pan math (pure functions, easily testable)
// ---------------------------------------------------------------------------

/// Compute new pan offsets so that `cursor` stays over the same content point
/// when zooming from `old_zoom` to `new_zoom`.
fn zoom_pan_at_cursor(
    cursor_x: f64,
    cursor_y: f64,
    old_zoom: f64,
    new_zoom: f64,
    old_pan_x: f64,
    old_pan_y: f64,
) -> (f64, f64) {
    let content_x = (cursor_x - old_pan_x) / old_zoom;
    let content_y = (cursor_y - old_pan_y) / old_zoom;
    (
        cursor_x - content_x * new_zoom,
        cursor_y - content_y * new_zoom,
    )
}

/// Clamp pan values so the view can't be dragged off-screen. The view
/// renders at `width: 100%` of the container, so its actual rendered height
/// is `container_w * (VIEW_HEIGHT_PX / VIEW_WIDTH_PX)`.
fn clamp_pan(pan_x: f64, pan_y: f64, zoom: f64, container_w: f64, container_h: f64) -> (f64, f64) {
    let content_w = container_w * zoom;
    let content_h = container_w * (coords::VIEW_HEIGHT_PX / coords::VIEW_WIDTH_PX) * zoom;
    let min_pan_x = -(content_w - container_w).max(0.0);
    let min_pan_y = -(content_h - container_h).max(0.0);
    (pan_x.clamp(min_pan_x, 0.0), pan_y.clamp(min_pan_y, 0.0))
}

/// Apply `clamp_pan` using the live container dimensions.
fn clamp_pan_to_container(pan_x: f64, pan_y: f64, zoom: f64) -> (f64, f64) {
    match container_rect() {
        Some(rect) => clamp_pan(pan_x, pan_y, zoom, rect.width(), rect.height()),
        None => (pan_x, pan_y),
    }
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

// ---------------------------------------------------------------------------
// Hit testing
// ---------------------------------------------------------------------------

/// Find the index of the nearest position within `threshold` (Euclidean distance).
fn find_nearest(positions: &[(f64, f64)], click: (f64, f64), threshold: f64) -> Option<usize> {
    let mut best_idx = None;
    let mut best_dist = threshold;
    for (i, pos) in positions.iter().enumerate() {
        let dx = pos.0 - click.0;
        let dy = pos.1 - click.1;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < best_dist {
            best_dist = dist;
            best_idx = Some(i);
        }
    }
    best_idx
}

/// Find the population cell containing a WGS84 position.
fn cell_at<'a>(cells: &'a [PopulationCell], lat: f64, lng: f64) -> Option<&'a PopulationCell> {
    let point = Point::new(lng, lat);
    cells.iter().find(|cell| cell.geometry.contains(&point))
}

// ---------------------------------------------------------------------------
// SVG builder
// ---------------------------------------------------------------------------

/// Reference container width (desktop map panel) used to normalize marker sizes.
const REFERENCE_WIDTH: f64 = 960.0;

/// Subpaths ("M … Z") for every ring of every polygon, in view pixels.
fn path_d(geometry: &MultiPolygon<f64>) -> String {
    let mut d = String::new();
    for polygon in &geometry.0 {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            for (i, coord) in ring.0.iter().enumerate() {
                let (x, y) = coords::latlng_to_view_px(coord.y, coord.x);
                if i == 0 {
                    d.push_str(&format!("M{:.2} {:.2}", x, y));
                } else {
                    d.push_str(&format!(" L{:.2} {:.2}", x, y));
                }
            }
            d.push_str(" Z");
        }
    }
    d
}

fn build_population_cells(svg: &mut String, cells: &[PopulationCell], s: f64) {
    let sw = 1.0 * s;
    for cell in cells {
        let d = path_d(&cell.geometry);
        if d.is_empty() {
            continue;
        }
        let fill = cell.fill;
        let population = cell.population;
        svg.push_str(&format!(
            r##"<path d="{d}" fill-rule="evenodd" fill="{fill}" fill-opacity="0.5" stroke="#666" stroke-width="{sw}" stroke-opacity="0.7"><title>Befolkning: {population} personer</title></path>"##
        ));
    }
}

fn build_isochrone_rings(svg: &mut String, rings: &[RenderedRing], s: f64) {
    for ring in rings {
        let style = styles::ring_style(ring.band);
        let d = path_d(&ring.geometry);
        if d.is_empty() {
            continue;
        }
        let color = style.color;
        let sw = style.weight * s;
        let so = style.opacity;
        let fo = style.fill_opacity;
        let band = ring.band;
        svg.push_str(&format!(
            r##"<path d="{d}" fill-rule="evenodd" fill="{color}" fill-opacity="{fo}" stroke="{color}" stroke-width="{sw}" stroke-opacity="{so}"><title>{band} minutter gåavstand</title></path>"##
        ));
    }
}

fn build_markers(svg: &mut String, markers: &[MarkerPoint], s: f64) {
    for marker in markers {
        let (x, y) = coords::latlng_to_view_px(marker.lat, marker.lng);
        let (color, r) = match marker.kind {
            MarkerKind::Shelter => (SHELTER_COLOR, 8.0 * s),
            MarkerKind::Bunker => (BUNKER_COLOR, 9.0 * s),
        };
        let sw = 2.5 * s;
        let title = &marker.title;
        svg.push_str(&format!(r##"<g role="img"><title>{title}</title>"##));
        svg.push_str(&format!(
            r##"<circle cx="{x:.2}" cy="{y:.2}" r="{r}" fill="{color}" stroke="white" stroke-width="{sw}"/>"##
        ));
        if marker.active {
            build_active_ring(svg, x, y, s);
        }
        svg.push_str("</g>");
    }
}

/// Emit an animated dashed ring around a marker with isochrones toggled on.
fn build_active_ring(svg: &mut String, cx: f64, cy: f64, s: f64) {
    let r = 16.0 * s;
    let sw = 2.5 * s;
    let da1 = 6.0 * s;
    let da2 = 4.0 * s;
    svg.push_str(&format!(
        r##"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r}" fill="none" stroke="white" stroke-width="{sw}" stroke-dasharray="{da1} {da2}" opacity="0.9"><animate attributeName="opacity" values="0.5;1;0.5" dur="1.2s" repeatCount="indefinite"/></circle>"##
    ));
}

/// Build the full SVG content as a string for reliable rendering.
/// Geometry is projected into native view pixel space (1024×768).
fn build_svg_content(
    markers: &[MarkerPoint],
    rings: &[RenderedRing],
    population: &[PopulationCell],
    zoom: f64,
    container_width: f64,
) -> String {
    let mut svg = String::with_capacity(8192);

    // Scale factor keeps markers and strokes a consistent size on screen
    // regardless of container width and zoom.
    let mobile_boost = (REFERENCE_WIDTH / container_width).max(1.0);
    let s = mobile_boost / zoom.min(5.0);

    build_population_cells(&mut svg, population, s);
    build_isochrone_rings(&mut svg, rings, s);
    build_markers(&mut svg, markers, s);

    svg
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn MapView(
    markers: Vec<MarkerPoint>,
    rings: Vec<RenderedRing>,
    population: Vec<PopulationCell>,
    on_marker_click: EventHandler<(MarkerKind, f64, f64)>,
    on_area_click: EventHandler<String>,
) -> Element {
    // Zoom / pan state
    let mut zoom = use_signal(|| 1.0_f64);
    let mut pan_x = use_signal(|| 0.0_f64);
    let mut pan_y = use_signal(|| 0.0_f64);

    // Drag state (mouse)
    let mut is_dragging = use_signal(|| false);
    let mut did_drag = use_signal(|| false);
    let mut drag_start_x = use_signal(|| 0.0_f64);
    let mut drag_start_y = use_signal(|| 0.0_f64);
    let mut drag_start_pan_x = use_signal(|| 0.0_f64);
    let mut drag_start_pan_y = use_signal(|| 0.0_f64);

    let cur_zoom = *zoom.read();
    let cur_pan_x = *pan_x.read();
    let cur_pan_y = *pan_y.read();
    let dragging = *is_dragging.read();

    let container_width = container_rect()
        .map(|r| r.width())
        .unwrap_or(REFERENCE_WIDTH);
    let svg_content = build_svg_content(&markers, &rings, &population, cur_zoom, container_width);
    let svg_html = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" preserveAspectRatio="none" style="position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;z-index:5;">{}</svg>"#,
        coords::VIEW_WIDTH_PX,
        coords::VIEW_HEIGHT_PX,
        svg_content
    );

    let transform_style = format!(
        "transform: translate({cur_pan_x}px, {cur_pan_y}px) scale({cur_zoom}); transform-origin: 0 0;"
    );
    let container_class = if dragging {
        "map-container dragging"
    } else {
        "map-container"
    };

    // Snapshots for the click handler
    let markers_for_click = markers.clone();
    let population_for_click = population.clone();

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();

                let delta_y = wheel_delta_y(evt.data().delta());
                let factor = if delta_y < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
                let old_z = *zoom.read();
                let new_z = (old_z * factor).clamp(ZOOM_MIN, ZOOM_MAX);
                if (new_z - old_z).abs() < 1e-9 {
                    return;
                }

                let Some(rect) = container_rect() else { return };
                let client = evt.data().client_coordinates();
                let cx = client.x - rect.left();
                let cy = client.y - rect.top();

                let (new_px, new_py) =
                    zoom_pan_at_cursor(cx, cy, old_z, new_z, *pan_x.read(), *pan_y.read());
                let (px, py) = clamp_pan(new_px, new_py, new_z, rect.width(), rect.height());

                zoom.set(new_z);
                pan_x.set(px);
                pan_y.set(py);
            },

            onmousedown: move |evt: Event<MouseData>| {
                // Only track drag/click for left mouse button
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                is_dragging.set(true);
                did_drag.set(false);
                drag_start_x.set(client.x);
                drag_start_y.set(client.y);
                drag_start_pan_x.set(*pan_x.read());
                drag_start_pan_y.set(*pan_y.read());
            },

            onmousemove: move |evt: Event<MouseData>| {
                if !*is_dragging.read() {
                    return;
                }
                let client = evt.client_coordinates();
                let dx = client.x - *drag_start_x.read();
                let dy = client.y - *drag_start_y.read();

                if !*did_drag.read() && (dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD) {
                    did_drag.set(true);
                }
                if *did_drag.read() {
                    let new_px = *drag_start_pan_x.read() + dx;
                    let new_py = *drag_start_pan_y.read() + dy;
                    let (px, py) = clamp_pan_to_container(new_px, new_py, *zoom.read());
                    pan_x.set(px);
                    pan_y.set(py);
                }
            },

            onmouseup: move |evt: Event<MouseData>| {
                let was_dragging = *is_dragging.read();
                let was_drag = *did_drag.read();
                is_dragging.set(false);

                // A mouseup without drag movement = a click
                if !(was_dragging && !was_drag) {
                    return;
                }
                let client = evt.client_coordinates();
                let Some((view_x, view_y)) = coords::click_to_view_px_zoomed(
                    client.x, client.y, MAP_CONTAINER_ID,
                    *zoom.read(), *pan_x.read(), *pan_y.read(),
                ) else {
                    return;
                };

                // Markers take priority over the choropleth underneath
                let positions: Vec<(f64, f64)> = markers_for_click
                    .iter()
                    .map(|m| coords::latlng_to_view_px(m.lat, m.lng))
                    .collect();
                let threshold = MARKER_HIT_THRESHOLD / (*zoom.read()).min(5.0);
                if let Some(idx) = find_nearest(&positions, (view_x, view_y), threshold) {
                    let marker = &markers_for_click[idx];
                    on_marker_click.call((marker.kind, marker.lat, marker.lng));
                    return;
                }

                let (lat, lng) = coords::view_px_to_latlng(view_x, view_y);
                if let Some(cell) = cell_at(&population_for_click, lat, lng) {
                    on_area_click.call(cell.grunnkretsnummer.clone());
                }
            },

            onmouseleave: move |_| {
                is_dragging.set(false);
            },

            ondoubleclick: move |evt: Event<MouseData>| {
                evt.prevent_default();
                zoom.set(1.0);
                pan_x.set(0.0);
                pan_y.set(0.0);
            },

            // Inner wrapper — CSS transform applies zoom/pan to map + overlay together
            div {
                class: "map-inner",
                style: "{transform_style}",

                img { src: "/static/images/agder-base.webp", draggable: "false" }

                div {
                    dangerous_inner_html: "{svg_html}",
                    style: "position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;",
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheltermap_shared::geometry;
    use serde_json::json;

    fn square(lat: f64, lng: f64, half: f64) -> MultiPolygon<f64> {
        geometry::parse_geometry(&json!({
            "type": "Polygon",
            "coordinates": [[
                [lng - half, lat - half],
                [lng + half, lat - half],
                [lng + half, lat + half],
                [lng - half, lat + half],
                [lng - half, lat - half],
            ]]
        }))
        .unwrap()
    }

    // --- path building ---

    #[test]
    fn test_path_d_closes_each_ring() {
        let d = path_d(&square(58.16, 8.0, 0.01));
        assert!(d.starts_with('M'));
        assert_eq!(d.matches('Z').count(), 1);
        assert_eq!(d.matches('M').count(), 1);
    }

    #[test]
    fn test_path_d_multiple_polygons() {
        let mut geometry = square(58.16, 8.0, 0.01);
        geometry.0.extend(square(58.2, 8.1, 0.01).0);
        let d = path_d(&geometry);
        assert_eq!(d.matches('Z').count(), 2);
    }

    #[test]
    fn test_path_d_empty_geometry() {
        assert!(path_d(&MultiPolygon::<f64>(vec![])).is_empty());
    }

    // --- svg builders ---

    #[test]
    fn test_isochrone_ring_uses_band_color() {
        let rings = vec![RenderedRing {
            band: 5,
            geometry: square(58.16, 8.0, 0.01),
        }];
        let mut svg = String::new();
        build_isochrone_rings(&mut svg, &rings, 1.0);
        assert!(svg.contains("#2E7D32"));
        assert!(svg.contains("5 minutter"));
        assert!(svg.contains("fill-rule=\"evenodd\""));
    }

    #[test]
    fn test_population_cell_svg() {
        let cells = vec![PopulationCell {
            grunnkretsnummer: "42010101".to_string(),
            population: 1532,
            geometry: square(58.16, 8.0, 0.01),
            fill: "#FC4E2A",
        }];
        let mut svg = String::new();
        build_population_cells(&mut svg, &cells, 1.0);
        assert!(svg.contains("#FC4E2A"));
        assert!(svg.contains("Befolkning: 1532 personer"));
    }

    #[test]
    fn test_marker_svg_active_ring() {
        let marker = MarkerPoint {
            kind: MarkerKind::Shelter,
            lat: 58.16,
            lng: 8.0,
            title: "Alternativt tilfluktsrom".to_string(),
            active: true,
        };
        let mut svg = String::new();
        build_markers(&mut svg, std::slice::from_ref(&marker), 1.0);
        assert!(svg.contains(SHELTER_COLOR));
        assert!(svg.contains("stroke-dasharray"));

        let inactive = MarkerPoint {
            active: false,
            ..marker
        };
        let mut svg = String::new();
        build_markers(&mut svg, &[inactive], 1.0);
        assert!(!svg.contains("stroke-dasharray"));
    }

    // --- hit testing ---

    #[test]
    fn test_find_nearest_within_threshold() {
        let positions = vec![(100.0, 100.0), (200.0, 200.0)];
        assert_eq!(find_nearest(&positions, (101.0, 101.0), 30.0), Some(0));
        assert_eq!(find_nearest(&positions, (199.0, 199.0), 30.0), Some(1));
    }

    #[test]
    fn test_find_nearest_outside_threshold() {
        let positions = vec![(100.0, 100.0)];
        assert_eq!(find_nearest(&positions, (200.0, 200.0), 30.0), None);
    }

    #[test]
    fn test_cell_at_contains() {
        let cells = vec![PopulationCell {
            grunnkretsnummer: "1".to_string(),
            population: 10,
            geometry: square(58.16, 8.0, 0.01),
            fill: "#FFEDA0",
        }];
        assert!(cell_at(&cells, 58.16, 8.0).is_some());
        assert!(cell_at(&cells, 58.3, 8.0).is_none());
    }

    // --- zoom / pan math ---

    #[test]
    fn test_zoom_pan_keeps_cursor_point_fixed() {
        // Content point under the cursor before and after zoom must match
        let (cursor_x, cursor_y) = (300.0, 200.0);
        let (old_zoom, new_zoom) = (1.0, 2.0);
        let (old_pan_x, old_pan_y) = (-50.0, -20.0);
        let (new_pan_x, new_pan_y) =
            zoom_pan_at_cursor(cursor_x, cursor_y, old_zoom, new_zoom, old_pan_x, old_pan_y);

        let content_before = ((cursor_x - old_pan_x) / old_zoom, (cursor_y - old_pan_y) / old_zoom);
        let content_after = ((cursor_x - new_pan_x) / new_zoom, (cursor_y - new_pan_y) / new_zoom);
        assert!((content_before.0 - content_after.0).abs() < 1e-9);
        assert!((content_before.1 - content_after.1).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_pan_prevents_positive_pan() {
        let (px, py) = clamp_pan(50.0, 50.0, 1.0, 800.0, 600.0);
        assert!((px - 0.0).abs() < 0.01);
        assert!((py - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_clamp_pan_limits_at_zoomed_extent() {
        // At zoom 2 an 800px container has 800px of horizontal slack
        let (px, _) = clamp_pan(-2000.0, 0.0, 2.0, 800.0, 600.0);
        assert!((px - (-800.0)).abs() < 0.01);
    }

    // --- labels ---

    #[test]
    fn test_marker_type_labels() {
        assert_eq!(marker_type_label(MarkerKind::Shelter), "alternativt tilfluktsrom");
        assert_eq!(marker_type_label(MarkerKind::Bunker), "offentlig tilfluktsrom");
    }
}
