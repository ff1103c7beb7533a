//! Fixed geographic viewport over the Agder region and the conversions
//! between WGS84 positions, native view pixels, and zoomed/panned clicks.
//!
//! The view is an equirectangular window: good enough at city scale, and
//! it keeps every overlay conversion a pair of linear maps.

/// Viewport bounds. Centered on the original map's default view
/// (58.1636 N, 8.0033 E); the latitude span is chosen so a degree of
/// longitude and a degree of latitude keep their true meter ratio at this
/// latitude, which makes the view pixel roughly square on the ground.
pub const LNG_MIN: f64 = 7.5;
pub const LNG_MAX: f64 = 8.5;
pub const LAT_MIN: f64 = 57.96;
pub const LAT_MAX: f64 = 58.36;

/// Native view size in pixels; the SVG overlay renders in this space.
pub const VIEW_WIDTH_PX: f64 = 1024.0;
pub const VIEW_HEIGHT_PX: f64 = 768.0;

/// Project a WGS84 position into native view pixels. North is up, so the
/// y axis flips.
pub fn latlng_to_view_px(lat: f64, lng: f64) -> (f64, f64) {
    let x = (lng - LNG_MIN) / (LNG_MAX - LNG_MIN) * VIEW_WIDTH_PX;
    let y = (LAT_MAX - lat) / (LAT_MAX - LAT_MIN) * VIEW_HEIGHT_PX;
    (x, y)
}

/// Inverse of [`latlng_to_view_px`].
pub fn view_px_to_latlng(x: f64, y: f64) -> (f64, f64) {
    let lng = LNG_MIN + x / VIEW_WIDTH_PX * (LNG_MAX - LNG_MIN);
    let lat = LAT_MAX - y / VIEW_HEIGHT_PX * (LAT_MAX - LAT_MIN);
    (lat, lng)
}

/// Pure function: convert container-relative coordinates to native view
/// pixels, undoing the zoom/pan CSS transform. Usable in unit tests (no
/// web_sys dependency).
///
/// Only `container_w` is needed because the view renders with
/// `width:100%; height:auto`, so both axes share the same scale factor
/// (`VIEW_WIDTH_PX / container_w`).
pub fn client_to_view_px_zoomed(
    container_x: f64,
    container_y: f64,
    container_w: f64,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Option<(f64, f64)> {
    if container_w <= 0.0 || zoom <= 0.0 {
        return None;
    }

    // Undo CSS transform: translate(pan_x, pan_y) scale(zoom)
    let rendered_x = (container_x - pan_x) / zoom;
    let rendered_y = (container_y - pan_y) / zoom;

    let scale = VIEW_WIDTH_PX / container_w;
    let view_x = (rendered_x * scale).clamp(0.0, VIEW_WIDTH_PX);
    let view_y = (rendered_y * scale).clamp(0.0, VIEW_HEIGHT_PX);

    Some((view_x, view_y))
}

/// Get container-relative click coordinates using web_sys, then convert
/// from rendered pixel space to native view pixels.
pub fn click_to_view_px_zoomed(
    client_x: f64,
    client_y: f64,
    container_id: &str,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Option<(f64, f64)> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(container_id)?;
    let rect = element.get_bounding_client_rect();

    let container_x = client_x - rect.left();
    let container_y = client_y - rect.top();

    client_to_view_px_zoomed(container_x, container_y, rect.width(), zoom, pan_x, pan_y)
}
