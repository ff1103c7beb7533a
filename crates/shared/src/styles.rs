//! Style tables for the map overlay: one stroke/fill descriptor per
//! walking-time band, and the population choropleth ramp.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingStyle {
    /// Stroke and fill color (hex).
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

const RING_5_MIN: RingStyle = RingStyle {
    color: "#2E7D32",
    weight: 2.0,
    opacity: 0.7,
    fill_opacity: 0.3,
};

const RING_10_MIN: RingStyle = RingStyle {
    color: "#FFEB3B",
    weight: 2.0,
    opacity: 0.7,
    fill_opacity: 0.3,
};

const RING_15_MIN: RingStyle = RingStyle {
    color: "#F44336",
    weight: 2.0,
    opacity: 0.7,
    fill_opacity: 0.3,
};

/// Style for a band's rendered ring. Bands outside the canonical 5/10/15
/// set take the 15-minute style.
pub fn ring_style(band: u32) -> RingStyle {
    match band {
        5 => RING_5_MIN,
        10 => RING_10_MIN,
        _ => RING_15_MIN,
    }
}

/// Choropleth fill color for a population count.
pub fn population_color(population: i64) -> &'static str {
    if population > 2000 {
        "#BD0026"
    } else if population > 1000 {
        "#FC4E2A"
    } else if population > 500 {
        "#FD8D3C"
    } else if population > 100 {
        "#FEB24C"
    } else {
        "#FFEDA0"
    }
}

/// Legend entries for the population ramp, densest first.
pub fn population_legend() -> [(&'static str, &'static str); 5] {
    [
        ("#BD0026", "2000+"),
        ("#FC4E2A", "1000-2000"),
        ("#FD8D3C", "500-1000"),
        ("#FEB24C", "100-500"),
        ("#FFEDA0", "0-100"),
    ]
}
