use serde::{Deserialize, Deserializer, Serialize};

use crate::utm;

/// Shelter record (alternative shelters from the OSM extract).
/// Geometry is a WGS84 GeoJSON point in `geom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelterRecord {
    pub geom: Option<geojson::Geometry>,
}

impl ShelterRecord {
    /// Marker position as `(lat, lng)`, if the record carries a point.
    pub fn position(&self) -> Option<(f64, f64)> {
        point_coords(self.geom.as_ref()?).map(|(lng, lat)| (lat, lng))
    }
}

/// Public bunker record. Positions arrive as UTM zone 32N
/// easting/northing, not WGS84.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BunkerRecord {
    pub geom: Option<geojson::Geometry>,
    pub adresse: Option<String>,
    #[serde(default, deserialize_with = "de_opt_count")]
    pub plasser: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_label")]
    pub romnr: Option<String>,
}

impl BunkerRecord {
    /// Marker position as `(lat, lng)`, converted from UTM zone 32N.
    pub fn position(&self) -> Option<(f64, f64)> {
        let (easting, northing) = point_coords(self.geom.as_ref()?)?;
        Some(utm::utm32_to_wgs84(easting, northing))
    }
}

/// Population grid cell ("grunnkrets") with its resident count.
///
/// Upstream rows are inconsistent: the count may arrive under
/// `totalBefolkning` or `poptot`, as a number or a numeric string, and the
/// geometry may sit in `geom` or `område`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationArea {
    #[serde(default, deserialize_with = "de_label")]
    pub grunnkretsnummer: String,
    #[serde(default)]
    pub grunnkretsnavn: Option<String>,
    #[serde(default)]
    pub kommunenavn: Option<String>,
    #[serde(rename = "totalBefolkning", alias = "poptot", default, deserialize_with = "de_count")]
    pub population: i64,
    #[serde(default, alias = "område")]
    pub geom: Option<geojson::Geometry>,
}

/// Extract `(x, y)` from a GeoJSON point geometry.
fn point_coords(geometry: &geojson::Geometry) -> Option<(f64, f64)> {
    match &geometry.value {
        geojson::Value::Point(coords) if coords.len() >= 2 => Some((coords[0], coords[1])),
        _ => None,
    }
}

// Upstream fields that should be numbers sometimes arrive as strings.
// Mirror the lenient parsing the data was collected with: non-numeric
// counts become 0, labels keep their text form.

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexValue {
    Int(i64),
    Float(f64),
    Text(String),
}

fn count_from(value: FlexValue) -> i64 {
    match value {
        FlexValue::Int(n) => n,
        FlexValue::Float(x) => x as i64,
        FlexValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|x| x as i64))
                .unwrap_or(0)
        }
    }
}

fn label_from(value: FlexValue) -> String {
    match value {
        FlexValue::Int(n) => n.to_string(),
        FlexValue::Float(x) => x.to_string(),
        FlexValue::Text(s) => s,
    }
}

fn de_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(Option::<FlexValue>::deserialize(deserializer)?
        .map(count_from)
        .unwrap_or(0))
}

fn de_opt_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<FlexValue>::deserialize(deserializer)?.map(count_from))
}

fn de_label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(label_from(FlexValue::deserialize(deserializer)?))
}

fn de_opt_label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<FlexValue>::deserialize(deserializer)?.map(label_from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shelter_position_from_point() {
        let json = r#"{"geom":{"type":"Point","coordinates":[8.0033,58.1636]}}"#;
        let shelter: ShelterRecord = serde_json::from_str(json).unwrap();
        let (lat, lng) = shelter.position().unwrap();
        assert!((lat - 58.1636).abs() < 1e-9);
        assert!((lng - 8.0033).abs() < 1e-9);
    }

    #[test]
    fn test_shelter_without_geometry_has_no_position() {
        let shelter: ShelterRecord = serde_json::from_str("{}").unwrap();
        assert!(shelter.position().is_none());
    }

    #[test]
    fn test_shelter_polygon_geometry_has_no_position() {
        let json = r#"{"geom":{"type":"Polygon","coordinates":[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]]}}"#;
        let shelter: ShelterRecord = serde_json::from_str(json).unwrap();
        assert!(shelter.position().is_none());
    }

    #[test]
    fn test_bunker_position_converts_from_utm() {
        // An easting west of the zone 32 central meridian, at Agder latitudes
        let json = r#"{"geom":{"type":"Point","coordinates":[441000.0,6447000.0]},"adresse":"Markens gate 1","plasser":120,"romnr":"A-3"}"#;
        let bunker: BunkerRecord = serde_json::from_str(json).unwrap();
        let (lat, lng) = bunker.position().unwrap();
        assert!(lat > 58.0 && lat < 58.3, "lat out of range: {lat}");
        assert!(lng > 7.8 && lng < 8.2, "lng out of range: {lng}");
        assert_eq!(bunker.plasser, Some(120));
        assert_eq!(bunker.adresse.as_deref(), Some("Markens gate 1"));
    }

    #[test]
    fn test_bunker_capacity_accepts_numeric_string() {
        let json = r#"{"plasser":"40","romnr":12}"#;
        let bunker: BunkerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(bunker.plasser, Some(40));
        assert_eq!(bunker.romnr.as_deref(), Some("12"));
    }

    #[test]
    fn test_population_area_with_string_count() {
        let json = r#"{"grunnkretsnummer":42010101,"grunnkretsnavn":"Kvadraturen","kommunenavn":"Kristiansand","totalBefolkning":"1532"}"#;
        let area: PopulationArea = serde_json::from_str(json).unwrap();
        assert_eq!(area.grunnkretsnummer, "42010101");
        assert_eq!(area.population, 1532);
        assert_eq!(area.kommunenavn.as_deref(), Some("Kristiansand"));
    }

    #[test]
    fn test_population_area_poptot_alias() {
        let json = r#"{"grunnkretsnummer":"1","poptot":250}"#;
        let area: PopulationArea = serde_json::from_str(json).unwrap();
        assert_eq!(area.population, 250);
    }

    #[test]
    fn test_population_area_geometry_alias() {
        let json = r#"{"grunnkretsnummer":"1","område":{"type":"Polygon","coordinates":[[[8.0,58.0],[8.1,58.0],[8.1,58.1],[8.0,58.0]]]}}"#;
        let area: PopulationArea = serde_json::from_str(json).unwrap();
        assert!(area.geom.is_some());
        assert_eq!(area.population, 0);
    }

    #[test]
    fn test_population_area_non_numeric_count_is_zero() {
        let json = r#"{"grunnkretsnummer":"1","totalBefolkning":"ukjent"}"#;
        let area: PopulationArea = serde_json::from_str(json).unwrap();
        assert_eq!(area.population, 0);
    }
}
