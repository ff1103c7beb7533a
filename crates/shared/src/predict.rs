use serde::{Deserialize, Serialize};

/// Average annual population growth rate in Norway.
const ANNUAL_GROWTH_RATE: f64 = 0.008;

/// Census year the growth model counts from.
pub const BASE_YEAR: i32 = 2024;

/// Areas below this resident count are too small for a reliable prediction.
pub const MIN_PREDICTABLE_POPULATION: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationPrediction {
    pub predicted_population: i64,
    pub predicted_growth: i64,
    pub growth_percentage: f64,
}

/// Project an area's population to `year` with compound annual growth.
///
/// Years before [`BASE_YEAR`] project backwards. Callers are expected to
/// reject areas below [`MIN_PREDICTABLE_POPULATION`] before predicting.
pub fn predict_population(current_population: i64, year: i32) -> PopulationPrediction {
    let years = year - BASE_YEAR;
    let predicted_population =
        ((current_population as f64) * (1.0 + ANNUAL_GROWTH_RATE).powi(years)).round() as i64;
    let predicted_growth = predicted_population - current_population;
    let growth_percentage = predicted_growth as f64 / current_population as f64 * 100.0;

    PopulationPrediction {
        predicted_population,
        predicted_growth,
        growth_percentage,
    }
}
