use serde::de::DeserializeOwned;
use sheltermap_shared::models::{BunkerRecord, PopulationArea, ShelterRecord};
use std::path::Path;

/// The four datasets the map serves, loaded once at startup.
///
/// Isochrone rows stay raw JSON on purpose: the upstream export is not
/// uniform (field casing and band-field names vary) and the client-side
/// geometry adapter is the component that knows how to normalize them.
#[derive(Debug)]
pub struct Assets {
    pub shelters: Vec<ShelterRecord>,
    pub bunkers: Vec<BunkerRecord>,
    pub isochrones: Vec<serde_json::Value>,
    pub population: Vec<PopulationArea>,
}

impl Assets {
    pub fn load(assets_dir: &Path) -> Result<Self, String> {
        let shelters: Vec<ShelterRecord> = read_json(&assets_dir.join("shelters.json"))?;
        let bunkers: Vec<BunkerRecord> = read_json(&assets_dir.join("bunkers.json"))?;
        let isochrones: Vec<serde_json::Value> = read_json(&assets_dir.join("isochrones.json"))?;
        let population: Vec<PopulationArea> = read_json(&assets_dir.join("population.json"))?;

        tracing::info!(
            shelters = shelters.len(),
            bunkers = bunkers.len(),
            isochrones = isochrones.len(),
            population = population.len(),
            "Loaded map datasets"
        );

        Ok(Assets {
            shelters,
            bunkers,
            isochrones,
            population,
        })
    }

    pub fn find_population_area(&self, grunnkretsnummer: &str) -> Option<&PopulationArea> {
        self.population
            .iter()
            .find(|area| area.grunnkretsnummer == grunnkretsnummer)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&data).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}
