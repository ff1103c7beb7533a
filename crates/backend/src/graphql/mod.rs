use std::sync::Arc;

use async_graphql::{Context, Json, Object, SimpleObject};
use sheltermap_shared::predict;

use crate::assets::Assets;

// GraphQL output types

#[derive(SimpleObject)]
pub struct GqlShelter {
    pub lat: f64,
    pub lng: f64,
}

#[derive(SimpleObject)]
pub struct GqlBunker {
    pub lat: f64,
    pub lng: f64,
    pub address: Option<String>,
    pub capacity: Option<i64>,
    pub room_number: Option<String>,
}

#[derive(SimpleObject)]
pub struct GqlPopulationArea {
    pub grunnkretsnummer: String,
    pub name: Option<String>,
    pub municipality: Option<String>,
    pub population: i64,
    /// Raw GeoJSON geometry for the choropleth layer.
    pub geometry: Option<Json<serde_json::Value>>,
}

#[derive(SimpleObject)]
pub struct GqlPrediction {
    pub predicted_population: i64,
    pub predicted_growth: i64,
    pub growth_percentage: f64,
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Alternative shelters with a usable position. Records without point
    /// geometry are dropped here, matching the map's marker layer.
    async fn shelters(&self, ctx: &Context<'_>) -> Vec<GqlShelter> {
        let assets = ctx.data::<Arc<Assets>>().unwrap();
        assets
            .shelters
            .iter()
            .filter_map(|shelter| shelter.position())
            .map(|(lat, lng)| GqlShelter { lat, lng })
            .collect()
    }

    /// Public bunkers, positions converted from UTM zone 32N.
    async fn bunkers(&self, ctx: &Context<'_>) -> Vec<GqlBunker> {
        let assets = ctx.data::<Arc<Assets>>().unwrap();
        assets
            .bunkers
            .iter()
            .filter_map(|bunker| {
                let (lat, lng) = bunker.position()?;
                Some(GqlBunker {
                    lat,
                    lng,
                    address: bunker.adresse.clone(),
                    capacity: bunker.plasser,
                    room_number: bunker.romnr.clone(),
                })
            })
            .collect()
    }

    /// Isochrone rows exactly as the upstream export produced them. The
    /// client-side geometry adapter normalizes field casing and band
    /// fields, so the server does not reshape these.
    async fn isochrones(&self, ctx: &Context<'_>) -> Json<Vec<serde_json::Value>> {
        let assets = ctx.data::<Arc<Assets>>().unwrap();
        Json(assets.isochrones.clone())
    }

    async fn population_areas(&self, ctx: &Context<'_>) -> Vec<GqlPopulationArea> {
        let assets = ctx.data::<Arc<Assets>>().unwrap();
        assets
            .population
            .iter()
            .map(|area| GqlPopulationArea {
                grunnkretsnummer: area.grunnkretsnummer.clone(),
                name: area.grunnkretsnavn.clone(),
                municipality: area.kommunenavn.clone(),
                population: area.population,
                geometry: area
                    .geom
                    .as_ref()
                    .and_then(|g| serde_json::to_value(g).ok())
                    .map(Json),
            })
            .collect()
    }

    /// Project an area's population to the given year with the compound
    /// growth model.
    async fn predict_population(
        &self,
        ctx: &Context<'_>,
        grunnkretsnummer: String,
        year: i32,
    ) -> async_graphql::Result<GqlPrediction> {
        let assets = ctx.data::<Arc<Assets>>().unwrap();
        let area = assets
            .find_population_area(&grunnkretsnummer)
            .ok_or_else(|| async_graphql::Error::new("Area not found"))?;

        if area.population < predict::MIN_PREDICTABLE_POPULATION {
            return Err(async_graphql::Error::new(
                "The selected area has fewer than 10 residents, which is too small for reliable prediction.",
            ));
        }

        let prediction = predict::predict_population(area.population, year);
        Ok(GqlPrediction {
            predicted_population: prediction.predicted_population,
            predicted_growth: prediction.predicted_growth,
            growth_percentage: prediction.growth_percentage,
        })
    }
}

pub type Schema =
    async_graphql::Schema<QueryRoot, async_graphql::EmptyMutation, async_graphql::EmptySubscription>;

pub fn build_schema(assets: Arc<Assets>) -> Schema {
    async_graphql::Schema::build(
        QueryRoot,
        async_graphql::EmptyMutation,
        async_graphql::EmptySubscription,
    )
    .data(assets)
    .finish()
}
