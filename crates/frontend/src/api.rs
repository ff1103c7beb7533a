use serde::{Deserialize, Serialize};

/// Build the variables JSON for a predictPopulation query.
pub fn build_predict_variables(grunnkretsnummer: &str, year: i32) -> serde_json::Value {
    serde_json::json!({
        "grunnkretsnummer": grunnkretsnummer,
        "year": year,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

fn api_url() -> String {
    // In production, same origin. In dev, might be different.
    let window = web_sys::window().unwrap();
    let origin = window.location().origin().unwrap();
    format!("{}/graphql", origin)
}

async fn query<T: for<'de> Deserialize<'de>>(
    query_str: &str,
    variables: Option<serde_json::Value>,
) -> Result<T, String> {
    let req = GraphQLRequest {
        query: query_str.to_string(),
        variables,
    };

    let resp = reqwest::Client::new()
        .post(api_url())
        .json(&req)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let gql_resp: GraphQLResponse<T> = resp.json().await.map_err(|e| e.to_string())?;

    if let Some(errors) = gql_resp.errors {
        if !errors.is_empty() {
            return Err(errors[0].message.clone());
        }
    }

    gql_resp.data.ok_or_else(|| "No data returned".to_string())
}

// Types mirroring the GraphQL schema

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelterData {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BunkerData {
    pub lat: f64,
    pub lng: f64,
    pub address: Option<String>,
    pub capacity: Option<i64>,
    pub room_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationAreaData {
    pub grunnkretsnummer: String,
    pub name: Option<String>,
    pub municipality: Option<String>,
    pub population: i64,
    pub geometry: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionData {
    pub predicted_population: i64,
    pub predicted_growth: i64,
    pub growth_percentage: f64,
}

// API functions

#[derive(Deserialize)]
pub struct SheltersResponse {
    pub shelters: Vec<ShelterData>,
}

pub async fn fetch_shelters() -> Result<Vec<ShelterData>, String> {
    let resp: SheltersResponse = query(r#"query { shelters { lat lng } }"#, None).await?;
    Ok(resp.shelters)
}

#[derive(Deserialize)]
pub struct BunkersResponse {
    pub bunkers: Vec<BunkerData>,
}

pub async fn fetch_bunkers() -> Result<Vec<BunkerData>, String> {
    let resp: BunkersResponse = query(
        r#"query { bunkers { lat lng address capacity roomNumber } }"#,
        None,
    )
    .await?;
    Ok(resp.bunkers)
}

#[derive(Deserialize)]
pub struct IsochronesResponse {
    pub isochrones: Vec<serde_json::Value>,
}

/// Isochrone rows come back raw; the shared geometry adapter normalizes
/// them on this side.
pub async fn fetch_isochrones() -> Result<Vec<serde_json::Value>, String> {
    let resp: IsochronesResponse = query(r#"query { isochrones }"#, None).await?;
    Ok(resp.isochrones)
}

#[derive(Deserialize)]
pub struct PopulationAreasResponse {
    #[serde(rename = "populationAreas")]
    pub population_areas: Vec<PopulationAreaData>,
}

pub async fn fetch_population_areas() -> Result<Vec<PopulationAreaData>, String> {
    let resp: PopulationAreasResponse = query(
        r#"query { populationAreas { grunnkretsnummer name municipality population geometry } }"#,
        None,
    )
    .await?;
    Ok(resp.population_areas)
}

#[derive(Deserialize)]
pub struct PredictResponse {
    #[serde(rename = "predictPopulation")]
    pub predict_population: PredictionData,
}

pub async fn predict(grunnkretsnummer: &str, year: i32) -> Result<PredictionData, String> {
    let variables = build_predict_variables(grunnkretsnummer, year);
    let resp: PredictResponse = query(
        r#"query Predict($grunnkretsnummer: String!, $year: Int!) {
            predictPopulation(grunnkretsnummer: $grunnkretsnummer, year: $year) {
                predictedPopulation predictedGrowth growthPercentage
            }
        }"#,
        Some(variables),
    )
    .await?;
    Ok(resp.predict_population)
}
