//! HTTP handler functions for the retail radar API.

use actix_web::{HttpResponse, web};
use retail_radar_analysis::{AnalysisError, AnalysisReport, analyze_report};
use retail_radar_analysis_models::AnalysisParams;
use retail_radar_server_models::{
    AnalyzeRequest, AnalyzeResponse, ApiError, ApiGeocode, ApiHealth, ApiInsightSection,
    ClusterParams, ClustersRequest, ClustersResponse, GeocodeParams, ScanRequest, ScanResponse,
};
use retail_radar_source::DEFAULT_RADIUS_METERS;
use retail_radar_store_models::{GeoPoint, RawRecord};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/geocode?q=`
pub async fn geocode(
    state: web::Data<AppState>,
    params: web::Query<GeocodeParams>,
) -> HttpResponse {
    let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return HttpResponse::BadRequest().json(ApiError::new("Query missing"));
    };

    match state.geocoder.geocode(q).await {
        Ok(Some(location)) => HttpResponse::Ok().json(ApiGeocode {
            lat: location.lat,
            lon: location.lon,
            display_name: location.display_name,
            provider: location.provider.to_string(),
        }),
        Ok(None) => HttpResponse::NotFound().json(ApiError::new("Location not found")),
        Err(e) => {
            log::error!("Geocoding '{q}' failed: {e}");
            HttpResponse::BadGateway().json(ApiError::with_details("Failed to fetch geocode", e))
        }
    }
}

/// `POST /api/clusters`
///
/// Classifies, clusters, and summarizes caller-supplied records.
pub async fn clusters(
    state: web::Data<AppState>,
    body: web::Json<ClustersRequest>,
) -> HttpResponse {
    let ClustersRequest { records, params } = body.into_inner();

    match run_analysis(&state, records, params).await {
        Ok(report) => HttpResponse::Ok().json(ClustersResponse {
            noise: noise_ids(&report),
            clusters: report.summaries,
        }),
        Err(response) => response,
    }
}

/// `POST /api/scan`
///
/// Geocodes the address, fetches nearby shops, and clusters them.
pub async fn scan(state: web::Data<AppState>, body: web::Json<ScanRequest>) -> HttpResponse {
    let ScanRequest {
        address,
        radius_meters,
        params,
    } = body.into_inner();

    let address = address.trim();
    if address.is_empty() {
        return HttpResponse::BadRequest().json(ApiError::new("Address missing"));
    }

    let radius = radius_meters.unwrap_or(DEFAULT_RADIUS_METERS);
    if !radius.is_finite() || radius <= 0.0 {
        return HttpResponse::BadRequest().json(ApiError::with_details(
            "Invalid parameters",
            format!("radiusMeters must be positive, got {radius}"),
        ));
    }

    let analysis_params = analysis_params(params);
    if let Err(e) =
        retail_radar_cluster::validate_params(analysis_params.eps_meters, analysis_params.min_pts)
    {
        return HttpResponse::BadRequest().json(ApiError::with_details("Invalid parameters", e));
    }

    let center = match state.geocoder.geocode(address).await {
        Ok(Some(location)) => GeoPoint::new(location.lat, location.lon),
        Ok(None) => return HttpResponse::NotFound().json(ApiError::new("Location not found")),
        Err(e) => {
            log::error!("Geocoding '{address}' failed: {e}");
            return HttpResponse::BadGateway()
                .json(ApiError::with_details("Failed to fetch geocode", e));
        }
    };

    let records = match state.overpass.fetch_stores(center, radius).await {
        Ok(records) => records,
        Err(e) => {
            log::error!("Overpass fetch around '{address}' failed: {e}");
            return HttpResponse::BadGateway()
                .json(ApiError::with_details("Failed to fetch stores", e));
        }
    };

    match run_analysis(&state, records, params).await {
        Ok(report) => HttpResponse::Ok().json(ScanResponse {
            center,
            noise: noise_ids(&report),
            stores: report.stores,
            clusters: report.summaries,
        }),
        Err(response) => response,
    }
}

/// `POST /api/analyze`
///
/// Asks the configured LLM to describe a set of clusters.
pub async fn analyze(state: web::Data<AppState>, body: web::Json<AnalyzeRequest>) -> HttpResponse {
    let AnalyzeRequest { location, clusters } = body.into_inner();

    let (Some(location), Some(clusters)) = (location, clusters) else {
        return HttpResponse::BadRequest().json(ApiError::new("Missing location or clusters"));
    };

    let population = state.population.context_for(&location.address);

    let prompt = match retail_radar_ai::build_prompt(
        &location.address,
        &clusters,
        population.as_deref(),
    ) {
        Ok(prompt) => prompt,
        Err(e) => {
            log::error!("Failed to build insight prompt: {e}");
            return HttpResponse::InternalServerError()
                .json(ApiError::with_details("Failed to build prompt", e));
        }
    };

    let Some(provider) = state.provider.as_ref() else {
        return HttpResponse::BadGateway().json(ApiError::with_details(
            "AI request failed",
            "no AI provider configured",
        ));
    };

    match provider.generate(&prompt).await {
        Ok(insight) => {
            let sections = retail_radar_ai::split_sections(&insight)
                .into_iter()
                .map(|s| ApiInsightSection {
                    heading: s.heading,
                    body: s.body,
                })
                .collect();
            HttpResponse::Ok().json(AnalyzeResponse { insight, sections })
        }
        Err(e) => {
            log::error!("{} insight request failed: {e}", provider.name());
            HttpResponse::BadGateway().json(ApiError::with_details("AI request failed", e))
        }
    }
}

fn analysis_params(params: ClusterParams) -> AnalysisParams {
    let defaults = AnalysisParams::default();
    AnalysisParams {
        eps_meters: params.eps.unwrap_or(defaults.eps_meters),
        min_pts: params.min_pts.unwrap_or(defaults.min_pts),
        neighbor_search: params.neighbor_search.unwrap_or(defaults.neighbor_search),
    }
}

/// Runs the pipeline on the blocking pool, mapping failures to responses.
async fn run_analysis(
    state: &AppState,
    records: Vec<RawRecord>,
    params: ClusterParams,
) -> Result<AnalysisReport, HttpResponse> {
    let params = analysis_params(params);
    let rules = state.rules.clone();

    match web::block(move || analyze_report(&records, &params, &rules)).await {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(e)) => {
            let error = match &e {
                AnalysisError::Cluster(_) => "Invalid parameters",
                AnalysisError::InvalidLocation { .. } => "Invalid records",
            };
            Err(HttpResponse::BadRequest().json(ApiError::with_details(error, e)))
        }
        Err(e) => {
            log::error!("Analysis task failed: {e}");
            Err(HttpResponse::InternalServerError().json(ApiError::new("Analysis failed")))
        }
    }
}

fn noise_ids(report: &AnalysisReport) -> Vec<String> {
    report.noise_ids().into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test};
    use retail_radar_ai::{AiError, InsightProvider};
    use retail_radar_classify::ClassifierRules;
    use retail_radar_geocoder::Geocoder;
    use retail_radar_population::PopulationTable;
    use retail_radar_source::OverpassClient;
    use serde_json::{Value, json};

    use super::*;

    struct CannedProvider(Result<&'static str, &'static str>);

    #[async_trait::async_trait]
    impl InsightProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn model(&self) -> &'static str {
            "canned-1"
        }

        async fn generate(&self, prompt: &str) -> Result<String, AiError> {
            assert!(prompt.contains("Population data for Lagos"));
            self.0.map(str::to_string).map_err(|m| AiError::SchemaMismatch {
                message: m.to_string(),
            })
        }
    }

    fn state(provider: Option<Arc<dyn InsightProvider>>) -> web::Data<AppState> {
        let client = reqwest::Client::new();
        web::Data::new(AppState {
            rules: Arc::new(ClassifierRules::default()),
            population: Arc::new(
                PopulationTable::from_json_str(r#"{"Lagos": {"Ikeja": 313196}}"#).unwrap(),
            ),
            geocoder: Geocoder::with_services(client.clone(), Vec::new()),
            overpass: OverpassClient::new(client, "http://127.0.0.1:9/api/interpreter"),
            provider,
        })
    }

    fn lagos_records() -> Value {
        json!([
            {
                "id": "a",
                "location": { "lat": 6.5244, "lng": 3.3792 },
                "tags": { "shop": "supermarket" }
            },
            {
                "id": "b",
                "location": { "lat": 6.5246, "lng": 3.3793 },
                "tags": { "shop": "bakery" }
            },
            { "id": "c", "location": { "lat": 6.5245, "lng": 3.3791 } },
            { "id": "d", "location": { "lat": 6.6244, "lng": 3.3792 } }
        ])
    }

    fn analyze_body() -> Value {
        json!({
            "location": { "address": "Ikeja, Lagos" },
            "clusters": [{
                "id": 1,
                "centroid": { "lat": 6.5245, "lng": 3.3792 },
                "storeCount": 3,
                "types": { "bakery": 3 },
                "sizes": { "medium": 3 }
            }]
        })
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app =
            test::init_service(App::new().app_data(state(None)).configure(crate::configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn clusters_endpoint_summarizes_records() {
        let app =
            test::init_service(App::new().app_data(state(None)).configure(crate::configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/clusters")
            .set_json(json!({ "records": lagos_records() }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["clusters"].as_array().unwrap().len(), 1);
        assert_eq!(body["clusters"][0]["id"], 1);
        assert_eq!(body["clusters"][0]["storeCount"], 3);
        assert_eq!(body["clusters"][0]["radiusMeters"], 100.0);
        assert_eq!(body["noise"], json!(["d"]));
    }

    #[actix_web::test]
    async fn clusters_endpoint_rejects_negative_eps() {
        let app =
            test::init_service(App::new().app_data(state(None)).configure(crate::configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/clusters")
            .set_json(json!({ "records": lagos_records(), "eps": -1.0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn clusters_endpoint_rejects_out_of_range_location() {
        let app =
            test::init_service(App::new().app_data(state(None)).configure(crate::configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/clusters")
            .set_json(json!({
                "records": [
                    { "id": "a", "location": { "lat": -20.0, "lng": 0.0 } },
                    { "id": "b", "location": { "lat": -20.00001, "lng": 0.0 } },
                    { "id": "bad", "location": { "lat": 200.0, "lng": 179.99995 } }
                ],
                "eps": 10.0,
                "minPts": 2,
                "neighborSearch": "rtree"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid records");
        assert!(body["details"].as_str().unwrap().contains("bad"));
    }

    #[actix_web::test]
    async fn geocode_requires_query() {
        let app =
            test::init_service(App::new().app_data(state(None)).configure(crate::configure)).await;
        let req = test::TestRequest::get().uri("/api/geocode?q=%20%20").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let req = test::TestRequest::get().uri("/api/geocode").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn geocode_with_no_services_is_not_found() {
        let app =
            test::init_service(App::new().app_data(state(None)).configure(crate::configure)).await;
        let req = test::TestRequest::get().uri("/api/geocode?q=Ikeja").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn scan_validates_before_fetching() {
        let app =
            test::init_service(App::new().app_data(state(None)).configure(crate::configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/scan")
            .set_json(json!({ "address": "  " }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/scan")
            .set_json(json!({ "address": "Ikeja", "minPts": 0 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/scan")
            .set_json(json!({ "address": "Ikeja", "radiusMeters": 0 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }

    #[actix_web::test]
    async fn analyze_requires_location_and_clusters() {
        let app =
            test::init_service(App::new().app_data(state(None)).configure(crate::configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(json!({ "clusters": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn analyze_without_provider_is_bad_gateway() {
        let app =
            test::init_service(App::new().app_data(state(None)).configure(crate::configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(analyze_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 502);
    }

    #[actix_web::test]
    async fn analyze_returns_insight_and_sections() {
        let provider: Arc<dyn InsightProvider> = Arc::new(CannedProvider(Ok(
            "Overall store density:\nHigh.\nCluster highlights:\nOne bakery cluster.",
        )));
        let app = test::init_service(
            App::new()
                .app_data(state(Some(provider)))
                .configure(crate::configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(analyze_body())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert!(body["insight"].as_str().unwrap().starts_with("Overall store density"));
        assert_eq!(body["sections"].as_array().unwrap().len(), 2);
        assert_eq!(body["sections"][1]["heading"], "Cluster highlights");
        assert_eq!(body["sections"][1]["body"], "One bakery cluster.");
    }

    #[actix_web::test]
    async fn analyze_schema_mismatch_is_bad_gateway_with_details() {
        let provider: Arc<dyn InsightProvider> =
            Arc::new(CannedProvider(Err("missing candidates[0]")));
        let app = test::init_service(
            App::new()
                .app_data(state(Some(provider)))
                .configure(crate::configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(analyze_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 502);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "AI request failed");
        assert!(body["details"].as_str().unwrap().contains("missing candidates[0]"));
    }
}
