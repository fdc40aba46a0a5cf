//! REST API for the stowage service.
//!
//! Provides HTTP endpoints for placement, retrieval and waste planning.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::config::{ApiConfig, PlacementSettings};
use crate::model::{Container, Item, Placement, RetrievalStep};
use crate::placement::PlacementEngine;
use crate::retrieval::{self, Recommendation};
use crate::store::{StoreError, StowageStore};
use crate::types::BoundingBox;
use crate::waste::{self, ReturnPlan, WasteItem, WasteStats};

#[derive(Clone)]
struct ApiState {
    store: Arc<StowageStore>,
    placement: PlacementSettings,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>stowkeeper API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request for the placement endpoints. New records are upserted into the
/// inventory before the batch run; both lists may be empty to re-plan over
/// the existing inventory.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "items": [
            {
                "itemId": "000001",
                "name": "Water Filter",
                "width": 10.0,
                "depth": 10.0,
                "height": 20.0,
                "priority": 80,
                "preferredZone": "Storage_Bay"
            }
        ],
        "containers": [
            {
                "containerId": "contA",
                "zone": "Storage_Bay",
                "width": 100.0,
                "depth": 85.0,
                "height": 200.0
            }
        ]
    })
)]
pub struct PlacementRequest {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// One item the engine could not place, with the reason.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnplacedEntry {
    pub item_id: String,
    pub reason_code: String,
    pub reason: String,
}

/// Response of a batch placement run.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResponse {
    pub success: bool,
    pub placements: Vec<Placement>,
    pub unplaced: Vec<UnplacedEntry>,
}

/// Retrieval plan for one item.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalPlanResponse {
    pub success: bool,
    pub item_id: String,
    pub total_steps: usize,
    pub steps: Vec<RetrievalStep>,
}

/// Confirms a retrieval and spends one use.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveRequest {
    pub item_id: String,
    /// Reference instant for expiry checks; defaults to the current time.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "2026-06-01T12:00:00Z")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResponse {
    pub success: bool,
    pub item: Item,
}

/// Manually re-stows an item at an explicit position.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRequest {
    pub item_id: String,
    pub container_id: String,
    pub position: BoundingBox,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WasteIdentifyResponse {
    pub success: bool,
    pub waste_items: Vec<WasteItem>,
    pub stats: WasteStats,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPlanRequest {
    pub undocking_container_id: String,
    #[schema(value_type = String, example = "2026-07-01T00:00:00Z")]
    pub undocking_date: DateTime<Utc>,
    pub max_weight: f64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPlanResponse {
    pub success: bool,
    #[serde(flatten)]
    #[schema(inline)]
    pub plan: ReturnPlan,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UndockRequest {
    pub undocking_container_id: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UndockResponse {
    pub success: bool,
    pub items_removed: usize,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub found: bool,
    pub items: Vec<Item>,
}

/// Container record plus derived utilization figures.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    pub container_id: String,
    pub zone: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub utilization_percent: f64,
    pub available_volume: f64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub success: bool,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringResponse {
    pub success: bool,
    pub items: Vec<Item>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Item id or name fragment.
    pub query: String,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationParams {
    /// Maximum number of recommendations; defaults to 10.
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringParams {
    /// Horizon in days; defaults to 30.
    #[serde(default)]
    pub days: Option<i64>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn store_error_response(err: StoreError) -> Response {
    match &err {
        StoreError::ItemNotFound(_) | StoreError::ContainerNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "Not found", err.to_string())
        }
        StoreError::Validation(_) | StoreError::InvalidPlacement(_) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input data",
            err.to_string(),
        ),
        StoreError::Retrieval(_) => {
            error_response(StatusCode::CONFLICT, "Retrieval refused", err.to_string())
        }
    }
}

fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(err) => Err(json_deserialize_error(err)),
    }
}

/// Upserts the request records and returns a full inventory snapshot.
fn ingest_placement_request(
    store: &StowageStore,
    request: PlacementRequest,
) -> Result<(Vec<Item>, Vec<Container>), Response> {
    store
        .upsert_containers(request.containers)
        .map_err(store_error_response)?;
    store
        .upsert_items(request.items)
        .map_err(store_error_response)?;
    Ok((store.items(), store.containers()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_placement,
        handle_placement_stream,
        handle_retrieval_plan,
        handle_retrieve,
        handle_place,
        handle_search,
        handle_containers,
        handle_recommendations,
        handle_waste_identify,
        handle_return_plan,
        handle_undock,
        handle_expiring
    ),
    components(
        schemas(
            PlacementRequest,
            PlacementResponse,
            UnplacedEntry,
            RetrievalPlanResponse,
            RetrieveRequest,
            RetrieveResponse,
            PlaceRequest,
            WasteIdentifyResponse,
            ReturnPlanRequest,
            ReturnPlanResponse,
            UndockRequest,
            UndockResponse,
            SearchResponse,
            ContainerSummary,
            RecommendationResponse,
            ExpiringResponse,
            ErrorResponse,
            Item,
            Container,
            Placement,
            RetrievalStep
        )
    ),
    tags(
        (name = "placement", description = "Batch stowage planning"),
        (name = "retrieval", description = "Retrieval plans and confirmations"),
        (name = "waste", description = "Waste identification and return planning"),
        (name = "inventory", description = "Item and container inventory")
    )
)]
struct ApiDoc;

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from the frontend.
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, placement: PlacementSettings) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        store: Arc::new(StowageStore::new()),
        placement,
    };

    let app = Router::new()
        // Planning endpoints
        .route("/api/placement", post(handle_placement))
        .route("/api/placement/stream", post(handle_placement_stream))
        .route("/api/retrieve/{item_id}", get(handle_retrieval_plan))
        .route("/api/retrieve", post(handle_retrieve))
        .route("/api/place", post(handle_place))
        // Inventory
        .route("/api/search", get(handle_search))
        .route("/api/containers", get(handle_containers))
        .route("/api/recommendations", get(handle_recommendations))
        .route("/api/reports/expiring", get(handle_expiring))
        // Waste management
        .route("/api/waste/identify", get(handle_waste_identify))
        .route("/api/waste/return-plan", post(handle_return_plan))
        .route("/api/waste/complete-undocking", post(handle_undock))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            panic!("❌ Could not bind API server to {}: {}", addr, err);
        }
    };

    let display_host = config.display_host().to_string();
    println!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    println!("   - POST /api/placement");
    println!("   - POST /api/placement/stream");
    println!("   - GET  /api/retrieve/{{item_id}}");
    println!("   - POST /api/retrieve");
    println!("   - GET  /api/waste/identify");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /api/placement.
///
/// Upserts the supplied records, plans positions for every unstowed item and
/// persists the committed placements.
#[utoipa::path(
    post,
    path = "/api/placement",
    request_body = PlacementRequest,
    responses(
        (status = 200, description = "Placement plan computed", body = PlacementResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or records",
            body = ErrorResponse
        )
    ),
    tag = "placement"
)]
async fn handle_placement(
    State(state): State<ApiState>,
    payload: Result<Json<PlacementRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (items, containers) = match ingest_placement_request(&state.store, request) {
        Ok(snapshot) => snapshot,
        Err(response) => return response,
    };

    let now = Utc::now();
    tracing::info!(
        items = items.len(),
        containers = containers.len(),
        "placement run requested"
    );

    let mut engine = PlacementEngine::new(state.placement.placement_config());
    let outcome = engine.place_all(&items, &containers, now);
    state.store.apply_placements(&outcome.placements, now);

    tracing::info!(
        placed = outcome.placed_count(),
        unplaced = outcome.unplaced_count(),
        "placement run finished"
    );

    let response = PlacementResponse {
        success: true,
        unplaced: outcome
            .unplaced
            .iter()
            .map(|entry| UnplacedEntry {
                item_id: entry.item_id.clone(),
                reason_code: entry.reason.code().to_string(),
                reason: entry.reason.to_string(),
            })
            .collect(),
        placements: outcome.placements,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /api/placement/stream (SSE).
///
/// Streams placement events in real-time as Server-Sent Events. The frontend
/// can visualize progress without waiting for the complete result; committed
/// placements are persisted when the run finishes.
#[utoipa::path(
    post,
    path = "/api/placement/stream",
    request_body = PlacementRequest,
    responses(
        (
            status = 200,
            description = "Streams placement events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or records",
            body = ErrorResponse
        )
    ),
    tag = "placement"
)]
async fn handle_placement_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PlacementRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (items, containers) = match ingest_placement_request(&state.store, request) {
        Ok(snapshot) => snapshot,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<String>(32);
    let config = state.placement.placement_config();
    let store = Arc::clone(&state.store);

    tokio::task::spawn_blocking(move || {
        let now = Utc::now();
        let mut engine = PlacementEngine::new(config);
        let outcome = engine.place_all_with_progress(&items, &containers, now, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                if tx.blocking_send(json).is_err() {
                    // Receiver has closed the stream; remaining events are discarded.
                    return;
                }
            }
        });
        store.apply_placements(&outcome.placements, now);
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for GET /api/retrieve/{item_id}.
///
/// Returns the step-by-step plan to extract one item without mutating state.
#[utoipa::path(
    get,
    path = "/api/retrieve/{item_id}",
    params(("item_id" = String, Path, description = "Item to plan retrieval for")),
    responses(
        (status = 200, description = "Retrieval plan", body = RetrievalPlanResponse),
        (status = NOT_FOUND, description = "Unknown or unplaced item", body = ErrorResponse)
    ),
    tag = "retrieval"
)]
async fn handle_retrieval_plan(
    State(state): State<ApiState>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    let items = state.store.items();
    match retrieval::plan_retrieval(&item_id, &items) {
        Ok(steps) => {
            let response = RetrievalPlanResponse {
                success: true,
                item_id,
                total_steps: steps.len(),
                steps,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => error_response(StatusCode::NOT_FOUND, "No retrieval plan", err.to_string()),
    }
}

/// Handler for POST /api/retrieve.
///
/// Confirms a retrieval and spends one use of the item.
#[utoipa::path(
    post,
    path = "/api/retrieve",
    request_body = RetrieveRequest,
    responses(
        (status = 200, description = "Retrieval confirmed", body = RetrieveResponse),
        (status = NOT_FOUND, description = "Unknown item", body = ErrorResponse),
        (status = CONFLICT, description = "Item expired, depleted or unplaced", body = ErrorResponse)
    ),
    tag = "retrieval"
)]
async fn handle_retrieve(
    State(state): State<ApiState>,
    payload: Result<Json<RetrieveRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let now = request.timestamp.unwrap_or_else(Utc::now);
    match state.store.confirm_retrieval(&request.item_id, now) {
        Ok(item) => {
            tracing::info!(item_id = %item.item_id, uses = item.current_uses, "retrieval confirmed");
            (StatusCode::OK, Json(RetrieveResponse { success: true, item })).into_response()
        }
        Err(err) => store_error_response(err),
    }
}

/// Handler for POST /api/place.
///
/// Records a manual placement, e.g. after the crew stowed an item somewhere
/// other than the planned slot.
#[utoipa::path(
    post,
    path = "/api/place",
    request_body = PlaceRequest,
    responses(
        (status = 200, description = "Placement recorded", body = RetrieveResponse),
        (status = NOT_FOUND, description = "Unknown item or container", body = ErrorResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Position out of bounds, colliding or not a rotation of the item",
            body = ErrorResponse
        )
    ),
    tag = "retrieval"
)]
async fn handle_place(
    State(state): State<ApiState>,
    payload: Result<Json<PlaceRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let now = request.timestamp.unwrap_or_else(Utc::now);
    match state.store.update_placement(
        &request.item_id,
        &request.container_id,
        request.position,
        now,
    ) {
        Ok(item) => {
            (StatusCode::OK, Json(RetrieveResponse { success: true, item })).into_response()
        }
        Err(err) => store_error_response(err),
    }
}

/// Handler for GET /api/search.
#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchParams),
    responses((status = 200, description = "Matching items", body = SearchResponse)),
    tag = "inventory"
)]
async fn handle_search(
    State(state): State<ApiState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let items = state.store.search_items(&params.query);
    let response = SearchResponse {
        success: true,
        found: !items.is_empty(),
        items,
    };
    (StatusCode::OK, Json(response))
}

/// Handler for GET /api/containers.
#[utoipa::path(
    get,
    path = "/api/containers",
    responses(
        (status = 200, description = "Containers with utilization", body = [ContainerSummary])
    ),
    tag = "inventory"
)]
async fn handle_containers(State(state): State<ApiState>) -> impl IntoResponse {
    let items = state.store.items();
    let summaries: Vec<ContainerSummary> = state
        .store
        .containers()
        .into_iter()
        .map(|container| ContainerSummary {
            utilization_percent: container.utilization_percent(items.iter()),
            available_volume: container.available_volume(items.iter()),
            container_id: container.container_id,
            zone: container.zone,
            width: container.width,
            depth: container.depth,
            height: container.height,
        })
        .collect();
    (StatusCode::OK, Json(summaries))
}

/// Handler for GET /api/recommendations.
///
/// Ranks retrievable items by urgency discounted by retrieval difficulty.
#[utoipa::path(
    get,
    path = "/api/recommendations",
    params(RecommendationParams),
    responses(
        (status = 200, description = "Ranked retrieval candidates", body = RecommendationResponse)
    ),
    tag = "retrieval"
)]
async fn handle_recommendations(
    State(state): State<ApiState>,
    Query(params): Query<RecommendationParams>,
) -> impl IntoResponse {
    let items = state.store.items();
    let recommendations = retrieval::recommend(&items, Utc::now(), params.limit.unwrap_or(10));
    (
        StatusCode::OK,
        Json(RecommendationResponse {
            success: true,
            recommendations,
        }),
    )
}

/// Handler for GET /api/waste/identify.
#[utoipa::path(
    get,
    path = "/api/waste/identify",
    responses(
        (status = 200, description = "Expired and depleted items", body = WasteIdentifyResponse)
    ),
    tag = "waste"
)]
async fn handle_waste_identify(State(state): State<ApiState>) -> impl IntoResponse {
    let items = state.store.items();
    let now = Utc::now();
    let response = WasteIdentifyResponse {
        success: true,
        waste_items: waste::identify_waste(&items, now),
        stats: waste::waste_stats(&items, now),
    };
    (StatusCode::OK, Json(response))
}

/// Handler for POST /api/waste/return-plan.
///
/// Plans moving waste into an undocking container under a weight budget.
#[utoipa::path(
    post,
    path = "/api/waste/return-plan",
    request_body = ReturnPlanRequest,
    responses(
        (status = 200, description = "Return plan", body = ReturnPlanResponse),
        (status = NOT_FOUND, description = "Unknown undocking container", body = ErrorResponse)
    ),
    tag = "waste"
)]
async fn handle_return_plan(
    State(state): State<ApiState>,
    payload: Result<Json<ReturnPlanRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let items = state.store.items();
    let containers = state.store.containers();
    match waste::plan_return(
        &items,
        &containers,
        &request.undocking_container_id,
        request.undocking_date,
        request.max_weight,
        Utc::now(),
    ) {
        Ok(plan) => {
            (StatusCode::OK, Json(ReturnPlanResponse { success: true, plan })).into_response()
        }
        Err(err) => error_response(StatusCode::NOT_FOUND, "No return plan", err.to_string()),
    }
}

/// Handler for POST /api/waste/complete-undocking.
///
/// Detaches everything inside the departing container and deletes it.
#[utoipa::path(
    post,
    path = "/api/waste/complete-undocking",
    request_body = UndockRequest,
    responses(
        (status = 200, description = "Undocking executed", body = UndockResponse),
        (status = NOT_FOUND, description = "Unknown container", body = ErrorResponse)
    ),
    tag = "waste"
)]
async fn handle_undock(
    State(state): State<ApiState>,
    payload: Result<Json<UndockRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state.store.undock_container(&request.undocking_container_id) {
        Ok(items_removed) => {
            tracing::info!(
                container_id = %request.undocking_container_id,
                items_removed,
                "undocking completed"
            );
            (
                StatusCode::OK,
                Json(UndockResponse {
                    success: true,
                    items_removed,
                }),
            )
                .into_response()
        }
        Err(err) => store_error_response(err),
    }
}

/// Handler for GET /api/reports/expiring.
#[utoipa::path(
    get,
    path = "/api/reports/expiring",
    params(ExpiringParams),
    responses(
        (status = 200, description = "Placed items expiring within the horizon", body = ExpiringResponse)
    ),
    tag = "inventory"
)]
async fn handle_expiring(
    State(state): State<ApiState>,
    Query(params): Query<ExpiringParams>,
) -> impl IntoResponse {
    let items = state
        .store
        .expiring_within(params.days.unwrap_or(30), Utc::now());
    (
        StatusCode::OK,
        Json(ExpiringResponse {
            success: true,
            items,
        }),
    )
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
