use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;

use stockbook_core::{MovementId, ProductId};
use stockbook_infra::{
    InMemoryMovementStore, LedgerAggregator, LedgerError, LedgerRequest, MovementStore,
    PostgresMovementStore, ProductCatalog, StoreError,
};
use stockbook_inventory::{MovementDraft, ProductSummary};

/// Service wiring shared by all handlers.
///
/// Stores are held as trait objects so the same router runs over the
/// in-memory backend (dev/test) and Postgres (production). Their trait
/// surface is blocking, so every handler bridges through `spawn_blocking`
/// rather than stalling a runtime worker.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn MovementStore>,
    catalog: Arc<dyn ProductCatalog>,
    ledger: Arc<LedgerAggregator<Arc<dyn MovementStore>>>,
}

impl AppServices {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: MovementStore + ProductCatalog + 'static,
    {
        let movement_store: Arc<dyn MovementStore> = store.clone();
        let catalog: Arc<dyn ProductCatalog> = store;
        let ledger = Arc::new(LedgerAggregator::new(movement_store.clone()));
        Self {
            store: movement_store,
            catalog,
            ledger,
        }
    }
}

/// Build the application router, choosing the backend from the
/// environment: `DATABASE_URL` set means Postgres, otherwise in-memory.
pub async fn build_app() -> anyhow::Result<Router> {
    let services = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = PgPool::connect(&url).await?;
            tracing::info!("movement store: postgres");
            AppServices::from_store(Arc::new(PostgresMovementStore::new(pool)))
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set; movement store: in-memory");
            AppServices::from_store(Arc::new(InMemoryMovementStore::new()))
        }
    };

    Ok(router(services))
}

/// Router over a fresh in-memory backend. Used by tests; also handy for
/// local experiments.
pub fn build_app_in_memory() -> Router {
    router(AppServices::from_store(Arc::new(InMemoryMovementStore::new())))
}

fn router(services: AppServices) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/products", post(upsert_product).get(list_products))
        .route("/products/:id", get(get_product))
        .nest("/inventory", inventory_router())
        .layer(Extension(Arc::new(services)))
}

fn inventory_router() -> Router {
    Router::new()
        .route("/movements", post(record_movement).get(list_movements))
        .route("/movements/:id", get(get_movement))
        .route("/ledger", post(compute_ledger))
        .route("/stock-totals", get(stock_totals))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Run a blocking store call off the runtime workers.
async fn blocking<T, F>(f: F) -> Result<T, axum::response::Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!("blocking store task failed: {e}");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "internal task failure",
        )
    })
}

async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Json(draft): Json<MovementDraft>,
) -> axum::response::Response {
    let store = services.store.clone();
    let appended = match blocking(move || store.append(draft)).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match appended {
        Ok(movement) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "id": movement.id.to_string(),
            })),
        )
            .into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let store = services.store.clone();
    let listed = match blocking(move || store.list_movements()).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match listed {
        Ok(movements) => (StatusCode::OK, Json(movements)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn get_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MovementId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid movement id"),
    };

    let store = services.store.clone();
    let fetched = match blocking(move || store.get_movement(id)).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match fetched {
        Ok(Some(movement)) => (StatusCode::OK, Json(movement)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not_found", "movement not found"),
        Err(e) => store_error_to_response(e),
    }
}

async fn compute_ledger(
    Extension(services): Extension<Arc<AppServices>>,
    Json(request): Json<LedgerRequest>,
) -> axum::response::Response {
    let ledger = services.ledger.clone();
    let computed = match blocking(move || ledger.compute_ledger(&request)).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match computed {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => ledger_error_to_response(e),
    }
}

async fn stock_totals(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let ledger = services.ledger.clone();
    let computed = match blocking(move || ledger.stock_totals()).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match computed {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => ledger_error_to_response(e),
    }
}

async fn upsert_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(product): Json<ProductSummary>,
) -> axum::response::Response {
    let id = product.id;
    let catalog = services.catalog.clone();
    let upserted = match blocking(move || catalog.upsert(product)).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match upserted {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "id": id,
            })),
        )
            .into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    let catalog = services.catalog.clone();
    let fetched = match blocking(move || catalog.get(id)).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match fetched {
        Ok(Some(product)) => (StatusCode::OK, Json(product)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => store_error_to_response(e),
    }
}

async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let catalog = services.catalog.clone();
    let listed = match blocking(move || catalog.list()).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match listed {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::InvalidPeriod(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_period", err.to_string())
        }
        LedgerError::InvalidFilterKey(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_filter_key", err.to_string())
        }
        LedgerError::InvalidFilterValue { .. } => {
            json_error(StatusCode::BAD_REQUEST, "invalid_filter_value", err.to_string())
        }
        LedgerError::DataAccess(e) => {
            tracing::error!("ledger read failed: {e}");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "data_access",
                "movement store unavailable",
            )
        }
    }
}

fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::InvalidAppend(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_movement", msg)
        }
        StoreError::Query(_) | StoreError::Unavailable(_) | StoreError::MalformedRow(_) => {
            tracing::error!("store operation failed: {err}");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "movement store unavailable",
            )
        }
    }
}

fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(serde_json::json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
