use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post, put};
use axum::Router;
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::categorizer::{delete_rule, load_rules, upsert_rule};
use crate::connections::{self, CredentialInput, SavedItemInput};
use crate::dashboard::{get_dashboard, Dashboard, DashboardQuery, Filters};
use crate::error::{FinboardError, Result};
use crate::models::{Credential, Rule, SavedItem, Transaction};
use crate::periods::{available_periods, PeriodOption};
use crate::pluggy::PluggyClient;
use crate::reviewer;
use crate::service::{fetch_item, plan_sync, store_item, SyncReport};
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    settings: Arc<Settings>,
}

impl AppState {
    pub fn new(conn: Connection, settings: Settings) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            settings: Arc::new(settings),
        }
    }
}

type AppResult<T> = std::result::Result<Json<T>, FinboardError>;

impl IntoResponse for FinboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            FinboardError::Validation(_) | FinboardError::Json(_) => StatusCode::BAD_REQUEST,
            FinboardError::NotFound(_) => StatusCode::NOT_FOUND,
            FinboardError::Provider { .. } | FinboardError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn lock(db: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    db.lock()
        .map_err(|_| FinboardError::Other("database lock poisoned".to_string()))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Run store work on the blocking pool while holding the connection.
async fn with_db<T, F>(state: &AppState, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Connection, &Settings) -> Result<T> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = lock(&state.db)?;
        work(&mut conn, &state.settings)
    })
    .await
    .map_err(|e| FinboardError::Other(format!("worker task failed: {e}")))?
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| FinboardError::Validation(e.body_text()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn dashboard(
    State(state): State<AppState>,
    query: std::result::Result<Query<DashboardQuery>, QueryRejection>,
) -> AppResult<Dashboard> {
    let Query(query) = query.map_err(|e| FinboardError::Validation(e.body_text()))?;
    let filters = Filters::parse(&query)?;
    tracing::debug!(?query, "dashboard requested");
    let dashboard = with_db(&state, move |conn, settings| {
        get_dashboard(
            conn,
            &settings.billing_cycles,
            &filters,
            today(),
            settings.transaction_page_limit,
        )
    })
    .await?;
    Ok(Json(dashboard))
}

async fn periods() -> AppResult<Vec<PeriodOption>> {
    Ok(Json(available_periods(today())?))
}

#[derive(Debug, Deserialize)]
struct SyncRequest {
    #[serde(rename = "itemId")]
    item_id: String,
    #[serde(default, alias = "credentialId")]
    credential_id: Option<i64>,
}

async fn pluggy_sync(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SyncRequest>, JsonRejection>,
) -> AppResult<SyncReport> {
    let request = body(payload)?;
    // The connection is released while the provider is being paged through.
    let report = tokio::task::spawn_blocking(move || -> Result<SyncReport> {
        let plan = {
            let conn = lock(&state.db)?;
            plan_sync(&conn, &request.item_id, request.credential_id)?
        };
        let client = PluggyClient::from_settings(&state.settings, &plan.credential)?;
        let fetched = fetch_item(&client, &request.item_id)?;
        let mut conn = lock(&state.db)?;
        store_item(&mut conn, &fetched, plan.saved.as_ref())
    })
    .await
    .map_err(|e| FinboardError::Other(format!("worker task failed: {e}")))??;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct CategoryRequest {
    category: String,
}

async fn set_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<CategoryRequest>, JsonRejection>,
) -> AppResult<Transaction> {
    let request = body(payload)?;
    let update = with_db(&state, move |conn, _| reviewer::set_category(conn, id, &request.category)).await?;
    Ok(Json(update.transaction))
}

#[derive(Debug, Default, Deserialize)]
struct ClearParams {
    #[serde(default)]
    confirm: bool,
}

async fn clear_transactions(
    State(state): State<AppState>,
    params: std::result::Result<Query<ClearParams>, QueryRejection>,
) -> AppResult<Value> {
    let Query(params) = params.map_err(|e| FinboardError::Validation(e.body_text()))?;
    if !params.confirm {
        return Err(FinboardError::Validation(
            "refusing to delete all transactions without confirm=true".to_string(),
        ));
    }
    let deleted = with_db(&state, |conn, _| reviewer::clear_transactions(conn)).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

async fn list_rules(State(state): State<AppState>) -> AppResult<Vec<Rule>> {
    Ok(Json(with_db(&state, |conn, _| load_rules(conn)).await?))
}

#[derive(Debug, Deserialize)]
struct RuleRequest {
    keyword: String,
    category: String,
}

async fn save_rule(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RuleRequest>, JsonRejection>,
) -> AppResult<Vec<Rule>> {
    let request = body(payload)?;
    if request.keyword.trim().is_empty() || request.category.trim().is_empty() {
        return Err(FinboardError::Validation("keyword and category are required".to_string()));
    }
    let rules = with_db(&state, move |conn, _| {
        upsert_rule(conn, &request.keyword, request.category.trim())?;
        load_rules(conn)
    })
    .await?;
    Ok(Json(rules))
}

async fn remove_rule(State(state): State<AppState>, Path(keyword): Path<String>) -> AppResult<Value> {
    let removed = with_db(&state, move |conn, _| delete_rule(conn, &keyword)).await?;
    if !removed {
        return Err(FinboardError::NotFound("rule".to_string()));
    }
    Ok(Json(json!({ "deleted": true })))
}

async fn list_credentials(State(state): State<AppState>) -> AppResult<Vec<Credential>> {
    Ok(Json(with_db(&state, |conn, _| connections::list_credentials(conn)).await?))
}

async fn create_credential(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialInput>, JsonRejection>,
) -> AppResult<Credential> {
    let input = body(payload)?;
    Ok(Json(with_db(&state, move |conn, _| connections::create_credential(conn, &input)).await?))
}

async fn update_credential(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<CredentialInput>, JsonRejection>,
) -> AppResult<Credential> {
    let input = body(payload)?;
    Ok(Json(with_db(&state, move |conn, _| connections::update_credential(conn, id, &input)).await?))
}

async fn delete_credential(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Value> {
    with_db(&state, move |conn, _| connections::delete_credential(conn, id)).await?;
    Ok(Json(json!({ "deleted": true })))
}

async fn list_items(State(state): State<AppState>) -> AppResult<Vec<SavedItem>> {
    Ok(Json(with_db(&state, |conn, _| connections::list_items(conn)).await?))
}

async fn create_item(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SavedItemInput>, JsonRejection>,
) -> AppResult<SavedItem> {
    let input = body(payload)?;
    Ok(Json(with_db(&state, move |conn, _| connections::create_item(conn, &input)).await?))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<SavedItemInput>, JsonRejection>,
) -> AppResult<SavedItem> {
    let input = body(payload)?;
    Ok(Json(with_db(&state, move |conn, _| connections::update_item(conn, id, &input)).await?))
}

async fn delete_item(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Value> {
    with_db(&state, move |conn, _| connections::delete_item(conn, id)).await?;
    Ok(Json(json!({ "deleted": true })))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/dashboard", get(dashboard))
        .route("/periods", get(periods))
        .route("/pluggy/sync", post(pluggy_sync))
        .route("/transactions", delete(clear_transactions))
        .route("/transactions/:id/category", put(set_category))
        .route("/rules", get(list_rules).post(save_rule))
        .route("/rules/:keyword", delete(remove_rule))
        .route("/credentials", get(list_credentials).post(create_credential))
        .route("/credentials/:id", put(update_credential).delete(delete_credential))
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", put(update_item).delete(delete_item))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}

/// Serve the HTTP API until interrupted. The store handle lives as long as
/// the server does.
pub async fn serve(conn: Connection, settings: Settings) -> Result<()> {
    let addr = settings.listen_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router(AppState::new(conn, settings)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
