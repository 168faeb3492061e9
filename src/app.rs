use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::agents;
use crate::auth;
use crate::backend::BackendClient;
use crate::chat::{self, ChatLog, ChatMessage};
use crate::config::AppConfig;
use crate::export;
use crate::graph;
use crate::prompts;
use crate::report::{ExportJob, ExportStatus, ReportExporter};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Shared state behind every handler
pub struct AppState {
    pub config: AppConfig,
    pub backend: BackendClient,
    pub exporter: Arc<ReportExporter>,
    pub chat: Mutex<ChatLog>,
    /// Whether the export dialog is showing; cleared by the close callback
    pub export_dialog_open: AtomicBool,
}

#[derive(Deserialize)]
struct ScopeQuery {
    scope: Option<String>,
}

#[derive(Deserialize)]
struct PromptQuery {
    f: Option<String>,
    n: Option<u32>,
}

#[derive(Deserialize)]
struct ChatRequest {
    query: String,
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    status: String,
    message: Option<String>,
}

#[derive(Serialize)]
struct TableBody {
    columns: Vec<String>,
    rows: Vec<export::TableRow>,
}

#[derive(Serialize)]
struct ReportStatusBody {
    status: ExportStatus,
    dialog_open: bool,
}

/// Start the web application
///
/// Builds the router, binds the configured address, and serves until the
/// process is stopped.
///
/// # Arguments
/// * `config` - Runtime configuration (address, backend URL, OAuth details)
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Fatal startup errors only
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backend = BackendClient::new(&config.backend_url)?;
    let bind_addr = config.bind_addr.clone();

    let state = Arc::new(AppState {
        config,
        backend,
        exporter: Arc::new(ReportExporter::new()),
        chat: Mutex::new(ChatLog::new()),
        export_dialog_open: AtomicBool::new(false),
    });

    let app = router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_landing))
        .route("/search", get(serve_search))
        .route("/table", get(serve_table))
        .route("/api/agents", get(list_agents))
        .route("/api/prompts", get(get_prompts))
        .route("/api/chat/send", post(chat_send))
        .route("/api/table", get(get_table))
        .route("/api/table/export", get(export_table))
        .route("/api/table/graph", get(table_graph))
        .route("/api/report/export", post(report_export))
        .route("/api/report/status", get(report_status))
        .route("/api/report/cancel", post(report_cancel))
        .route("/auth/signin", get(sign_in))
        .route("/auth/callback", get(auth_callback))
        .route("/auth/signout", get(sign_out))
        .nest_service("/static", ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("./static/landing.html"))
}

async fn serve_search() -> Html<&'static str> {
    Html(include_str!("./static/search.html"))
}

/// Table demo page with the dataset rendered server-side
async fn serve_table() -> Html<String> {
    let rows = export::demo_rows();
    let columns = export::demo_columns();
    let table = export::render_table_html(&rows, &columns);

    Html(include_str!("./static/table.html").replace("<!-- TABLE -->", &table))
}

/// List the agents available in a scope, normalized to plain names
///
/// Fetch failures degrade to an empty list; the dialog just shows no
/// options.
async fn list_agents(
    Query(params): Query<ScopeQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<String>> {
    let scope = params
        .scope
        .unwrap_or_else(|| state.config.default_scope.clone());

    match state.backend.list_agents(&scope).await {
        Ok(raw) => Json(agents::normalize(&raw)),
        Err(e) => {
            log::error!("agent list for scope '{}' failed: {}", scope, e);
            Json(Vec::new())
        }
    }
}

async fn get_prompts(
    Query(params): Query<PromptQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<String>> {
    let file_name = params.f.unwrap_or_default();
    let lines = prompts::fetch_document_prompts(&state.backend, &file_name, params.n).await;
    Json(lines)
}

async fn chat_send(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<Vec<ChatMessage>> {
    let messages = chat::send_message(&state.backend, &state.chat, &request.query).await;
    Json(messages)
}

async fn get_table() -> Json<TableBody> {
    Json(TableBody {
        columns: export::demo_columns(),
        rows: export::demo_rows(),
    })
}

/// Serialize the demo table and hand it back as a download
async fn export_table() -> Response {
    let rows = export::demo_rows();
    let columns = export::demo_columns();

    let bytes = export::build_workbook(&rows, &columns).and_then(export::workbook_to_bytes);
    match bytes {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, XLSX_MIME.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", export::EXPORT_FILE_NAME),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                status: "error".to_string(),
                message: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

/// Render the age-count histogram for the demo table
async fn table_graph() -> Response {
    let rows = export::demo_rows();

    match graph::age_histogram_png(&rows) {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                status: "error".to_string(),
                message: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

/// Run one report export; a second trigger while one is in flight gets a 409
async fn report_export(
    State(state): State<Arc<AppState>>,
    Json(job): Json<ExportJob>,
) -> Response {
    state.export_dialog_open.store(true, Ordering::SeqCst);

    let on_close_state = Arc::clone(&state);
    let exporter = Arc::clone(&state.exporter);
    let result = exporter
        .export_report(&state.backend, job, move || {
            on_close_state
                .export_dialog_open
                .store(false, Ordering::SeqCst);
            log::info!("export dialog closed after successful export");
        })
        .await;

    match result {
        Ok(status) => Json(status).into_response(),
        Err(message) => (
            StatusCode::CONFLICT,
            Json(ErrorBody {
                status: "busy".to_string(),
                message: Some(message),
            }),
        )
            .into_response(),
    }
}

async fn report_status(State(state): State<Arc<AppState>>) -> Json<ReportStatusBody> {
    Json(ReportStatusBody {
        status: state.exporter.status(),
        dialog_open: state.export_dialog_open.load(Ordering::SeqCst),
    })
}

/// Dismiss the export dialog; a completion still in flight becomes a no-op
async fn report_cancel(State(state): State<Arc<AppState>>) -> Json<ReportStatusBody> {
    state.exporter.cancel();
    state.export_dialog_open.store(false, Ordering::SeqCst);

    Json(ReportStatusBody {
        status: state.exporter.status(),
        dialog_open: false,
    })
}

/// Hand the user off to the identity provider
async fn sign_in(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::to(&auth::authorize_url(&state.config))
}

/// Provider callback: record the session and continue to the search page
///
/// The code-for-token exchange belongs to the provider integration; the
/// session here only marks that a callback completed.
async fn auth_callback(
    Query(params): Query<CallbackQuery>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    match params.code {
        Some(code) if !code.is_empty() => {
            let session_id = auth::create_session(&code);
            let cookie = Cookie::build((auth::SESSION_COOKIE, session_id))
                .path("/")
                .http_only(true)
                .build();
            (jar.add(cookie), Redirect::to("/search"))
        }
        _ => {
            log::warn!("auth callback without a code; returning to sign-in");
            (jar, Redirect::to("/"))
        }
    }
}

async fn sign_out(jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(auth::SESSION_COOKIE) {
        auth::destroy_session(cookie.value());
    }

    (
        jar.remove(Cookie::from(auth::SESSION_COOKIE)),
        Redirect::to("/"),
    )
}
