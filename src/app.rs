use anyhow::Context;
use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::page::{Notice, PageOptions, PageRenderer};
use crate::record::{ADD_FAILED_MESSAGE, AppendOutcome, PersonnelForm};
use crate::session::SessionStore;
use crate::sheets::SheetsClient;
use crate::state::{Dashboard, DashboardState};
use crate::view::filter_by_search;

pub struct AppState {
    config: AppConfig,
    client: SheetsClient,
    sessions: SessionStore,
    renderer: PageRenderer,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let client = SheetsClient::new(&config.endpoint, config.request_timeout)
            .context("building HTTP client")?;
        let renderer = PageRenderer::new().context("compiling dashboard template")?;

        Ok(AppState {
            config,
            client,
            sessions: SessionStore::new(),
            renderer,
        })
    }
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Serialize)]
struct ApiError {
    status: String,
    message: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/", get(serve_dashboard))
        .route("/search", get(search_personnel))
        .route("/division/:name", get(select_division))
        .route("/personnel", post(add_personnel))
        .route("/api/personnel", get(get_personnel))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    log::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// Page load: the division list starts with nothing selected.
async fn serve_dashboard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Response) {
    let (jar, dashboard) = state.sessions.resolve(jar);
    dashboard.clear_division();
    let view = refresh(&state, &dashboard).await;
    (jar, render_page(&state, &view, StatusCode::OK, None, None))
}

async fn select_division(
    Path(division): Path<String>,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Response) {
    let (jar, dashboard) = state.sessions.resolve(jar);
    dashboard.select_division(&division);
    let view = refresh(&state, &dashboard).await;
    (jar, render_page(&state, &view, StatusCode::OK, None, None))
}

async fn search_personnel(
    Query(params): Query<SearchQuery>,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Response) {
    let (jar, dashboard) = state.sessions.resolve(jar);
    let term = params.q.unwrap_or_default();
    let token = dashboard.begin();

    let commit = match state.client.fetch_rows(&state.config.sheet).await {
        Ok(records) => {
            let matches = filter_by_search(&records, &term);
            dashboard.commit_search(token, &term, matches)
        }
        Err(e) => dashboard.commit_failure(token, &e.to_string()),
    };

    (
        jar,
        render_page(&state, &commit.view, StatusCode::OK, None, None),
    )
}

async fn add_personnel(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<PersonnelForm>,
) -> (CookieJar, Response) {
    let (jar, dashboard) = state.sessions.resolve(jar);

    // Incomplete forms never reach the sheet.
    let entry = match form.validate() {
        Ok(entry) => entry,
        Err(e) => {
            let notice = Notice::error(e.to_string());
            let response = render_page(
                &state,
                &dashboard.snapshot(),
                StatusCode::BAD_REQUEST,
                Some(&notice),
                Some(&form),
            );
            return (jar, response);
        }
    };

    let response = match state
        .client
        .append_row(&state.config.sheet, &entry.fields())
        .await
    {
        Ok(AppendOutcome::Added) => {
            log::info!("Added {} to {}", entry.name, state.config.sheet);
            let notice = Notice::success(AppendOutcome::Added.to_string());
            let view = refresh(&state, &dashboard).await;
            render_page(&state, &view, StatusCode::OK, Some(&notice), None)
        }
        Ok(rejected) => {
            let notice = Notice::error(rejected.to_string());
            render_page(
                &state,
                &dashboard.snapshot(),
                StatusCode::UNPROCESSABLE_ENTITY,
                Some(&notice),
                Some(&form),
            )
        }
        Err(e) => {
            log::error!("Error adding personnel: {}", e);
            let notice = Notice::error(ADD_FAILED_MESSAGE);
            render_page(
                &state,
                &dashboard.snapshot(),
                StatusCode::BAD_GATEWAY,
                Some(&notice),
                Some(&form),
            )
        }
    };

    (jar, response)
}

async fn get_personnel(
    Query(params): Query<SearchQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.client.fetch_rows(&state.config.sheet).await {
        Ok(records) => {
            let records = match params.q {
                Some(term) => filter_by_search(&records, &term),
                None => records,
            };
            Json(records).into_response()
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ApiError {
                status: "error".to_string(),
                message: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

// Fetch the whole sheet for one session and return the view it produced.
async fn refresh(state: &AppState, dashboard: &Dashboard) -> DashboardState {
    let token = dashboard.begin();
    let commit = match state.client.fetch_rows(&state.config.sheet).await {
        Ok(records) => dashboard.commit_full(token, records, state.config.division_filter),
        Err(e) => dashboard.commit_failure(token, &e.to_string()),
    };
    commit.view
}

// The add form's error paths show the session's last stored view; every other
// response shows the view its own fetch produced.
fn render_page(
    state: &AppState,
    view: &DashboardState,
    status: StatusCode,
    notice: Option<&Notice>,
    form: Option<&PersonnelForm>,
) -> Response {
    let options = PageOptions {
        divisions: &state.config.divisions,
        ranks: &state.config.ranks,
        notice,
        form,
    };

    match state.renderer.render(view, &options) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            log::error!("Failed to render dashboard: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render dashboard").into_response()
        }
    }
}
