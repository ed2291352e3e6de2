use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{State, rejection::FormRejection},
    response::Html,
    routing::{get, post},
};
use recap_core::{Analyzer, render};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeForm {
    #[serde(default)]
    pub youtube_url: Option<String>,
}

pub fn router(analyzer: Arc<Analyzer>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/index", get(index))
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { analyzer })
}

async fn home() -> Html<String> {
    Html(render::home_page())
}

async fn index() -> Html<String> {
    Html(render::index_page())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /analyze. Failures render the error page, still with 200 OK.
/// A body that is not a readable form counts as an empty URL.
async fn analyze(
    State(state): State<AppState>,
    form: Result<Form<AnalyzeForm>, FormRejection>,
) -> Html<String> {
    let request_id = Uuid::new_v4();
    let url = match form {
        Ok(Form(form)) => form.youtube_url.unwrap_or_default(),
        Err(rejection) => {
            warn!(%request_id, error = %rejection, "unreadable analyze form");
            String::new()
        }
    };

    let page = async {
        match state.analyzer.analyze(&url).await {
            Ok(analysis) => {
                info!(video_id = %analysis.video_id, language = %analysis.language, "summary rendered");
                render::result_page(&analysis)
            }
            Err(failure) => {
                warn!(kind = failure.kind(), error = %failure, "analysis failed");
                render::error_page(&failure.to_string(), failure.video_id())
            }
        }
    }
    .instrument(info_span!("analyze", %request_id))
    .await;

    Html(page)
}
