//! HTTP layer: HTML pages, the JSON endpoints behind the dashboard, and
//! the admin console.

pub mod admin;
pub mod api;
pub mod pages;
pub mod views;

use std::sync::Arc;

use askama::Template;
use axum::extract::{FromRequest, Request};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::DatabaseError;
use crate::store::{Database, LibSqlBackend};
use views::{ErrorView, NotFoundView};

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, config: ServerConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Build the full application router.
pub fn app_routes(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    Router::new()
        .merge(pages::routes())
        .merge(api::routes())
        .merge(admin::routes())
        .route("/health", get(health))
        .nest_service("/static", static_files)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the database and serve until the listener fails.
pub async fn serve(config: ServerConfig) -> crate::error::Result<()> {
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_local(&config.db_path).await?);
    let addr = config.bind_addr();
    let state = AppState::new(db, config);

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Work hours server listening");
    axum::serve(listener, app_routes(state)).await?;
    Ok(())
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": "work-hours"}))
}

async fn not_found() -> AppError {
    AppError::NotFound
}

// ── Errors ──────────────────────────────────────────────────────────

/// Handler failure, rendered as an HTML error page.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Page not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound | AppError::Database(DatabaseError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, render_template(NotFoundView)).into_response()
            }
            AppError::Database(e) => {
                error!(error = %e, "Request failed");
                let view = ErrorView {
                    message: "Something went wrong while handling your request.".to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, render_template(view)).into_response()
            }
        }
    }
}

/// Parse a numeric path id; anything else is a missing page.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}

/// Render a template, logging and reporting failures as a 500.
pub fn render_template<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Template rendering error").into_response()
        }
    }
}

// ── Notices ─────────────────────────────────────────────────────────

/// One-shot success message shown after a redirect.
///
/// Travels as `?notice=<key>` on the redirect target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    JobCreated,
    JobUpdated,
    JobDeleted,
    JobBoxCreated,
    JobBoxUpdated,
    JobBoxDeleted,
}

impl Notice {
    const ALL: [Notice; 6] = [
        Notice::JobCreated,
        Notice::JobUpdated,
        Notice::JobDeleted,
        Notice::JobBoxCreated,
        Notice::JobBoxUpdated,
        Notice::JobBoxDeleted,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Notice::JobCreated => "job_created",
            Notice::JobUpdated => "job_updated",
            Notice::JobDeleted => "job_deleted",
            Notice::JobBoxCreated => "package_created",
            Notice::JobBoxUpdated => "package_updated",
            Notice::JobBoxDeleted => "package_deleted",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Notice::JobCreated => "Job created successfully!",
            Notice::JobUpdated => "Job updated successfully!",
            Notice::JobDeleted => "Job deleted successfully!",
            Notice::JobBoxCreated => "Job package created successfully!",
            Notice::JobBoxUpdated => "Job package updated successfully!",
            Notice::JobBoxDeleted => "Job package deleted successfully!",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.key() == key)
    }

    /// Message for an optional `notice` query value; unknown keys show nothing.
    pub fn message_for(key: Option<&str>) -> Option<String> {
        key.and_then(Self::from_key).map(|n| n.message().to_string())
    }

    /// 303 redirect to `path` carrying this notice.
    pub fn redirect(self, path: &str) -> Redirect {
        Redirect::to(&format!("{path}?notice={}", self.key()))
    }
}

// ── Extractors ──────────────────────────────────────────────────────

/// Request body decoded from either a urlencoded form or JSON, chosen by
/// `Content-Type`.
pub struct FormOrJson<T>(pub T);

impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::routing::post;
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn notice_keys_round_trip() {
        for notice in Notice::ALL {
            assert_eq!(Notice::from_key(notice.key()), Some(notice));
        }
        assert_eq!(Notice::from_key("bogus"), None);
        assert_eq!(
            Notice::message_for(Some("job_created")).as_deref(),
            Some("Job created successfully!")
        );
        assert_eq!(Notice::message_for(None), None);
    }

    #[test]
    fn non_numeric_ids_are_not_found() {
        assert_eq!(parse_id("42").ok(), Some(42));
        assert!(matches!(parse_id("abc"), Err(AppError::NotFound)));
        assert!(matches!(parse_id(""), Err(AppError::NotFound)));
    }

    #[derive(Deserialize)]
    struct Echo {
        title: String,
    }

    async fn echo(FormOrJson(body): FormOrJson<Echo>) -> String {
        body.title
    }

    async fn send(content_type: &str, body: &'static str) -> (StatusCode, String) {
        let app: Router = Router::new().route("/", post(echo));
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn form_or_json_accepts_both_encodings() {
        let (status, body) = send("application/x-www-form-urlencoded", "title=Write+report").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Write report");

        let (status, body) = send("application/json", r#"{"title": "Write report"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Write report");
    }

    #[tokio::test]
    async fn app_error_statuses() {
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        let missing = AppError::Database(DatabaseError::NotFound {
            entity: "job".into(),
            id: 1,
        });
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
        let broken = AppError::Database(DatabaseError::Query("boom".into()));
        assert_eq!(
            broken.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
