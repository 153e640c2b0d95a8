use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use repogate_common::HealthVerdict;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use tracing::error;

use crate::config::AppConfig;
use crate::errors::{DocError, RepoPathError, ServiceError};
use crate::repo::{RepositoryService, RestoreOutcome};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub service: RepositoryService,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let service = RepositoryService::with_app_data(config.allowed_roots(), &config.app_data_root);
        Self { service, config }
    }
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

/// Body of validate / persist / remove / restore / status.
///
/// Fields that are absent or not strings deserialize as `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoRequest {
    #[serde(default, deserialize_with = "string_or_none")]
    pub repo_path: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocRequest {
    #[serde(default, deserialize_with = "string_or_none")]
    pub repo_path: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub relative_path: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

/// Malformed or empty bodies read as the all-`None` request.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

fn required(value: Option<&str>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::BadRequest(format!("{field} is required"))),
    }
}

#[derive(Debug, Serialize)]
pub struct RootsResponse {
    pub roots: Vec<PathBuf>,
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Path(RepoPathError),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    /// Map a façade error; storage failures become "Unable to {op} repository".
    fn from_service(op: &'static str) -> impl FnOnce(ServiceError) -> ApiError {
        move |err| match err {
            ServiceError::Path(e) => ApiError::Path(e),
            ServiceError::Store(e) => {
                error!(error = %e, op, "repository state write failed");
                ApiError::Internal(format!("Unable to {op} repository"))
            }
        }
    }
}

impl From<DocError> for ApiError {
    fn from(err: DocError) -> Self {
        match err {
            DocError::Path(e) => ApiError::Path(e),
            other => ApiError::NotFound(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Path(e) => {
                let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
                (
                    status,
                    Json(serde_json::json!({"error": e.to_string(), "code": e.code()})),
                )
                    .into_response()
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": msg}))).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": msg}))).into_response()
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": msg})),
            )
                .into_response(),
        }
    }
}

fn verdict_status(verdict: &HealthVerdict) -> StatusCode {
    if verdict.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/repo/validate", post(validate_repo))
        .route("/api/repo/persist", post(persist_repo))
        .route("/api/repo/restore", post(restore_repo))
        .route("/api/repo/remove", post(remove_repo))
        .route("/api/repo/list", get(list_repos))
        .route("/api/repo/doc", post(read_doc))
        .route("/api/repo/status", post(read_status))
        .route("/api/roots", get(list_roots))
        .route("/api/roots/refresh", post(refresh_roots))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn validate_repo(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: RepoRequest = parse_body(&body);
    let repo_path = required(req.repo_path.as_deref(), "repoPath")?;
    let verdict = state
        .service
        .validate(&repo_path, req.display_name)
        .await
        .map_err(ApiError::from_service("validate"))?;
    Ok((verdict_status(&verdict), Json(verdict)))
}

async fn persist_repo(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: RepoRequest = parse_body(&body);
    let repo_path = required(req.repo_path.as_deref(), "repoPath")?;
    let outcome = state
        .service
        .persist(&repo_path, req.display_name)
        .await
        .map_err(ApiError::from_service("persist"))?;
    Ok((verdict_status(&outcome.verdict), Json(outcome)))
}

async fn restore_repo(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: RepoRequest = parse_body(&body);
    let outcome = state
        .service
        .restore(req.repo_path.as_deref())
        .await
        .map_err(ApiError::from_service("restore"))?;
    let status = match &outcome {
        RestoreOutcome::Reconciled(o) => verdict_status(&o.verdict),
        RestoreOutcome::NothingToRestore(_) => StatusCode::NOT_FOUND,
    };
    Ok((status, Json(outcome)))
}

async fn remove_repo(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: RepoRequest = parse_body(&body);
    let repo_path = required(req.repo_path.as_deref(), "repoPath")?;
    let outcome = state
        .service
        .remove(&repo_path)
        .await
        .map_err(ApiError::from_service("remove"))?;
    Ok(Json(outcome))
}

async fn list_repos(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.service.repository_list().await)
}

async fn read_doc(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: DocRequest = parse_body(&body);
    let repo_path = required(req.repo_path.as_deref(), "repoPath")?;
    let relative = req.relative_path.unwrap_or_default();
    let doc = state.service.read_doc(&repo_path, &relative).await?;
    Ok(Json(doc))
}

async fn read_status(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: RepoRequest = parse_body(&body);
    let repo_path = required(req.repo_path.as_deref(), "repoPath")?;
    let doc = state.service.read_status(&repo_path).await?;
    Ok(Json(doc))
}

async fn list_roots(State(state): State<SharedState>) -> Json<RootsResponse> {
    Json(RootsResponse {
        roots: state.service.allowed_roots(),
    })
}

async fn refresh_roots(State(state): State<SharedState>) -> Json<RootsResponse> {
    state.service.refresh_roots(state.config.refreshed_roots());
    Json(RootsResponse {
        roots: state.service.allowed_roots(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliOverrides;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestApp {
        _allowed: TempDir,
        _data: TempDir,
        root: PathBuf,
        state: SharedState,
    }

    impl TestApp {
        fn router(&self) -> Router {
            api_router().with_state(self.state.clone())
        }
    }

    fn test_app() -> TestApp {
        let allowed = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        let cli = CliOverrides {
            app_data_dir: Some(data.path().to_path_buf()),
            allow: vec![allowed.path().to_path_buf()],
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, |_| None).unwrap();
        TestApp {
            root: allowed.path().canonicalize().unwrap(),
            state: Arc::new(AppState::new(config)),
            _allowed: allowed,
            _data: data,
        }
    }

    fn valid_repo(root: &Path, name: &str) -> String {
        let repo = root.join(name);
        let config = repo.join(".bmad/bmm/config.yaml");
        fs::create_dir_all(config.parent().unwrap()).unwrap();
        fs::write(&config, "output_folder: '{project-root}/devDocs'\n").unwrap();
        fs::create_dir_all(repo.join("devDocs")).unwrap();
        repo.to_string_lossy().to_string()
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app();
        let response = app.router().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_validate_healthy_repo() {
        let app = test_app();
        let repo = valid_repo(&app.root, "repo");

        let response = app
            .router()
            .oneshot(post("/api/repo/validate", serde_json::json!({"repoPath": repo})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["repoPath"], repo.as_str());
        assert!(json.get("state").is_none());
        assert!(app.state.service.state().await.active.is_none());
    }

    #[tokio::test]
    async fn test_validate_unhealthy_repo_is_422() {
        let app = test_app();
        let repo = app.root.join("empty");
        fs::create_dir_all(&repo).unwrap();

        let response = app
            .router()
            .oneshot(post(
                "/api/repo/validate",
                serde_json::json!({"repoPath": repo.to_string_lossy()}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["missing"][0], "bmm/config.yaml");
    }

    #[tokio::test]
    async fn test_missing_repo_path_is_400() {
        let app = test_app();
        for body in [
            serde_json::json!({}),
            serde_json::json!({"repoPath": ""}),
            serde_json::json!({"repoPath": 42}),
        ] {
            let response = app
                .router()
                .oneshot(post("/api/repo/persist", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = body_json(response).await;
            assert_eq!(json["error"], "repoPath is required");
            assert!(json.get("code").is_none());
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let app = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/repo/remove")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_persist_forbidden_path_is_403_with_code() {
        let app = test_app();
        let outside = TempDir::new().unwrap();

        let response = app
            .router()
            .oneshot(post(
                "/api/repo/persist",
                serde_json::json!({"repoPath": outside.path().to_string_lossy()}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let json = body_json(response).await;
        assert_eq!(json["code"], "FORBIDDEN_REPO_PATH");
        assert!(!app.state.config.app_data_root.join("repository-state.json").exists());
    }

    #[tokio::test]
    async fn test_persist_healthy_returns_state() {
        let app = test_app();
        let repo = valid_repo(&app.root, "repo");

        let response = app
            .router()
            .oneshot(post(
                "/api/repo/persist",
                serde_json::json!({"repoPath": repo, "displayName": "Mine"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["displayName"], "Mine");
        assert_eq!(json["state"]["active"]["repoPath"], repo.as_str());
        assert_eq!(json["state"]["recent"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persist_unhealthy_is_422_and_clears() {
        let app = test_app();
        let repo = valid_repo(&app.root, "repo");
        app.state.service.persist(&repo, None).await.unwrap();
        fs::remove_dir_all(PathBuf::from(&repo).join("devDocs")).unwrap();

        let response = app
            .router()
            .oneshot(post("/api/repo/persist", serde_json::json!({"repoPath": repo})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        assert!(json["state"]["active"].is_null());
        assert!(json["state"]["recent"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_nothing_is_404() {
        let app = test_app();
        let response = app
            .router()
            .oneshot(post("/api/repo/restore", serde_json::json!({"repoPath": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["message"], "No repo to restore");
        assert!(json["state"].is_object());
    }

    #[tokio::test]
    async fn test_restore_active_repo() {
        let app = test_app();
        let repo = valid_repo(&app.root, "repo");
        app.state.service.persist(&repo, Some("Named".into())).await.unwrap();

        let response = app
            .router()
            .oneshot(post("/api/repo/restore", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert!(json.get("displayName").is_none());
        assert!(json["state"]["active"].get("displayName").is_none());
    }

    #[tokio::test]
    async fn test_remove_then_list() {
        let app = test_app();
        let one = valid_repo(&app.root, "one");
        let two = valid_repo(&app.root, "two");
        app.state.service.persist(&one, Some("  First  ".into())).await.unwrap();
        app.state.service.persist(&two, None).await.unwrap();

        let response = app.router().oneshot(get("/api/repo/list")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let list = body_json(response).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["path"], two.as_str());
        assert_eq!(list[0]["name"], "two");
        assert_eq!(list[1]["name"], "First");

        let response = app
            .router()
            .oneshot(post("/api/repo/remove", serde_json::json!({"repoPath": two})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["state"]["active"].is_null());
        assert_eq!(json["state"]["recent"][0]["repoPath"], one.as_str());
    }

    #[tokio::test]
    async fn test_read_doc_and_status() {
        let app = test_app();
        let repo = valid_repo(&app.root, "repo");
        fs::write(PathBuf::from(&repo).join("devDocs/prd.md"), "# PRD").unwrap();

        let response = app
            .router()
            .oneshot(post(
                "/api/repo/doc",
                serde_json::json!({"repoPath": repo, "relativePath": "devDocs/prd.md"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["content"], "# PRD");
        assert!(json["updatedAt"].is_string());

        let response = app
            .router()
            .oneshot(post(
                "/api/repo/doc",
                serde_json::json!({"repoPath": repo, "relativePath": "../etc/passwd"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .router()
            .oneshot(post("/api/repo/status", serde_json::json!({"repoPath": repo})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_roots_listing_and_refresh() {
        let app = test_app();
        let root = app.root.to_string_lossy().to_string();

        let response = app.router().oneshot(get("/api/roots")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let roots = json["roots"].as_array().unwrap();
        assert!(roots.iter().any(|r| r.as_str() == Some(root.as_str())));

        let response = app
            .router()
            .oneshot(post("/api/roots/refresh", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let roots = json["roots"].as_array().unwrap();
        assert!(roots.iter().any(|r| r.as_str() == Some(root.as_str())));
    }
}
