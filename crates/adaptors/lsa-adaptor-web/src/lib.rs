use axum::extract::{FromRequest, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use lsa_core::{get_env_int, get_env_or, LsaError, Result, SearchHit, SemanticIndex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const INDEX_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Semantic Search</title>
  <style>
    body { font-family: system-ui, sans-serif; max-width: 760px; margin: 40px auto; padding: 0 16px; color: #1e293b; }
    form { display: flex; gap: 8px; margin-bottom: 24px; }
    input[type=text] { flex: 1; padding: 10px; border: 1px solid #cbd5e1; border-radius: 6px; }
    button { padding: 10px 18px; border: 0; border-radius: 6px; background: #0ea5e9; color: white; cursor: pointer; }
    .hit { border-bottom: 1px solid #e2e8f0; padding: 12px 0; }
    .score { color: #64748b; font-size: 12px; }
    .doc { white-space: pre-wrap; margin-top: 4px; }
    .meta { color: #64748b; font-size: 13px; }
  </style>
</head>
<body>
  <h1>Semantic Search</h1>
  <p class="meta">{DOCUMENTS} documents, {COMPONENTS} semantic dimensions</p>
  <form id="search">
    <input type="text" name="query" placeholder="Search documents" autofocus>
    <button type="submit">Search</button>
  </form>
  <div id="results"></div>
  <script>
    const form = document.getElementById('search');
    const results = document.getElementById('results');
    form.addEventListener('submit', async (ev) => {
      ev.preventDefault();
      const res = await fetch('/search', { method: 'POST', body: new URLSearchParams(new FormData(form)) });
      const data = await res.json();
      results.innerHTML = '';
      if (data.error) { results.textContent = data.error; return; }
      data.documents.forEach((doc, i) => {
        const hit = document.createElement('div');
        hit.className = 'hit';
        const score = document.createElement('div');
        score.className = 'score';
        score.textContent = '#' + data.indices[i] + '  similarity ' + data.similarities[i].toFixed(4);
        const text = document.createElement('div');
        text.className = 'doc';
        text.textContent = doc;
        hit.appendChild(score);
        hit.appendChild(text);
        results.appendChild(hit);
      });
    });
  </script>
</body>
</html>"#;

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

impl WebConfig {
    /// Read `LSA_HOST` / `LSA_PORT`, falling back to the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: get_env_or("LSA_HOST", &defaults.host),
            port: get_env_int("LSA_PORT", defaults.port),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone)]
pub struct SearchServer {
    pub config: Arc<WebConfig>,
    pub index: Arc<SemanticIndex>,
}

/// Parsed body of a `POST /search`
#[derive(Debug, Clone, PartialEq)]
pub struct SearchInput {
    pub query: String,
    pub top_k: Option<usize>,
}

impl SearchInput {
    fn from_form(fields: &HashMap<String, String>) -> Result<Self> {
        let query = fields
            .get("query")
            .cloned()
            .ok_or_else(|| LsaError::query("missing form field 'query'"))?;
        let top_k = match fields.get("top_k").map(|v| v.trim()) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<usize>()
                    .map_err(|_| LsaError::query(format!("invalid top_k '{}'", raw)))?,
            ),
        };
        Ok(Self { query, top_k })
    }

    fn from_json(body: &Value) -> Result<Self> {
        let query = match body.get("query") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(LsaError::query("field 'query' must be a string")),
            None => return Err(LsaError::query("missing field 'query'")),
        };
        let top_k = match body.get("top_k") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_u64()
                    .map(|k| k as usize)
                    .ok_or_else(|| LsaError::query("field 'top_k' must be a non-negative integer"))?,
            ),
        };
        Ok(Self { query, top_k })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub documents: Vec<String>,
    pub similarities: Vec<f64>,
    pub indices: Vec<usize>,
}

impl From<Vec<SearchHit>> for SearchResponse {
    fn from(hits: Vec<SearchHit>) -> Self {
        let mut response = SearchResponse {
            documents: Vec::with_capacity(hits.len()),
            similarities: Vec::with_capacity(hits.len()),
            indices: Vec::with_capacity(hits.len()),
        };
        for hit in hits {
            response.similarities.push(hit.rounded_score());
            response.indices.push(hit.index);
            response.documents.push(hit.document);
        }
        response
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub documents: usize,
    pub vocabulary: usize,
    pub components: usize,
}

/// Maps core errors onto HTTP statuses with a `{"error": ...}` body
struct ApiError(LsaError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LsaError::Query(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self.0 {
            LsaError::Query(msg) => msg,
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl SearchServer {
    pub fn new(config: WebConfig, index: Arc<SemanticIndex>) -> Self {
        Self {
            config: Arc::new(config),
            index,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index_page))
            .route("/search", post(search))
            .route("/health", get(health))
            .with_state(self.clone())
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until ctrl-c
    pub async fn start(&self) -> Result<()> {
        let addr = self.config.address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("Semantic search listening on http://{}", addr);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received");
            })
            .await?;
        Ok(())
    }
}

async fn index_page(State(state): State<SearchServer>) -> Html<String> {
    let stats = state.index.stats();
    Html(
        INDEX_TEMPLATE
            .replace("{DOCUMENTS}", &stats.documents.to_string())
            .replace("{COMPONENTS}", &stats.components.to_string()),
    )
}

async fn health(State(state): State<SearchServer>) -> Json<HealthResponse> {
    let stats = state.index.stats();
    Json(HealthResponse {
        status: "ok".into(),
        documents: stats.documents,
        vocabulary: stats.vocabulary_size,
        components: stats.components,
    })
}

async fn search(State(state): State<SearchServer>, request: Request) -> Response {
    let input = match read_search_input(request).await {
        Ok(input) => input,
        Err(e) => {
            warn!("Rejected search request: {}", e);
            return ApiError(e).into_response();
        }
    };

    let top_k = input.top_k.unwrap_or(state.index.config().top_k);
    let index = state.index.clone();
    let query = input.query;
    let outcome = tokio::task::spawn_blocking(move || index.search(&query, top_k)).await;

    match outcome {
        Ok(result) => search_response(result),
        Err(e) => {
            error!("Search task failed: {}", e);
            ApiError(LsaError::other(e.to_string())).into_response()
        }
    }
}

/// Turn a search result into the HTTP response
///
/// A dimension mismatch is an internal invariant break: it asserts in debug
/// builds and answers with an empty result set otherwise.
fn search_response(result: Result<Vec<SearchHit>>) -> Response {
    match result {
        Ok(hits) => Json(SearchResponse::from(hits)).into_response(),
        Err(e) if e.is_dimension() => {
            error!("Dimension mismatch while serving a query: {}", e);
            debug_assert!(!e.is_dimension(), "dimension mismatch while serving: {}", e);
            Json(SearchResponse::from(Vec::new())).into_response()
        }
        Err(e) => {
            error!("Search failed: {}", e);
            ApiError(e).into_response()
        }
    }
}

/// Accept a url-encoded form, or a JSON object when the content type says so
async fn read_search_input(request: Request) -> Result<SearchInput> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        let Json(body) = Json::<Value>::from_request(request, &())
            .await
            .map_err(|e| LsaError::query(e.body_text()))?;
        SearchInput::from_json(&body)
    } else {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(|e| LsaError::query(e.body_text()))?;
        SearchInput::from_form(&fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use lsa_core::testing::{sample_corpus, sample_stopwords};
    use lsa_core::SearchConfig;
    use tower::ServiceExt;

    fn server() -> SearchServer {
        let config = SearchConfig::default().with_components(3).with_top_k(2);
        let index = SemanticIndex::build(sample_corpus(), sample_stopwords(), &config).unwrap();
        SearchServer::new(WebConfig::default(), Arc::new(index))
    }

    async fn send(request: axum::http::Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = server().router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn form_request(body: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri("/search")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_request(body: Value) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri("/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn web_config_defaults() {
        let config = WebConfig::default();
        assert_eq!(config.address(), "127.0.0.1:5000");
    }

    #[tokio::test]
    async fn serves_index_page() {
        let request = axum::http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("Semantic Search"));
        assert!(html.contains("3 documents"));
    }

    #[tokio::test]
    async fn health_reports_index_shape() {
        let request = axum::http::Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.documents, 3);
        assert_eq!(health.vocabulary, 8);
        assert_eq!(health.components, 3);
    }

    #[tokio::test]
    async fn form_search_returns_ranked_documents() {
        let (status, body) = send(form_request("query=loyal")).await;
        assert_eq!(status, StatusCode::OK);
        let result: SearchResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(result.indices.len(), 2);
        assert_eq!(result.indices[0], 1);
        assert_eq!(result.documents[0], "dogs are loyal animals");
        assert_eq!(result.similarities.len(), 2);
        assert!(result.similarities[0] >= result.similarities[1]);
    }

    #[tokio::test]
    async fn json_search_honours_top_k() {
        let (status, body) = send(json_request(serde_json::json!({"query": "dogs", "top_k": 3}))).await;
        assert_eq!(status, StatusCode::OK);
        let result: SearchResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(result.indices.len(), 3);
    }

    #[tokio::test]
    async fn similarities_are_rounded() {
        let (_, body) = send(form_request("query=cats+dogs&top_k=3")).await;
        let result: SearchResponse = serde_json::from_slice(&body).unwrap();
        for s in result.similarities {
            assert_eq!(s, (s * 10_000.0).round() / 10_000.0);
        }
    }

    #[tokio::test]
    async fn missing_query_is_bad_request() {
        let (status, body) = send(form_request("top_k=2")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert!(error["error"].as_str().unwrap().contains("query"));

        let (status, _) = send(json_request(serde_json::json!({"query": 7}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_top_k_is_bad_request() {
        let (status, _) = send(form_request("query=dogs&top_k=many")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_query_returns_empty_result() {
        let (status, body) = send(form_request("query=")).await;
        assert_eq!(status, StatusCode::OK);
        let result: SearchResponse = serde_json::from_slice(&body).unwrap();
        assert!(result.documents.is_empty());
        assert!(result.similarities.is_empty());
        assert!(result.indices.is_empty());
    }

    async fn response_parts(response: Response) -> (StatusCode, Vec<u8>) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn search_response_wraps_hits() {
        let hits = vec![SearchHit {
            index: 4,
            score: 0.987_654,
            document: "orbital mechanics".into(),
        }];
        let (status, body) = response_parts(search_response(Ok(hits))).await;
        assert_eq!(status, StatusCode::OK);
        let result: SearchResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(result.indices, vec![4]);
        assert_eq!(result.similarities, vec![0.9877]);
    }

    #[cfg(not(debug_assertions))]
    #[tokio::test]
    async fn dimension_error_yields_empty_result() {
        let err = LsaError::dimension("query vector", 3, 2);
        let (status, body) = response_parts(search_response(Err(err))).await;
        assert_eq!(status, StatusCode::OK);
        let result: SearchResponse = serde_json::from_slice(&body).unwrap();
        assert!(result.documents.is_empty());
        assert!(result.similarities.is_empty());
        assert!(result.indices.is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "dimension mismatch while serving")]
    fn dimension_error_asserts_in_debug_builds() {
        let err = LsaError::dimension("query vector", 3, 2);
        let _ = search_response(Err(err));
    }

    #[tokio::test]
    async fn configuration_error_is_internal_error() {
        let err = LsaError::config("vectorizer must be fitted before transform");
        let (status, body) = response_parts(search_response(Err(err))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert!(error["error"].as_str().unwrap().contains("fitted before transform"));
    }

    #[test]
    fn search_input_from_form() {
        let mut fields = HashMap::new();
        fields.insert("query".to_string(), "cats".to_string());
        fields.insert("top_k".to_string(), " 4 ".to_string());
        assert_eq!(
            SearchInput::from_form(&fields).unwrap(),
            SearchInput {
                query: "cats".into(),
                top_k: Some(4)
            }
        );
    }
}
