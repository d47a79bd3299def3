// File: src/client/core.rs
use crate::client::error::{ApiError, ApiResult};
use crate::client::middleware::{TokenAuthLayer, TokenAuthService};
use crate::client::source::TaskSource;
use crate::model::item::{
    ErrorResponse, ListsResponse, SpacesResponse, TasksResponse, TeamsResponse, UserResponse,
};
use crate::model::{CreatedTask, NewTask, Space, Task, TaskList, Team, User};

use async_trait::async_trait;
use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use http::{HeaderValue, Method, Request, Uri};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::set_header::{SetRequestHeader, SetRequestHeaderLayer};

pub const DEFAULT_API_URL: &str = "https://api.clickup.com/api/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_VALUE: &str = concat!("clicknote/", env!("CARGO_PKG_VERSION"));

// Hard stop for list paging in case the server never reports the last page.
const MAX_TASK_PAGES: u32 = 1000;

type HttpsClient = SetRequestHeader<
    TokenAuthService<Client<hyper_rustls::HttpsConnector<HttpConnector>, String>>,
    HeaderValue,
>;

#[derive(Clone)]
pub struct ClickUpClient {
    base: String,
    http: HttpsClient,
    timeout: Duration,
}

impl fmt::Debug for ClickUpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickUpClient")
            .field("base", &self.base)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn tls_config(require_roots: bool) -> ApiResult<rustls::ClientConfig> {
    let mut root_store = rustls::RootCertStore::empty();
    let result = rustls_native_certs::load_native_certs();
    for err in &result.errors {
        log::warn!("Skipping system certificate: {}", err);
    }
    root_store.add_parsable_certificates(result.certs);
    if root_store.is_empty() {
        if require_roots {
            return Err(ApiError::Tls("No valid system certificates found.".to_string()));
        }
        log::debug!("No system certificates found; plain HTTP only");
    }
    Ok(rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth())
}

impl ClickUpClient {
    pub fn new(api_url: &str, token: &str, timeout_secs: u64) -> ApiResult<Self> {
        let uri: Uri = api_url
            .parse()
            .map_err(|e: http::uri::InvalidUri| ApiError::InvalidUrl(e.to_string()))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(ApiError::InvalidUrl(format!(
                "'{}' is not an absolute URL",
                api_url
            )));
        }
        let is_https = uri.scheme_str() == Some("https");

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config(is_https)?)
            .https_or_http()
            .enable_http1()
            .build();

        let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
        let http = ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::overriding(
                USER_AGENT,
                HeaderValue::from_static(USER_AGENT_VALUE),
            ))
            .layer(TokenAuthLayer::new(token))
            .service(http_client);

        Ok(Self {
            base: api_url.trim_end_matches('/').to_string(),
            http,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<String>,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base, endpoint);
        let mut builder = Request::builder()
            .method(method)
            .uri(&url)
            .header(ACCEPT, "application/json");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(body.unwrap_or_default())
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        log::debug!("{} {}", req.method(), endpoint);

        let response = tokio::time::timeout(self.timeout, self.http.clone().oneshot(req))
            .await
            .map_err(|_| ApiError::Timeout {
                endpoint: endpoint.to_string(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ApiError::remote(endpoint, e))?;

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ApiError::remote(endpoint, e))?
            .to_bytes();

        // ClickUp reports failures as {"err": "...", "ECODE": "..."}, sometimes
        // even with a 200 status.
        if let Ok(err) = serde_json::from_slice::<ErrorResponse>(&bytes) {
            let message = match err.ecode {
                Some(code) => format!("{} ({})", err.err, code),
                None => err.err,
            };
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }
        if !status.is_success() {
            return Err(ApiError::remote(endpoint, status));
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::malformed(endpoint, e))
    }

    // --- READS ---

    /// All tasks of a list, in the order ClickUp returns them.
    pub async fn get_tasks(&self, list_id: &str) -> ApiResult<Vec<Task>> {
        let mut tasks = Vec::new();
        for page in 0..MAX_TASK_PAGES {
            let endpoint = format!("/list/{}/task?page={}", list_id, page);
            let resp: TasksResponse = self.send(Method::GET, &endpoint, None).await?;
            let fetched = resp.tasks.len();
            tasks.extend(resp.tasks);
            if resp.last_page != Some(false) || fetched == 0 {
                break;
            }
        }
        log::debug!("Fetched {} tasks for list {}", tasks.len(), list_id);
        Ok(tasks)
    }

    pub async fn get_authorized_user(&self) -> ApiResult<User> {
        let resp: UserResponse = self.send(Method::GET, "/user", None).await?;
        Ok(resp.user)
    }

    pub async fn get_teams(&self) -> ApiResult<Vec<Team>> {
        let resp: TeamsResponse = self.send(Method::GET, "/team", None).await?;
        Ok(resp.teams)
    }

    pub async fn get_spaces(&self, team_id: &str) -> ApiResult<Vec<Space>> {
        let endpoint = format!("/team/{}/space", team_id);
        let resp: SpacesResponse = self.send(Method::GET, &endpoint, None).await?;
        Ok(resp.spaces)
    }

    pub async fn get_lists(&self, space_id: &str) -> ApiResult<Vec<TaskList>> {
        let endpoint = format!("/space/{}/list", space_id);
        let resp: ListsResponse = self.send(Method::GET, &endpoint, None).await?;
        Ok(resp.lists)
    }

    // --- WRITES ---

    pub async fn create_task(&self, list_id: &str, task: &NewTask) -> ApiResult<CreatedTask> {
        let endpoint = format!("/list/{}/task", list_id);
        let body = serde_json::to_string(task).map_err(|e| ApiError::malformed(&endpoint, e))?;
        let created: CreatedTask = self.send(Method::POST, &endpoint, Some(body)).await?;
        log::info!("Created task {} in list {}", created.id, list_id);
        Ok(created)
    }
}

#[async_trait]
impl TaskSource for ClickUpClient {
    async fn get_tasks(&self, list_id: &str) -> ApiResult<Vec<Task>> {
        ClickUpClient::get_tasks(self, list_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_relative_url() {
        let err = ClickUpClient::new("api/v2", "pk", 5).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = ClickUpClient::new("http://localhost:1234/api/v2/", "pk", 5).unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234/api/v2");
    }
}
