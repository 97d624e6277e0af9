// API client module: a small async HTTP client for the document-management
// service. It knows the wire shapes and the URL layout; the migration stages
// in `migration` decide what to call and in which order.

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Async API client holding a reqwest client, the base URL of the service
/// and the bearer token obtained at login.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

/// Login request payload.
#[derive(Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Expected response from the login endpoint. Other fields are ignored.
#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
}

/// A project as listed by the service. A missing or null `apiEnabled` flag
/// counts as disabled.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub api_enabled: Option<bool>,
}

/// A document version. Used both as the create payload and as the listing
/// entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_number: String,
    pub version: u32,
}

impl Document {
    /// First version of a document.
    pub fn new(document_number: impl Into<String>) -> Self {
        Self {
            document_number: document_number.into(),
            version: 1,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TransferRequest<'a> {
    target_project: &'a str,
}

impl ApiClient {
    /// Create a client for the service at `base_url`. `timeout` applies to
    /// each request; `None` means requests may wait indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url,
            token: None,
        })
    }

    /// Store the bearer token for subsequent authenticated requests.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Build an absolute URL by appending `segments` to the base path. Each
    /// segment is percent-encoded on its own, so a project name containing
    /// `/` stays one path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // parse_base_url guarantees the URL can be a base
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .context("Not authenticated: login must succeed before this request")?;
        Ok(request.bearer_auth(token))
    }

    /// POST /auth/login and return the session token.
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse> {
        let url = self.endpoint(&["auth", "login"]);
        tracing::debug!(%url, username = %req.username, "sending login request");
        let res = self
            .client
            .post(url)
            .json(req)
            .send()
            .await
            .context("Failed to send login request")?;
        let res = check_status(res, "Login").await?;
        res.json::<LoginResponse>()
            .await
            .context("Parsing login response json")
    }

    /// GET /projects.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let url = self.endpoint(&["projects"]);
        tracing::debug!(%url, "listing projects");
        let res = self
            .authorized(self.client.get(url))?
            .send()
            .await
            .context("Failed to send list projects request")?;
        let res = check_status(res, "List projects").await?;
        res.json::<Vec<Project>>()
            .await
            .context("Parsing project list json")
    }

    /// POST /projects/{project}/documents. The response body is ignored.
    pub async fn create_document(&self, project: &str, document: &Document) -> Result<()> {
        let url = self.endpoint(&["projects", project, "documents"]);
        tracing::debug!(%url, document = %document.document_number, "creating document");
        let res = self
            .authorized(self.client.post(url))?
            .json(document)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to send create request for {}",
                    document.document_number
                )
            })?;
        check_status(res, "Create document").await?;
        Ok(())
    }

    /// GET /projects/{project}/documents.
    pub async fn list_documents(&self, project: &str) -> Result<Vec<Document>> {
        let url = self.endpoint(&["projects", project, "documents"]);
        tracing::debug!(%url, "listing documents");
        let res = self
            .authorized(self.client.get(url))?
            .send()
            .await
            .with_context(|| format!("Failed to send list documents request for {}", project))?;
        let res = check_status(res, "List documents").await?;
        res.json::<Vec<Document>>()
            .await
            .context("Parsing document list json")
    }

    /// POST /projects/{project}/documents/{number}/versions/{version}/transfer
    /// with `{targetProject}` as body. The response body is ignored.
    pub async fn transfer_document(
        &self,
        project: &str,
        document: &Document,
        target_project: &str,
    ) -> Result<()> {
        let version = document.version.to_string();
        let url = self.endpoint(&[
            "projects",
            project,
            "documents",
            document.document_number.as_str(),
            "versions",
            version.as_str(),
            "transfer",
        ]);
        tracing::debug!(%url, target_project, "transferring document");
        let res = self
            .authorized(self.client.post(url))?
            .json(&TransferRequest { target_project })
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to send transfer request for {}",
                    document.document_number
                )
            })?;
        check_status(res, "Transfer document").await?;
        Ok(())
    }
}

pub(crate) fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url).with_context(|| format!("Invalid base URL '{}'", base_url))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        anyhow::bail!("Base URL must be an absolute http(s) URL: '{}'", base_url);
    }
    Ok(url)
}

/// Turn a non-2xx response into an error carrying the status and body.
async fn check_status(res: Response, operation: &str) -> Result<Response> {
    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().await.unwrap_or_default();
        anyhow::bail!("{} failed: {} - {}", operation, status, txt);
    }
    Ok(res)
}
