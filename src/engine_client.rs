use crate::config::{EngineConfig, TlsConfig};
use crate::error::DeployError;
use crate::model::{PodStatus, ServiceUpdateRequest};
use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Certificate, Client, Response};
use std::fs;
use tracing::{debug, info};

static REPLICATION_CONTROLLER_CHANGE_PATH: &str = "ReplicationControllerChange";
static GET_PODS_PATH: &str = "GetPods";

/// HTTP client for the tenant-scoped engine API. Every request carries the bearer token and a JSON content type.
#[derive(Clone)]
pub struct EngineClient {
    http_client: Client,
    base_url: String,
}

impl EngineClient {
    pub fn new(engine: &EngineConfig, tls: &TlsConfig) -> Result<Self> {
        info!("Initializing engine HTTP client for tenant {}", engine.tenant_id);

        let mut auth_value = HeaderValue::from_str(&engine.token.bearer())
            .context("SSO token contains characters that are not allowed in an HTTP header")?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth_value);

        // System certificates are loaded automatically with rustls-tls-native-roots
        let mut client_builder = Client::builder().default_headers(headers);

        for file_path in &tls.ca_certificate_paths {
            let file_content = fs::read(file_path)
                .with_context(|| format!("Failed to read file {}", file_path.display()))?;
            let cert =
                Certificate::from_pem(&file_content).context("Failed to parse certificate")?;
            client_builder = client_builder.add_root_certificate(cert);
        }

        let http_client = client_builder
            .build()
            .context("Failed to build HTTP client")?;

        Ok(EngineClient {
            http_client,
            base_url: engine.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn replication_controller_change(&self, request: &ServiceUpdateRequest) -> Result<()> {
        let url = self.url(REPLICATION_CONTROLLER_CHANGE_PATH);
        debug!("POST {}", url);
        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to send service update request to {}", url))?;

        error_for_status(response, &url).await?;
        Ok(())
    }

    pub async fn get_pods(&self) -> Result<Vec<PodStatus>> {
        let url = self.url(GET_PODS_PATH);
        debug!("GET {}", url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send pod status request to {}", url))?;

        let pods = error_for_status(response, &url)
            .await?
            .json::<Vec<PodStatus>>()
            .await
            .context("Failed to parse pod status list returned by the engine")?;
        Ok(pods)
    }
}

/// Turns a 4xx/5xx response into `DeployError::Http`, keeping the response body for the error message
async fn error_for_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(DeployError::Http {
            status,
            url: url.to_string(),
            body,
        }
        .into());
    }
    Ok(response)
}
