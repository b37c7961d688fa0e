/// Harbor REST API client
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::project::{ApiResponse, ProjectApi};
use crate::config::RegistryConfig;

const API_PREFIX: [&str; 2] = ["api", "v2.0"];

/// Request body for creating a project
#[derive(Debug, Serialize)]
pub struct CreateProjectRequest<'a> {
    pub project_name: &'a str,
    pub public: bool,
}

/// Harbor API client authenticated with basic auth
#[derive(Clone)]
pub struct HarborClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl HarborClient {
    /// Create a new Harbor API client
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.insecure_tls)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.harbor_url()?,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Build `{base}/api/v2.0/projects[/{project}]`
    pub(crate) fn projects_url(&self, project: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow::anyhow!("Invalid Harbor URL: {}", self.base_url))?;
            segments.pop_if_empty().extend(API_PREFIX).push("projects");
            if let Some(project) = project {
                segments.push(project);
            }
        }
        Ok(url)
    }

    async fn into_api_response(response: reqwest::Response) -> ApiResponse {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ApiResponse { status, body }
    }
}

#[async_trait]
impl ProjectApi for HarborClient {
    async fn get_project(&self, project: &str) -> Result<ApiResponse> {
        let url = self.projects_url(Some(project))?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .context("Failed to send GET request")?;

        Ok(Self::into_api_response(response).await)
    }

    async fn create_project(&self, project: &str, public: bool) -> Result<ApiResponse> {
        let url = self.projects_url(None)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&CreateProjectRequest {
                project_name: project,
                public,
            })
            .send()
            .await
            .context("Failed to send POST request")?;

        Ok(Self::into_api_response(response).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let result = HarborClient::new(&RegistryConfig::example());
        assert!(result.is_ok());
    }

    #[test]
    fn test_projects_url() {
        let client = HarborClient::new(&RegistryConfig::example()).unwrap();
        assert_eq!(
            client.projects_url(None).unwrap().as_str(),
            "https://harbor.local/api/v2.0/projects"
        );
        assert_eq!(
            client.projects_url(Some("mirror")).unwrap().as_str(),
            "https://harbor.local/api/v2.0/projects/mirror"
        );
    }

    #[test]
    fn test_projects_url_keeps_base_path() {
        let mut config = RegistryConfig::example();
        config.registry = "http://localhost:8080/harbor/".to_string();
        let client = HarborClient::new(&config).unwrap();
        assert_eq!(
            client.projects_url(Some("kubeflow")).unwrap().as_str(),
            "http://localhost:8080/harbor/api/v2.0/projects/kubeflow"
        );
    }

    #[test]
    fn test_create_request_body() {
        let body = serde_json::to_value(CreateProjectRequest {
            project_name: "mirror",
            public: true,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"project_name": "mirror", "public": true}));
    }
}
