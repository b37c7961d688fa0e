/// Project existence check
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::RegistryError;

/// Status code and body of an API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Harbor error payload: `{"errors": [{"code": ..., "message": ...}]}`
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl ApiResponse {
    /// Error text from a Harbor error payload, or the raw body
    pub fn message(&self) -> String {
        match serde_json::from_str::<ErrorResponse>(&self.body) {
            Ok(response) if !response.errors.is_empty() => response
                .errors
                .iter()
                .map(|e| format!("{} - {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; "),
            _ => self.body.trim().to_string(),
        }
    }
}

/// Project lookup and creation
#[async_trait]
pub trait ProjectApi: Send + Sync {
    /// Look a project up by name
    async fn get_project(&self, project: &str) -> Result<ApiResponse>;

    /// Create a project
    async fn create_project(&self, project: &str, public: bool) -> Result<ApiResponse>;
}

/// What `ensure_project_exists` found or did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    Existing,
    Created,
    /// Lost a race with another creator (409)
    AlreadyExists,
}

/// Make sure `project` exists, creating it as public if missing.
///
/// Any lookup status other than 200/404, or a create status other than
/// 201/409, is an error.
pub async fn ensure_project_exists(api: &dyn ProjectApi, project: &str) -> Result<ProjectStatus> {
    info!("Checking if project '{}' exists...", project);
    let response = api.get_project(project).await?;

    match response.status {
        200 => {
            info!("Project already exists.");
            Ok(ProjectStatus::Existing)
        }
        404 => {
            warn!("Project not found, creating a new one...");
            let created = api.create_project(project, true).await?;
            match created.status {
                201 => {
                    info!("Project created successfully.");
                    Ok(ProjectStatus::Created)
                }
                409 => {
                    info!("Project was created concurrently.");
                    Ok(ProjectStatus::AlreadyExists)
                }
                status => {
                    let body = created.message();
                    error!("Failed to create project: {}", body);
                    Err(RegistryError::CreateRejected { status, body }.into())
                }
            }
        }
        status => {
            error!("Unexpected Harbor response: {}", status);
            Err(RegistryError::UnexpectedStatus { status }.into())
        }
    }
}
