//! Job API handlers.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use redline_core::{
    ArtifactRef, JobRecord, JobStatus, ServiceError, TaskState, TaskStatus, UploadedFile,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use crate::state::AppState;

const ZIP_CONTENT_TYPE: &str = "application/zip";
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Task counts of a job.
#[derive(Debug, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub queued: usize,
    pub processing: usize,
    pub complete: usize,
    pub error: usize,
}

/// One task in a job response.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: u32,
    pub name: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Present once the task is complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// Archive metadata in a job response.
#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    pub file_name: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub download_url: String,
}

/// Response for job operations
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub status: JobStatus,
    pub role: String,
    pub counts: TaskCounts,
    pub tasks: Vec<TaskResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<JobRecord> for JobResponse {
    fn from(job: JobRecord) -> Self {
        let id = job.id().to_string();
        let tasks = job
            .tasks()
            .iter()
            .map(|task| task_response(&id, task))
            .collect();

        Self {
            counts: TaskCounts {
                total: job.tasks().len(),
                queued: job.count(TaskStatus::Queued),
                processing: job.count(TaskStatus::Processing),
                complete: job.count(TaskStatus::Complete),
                error: job.count(TaskStatus::Error),
            },
            archive: job.archive().map(|archive| ArchiveResponse {
                file_name: archive.file_name.clone(),
                size_bytes: archive.size_bytes,
                sha256: archive.sha256.clone(),
                download_url: format!("/api/v1/jobs/{}/archive", id),
            }),
            status: job.status(),
            role: job.role().to_string(),
            last_error: job.last_error().map(String::from),
            created_at: job.created_at().to_rfc3339(),
            updated_at: job.updated_at().to_rfc3339(),
            tasks,
            id,
        }
    }
}

fn task_response(job_id: &str, task: &TaskState) -> TaskResponse {
    TaskResponse {
        id: task.id(),
        name: task.name().to_string(),
        status: task.status(),
        char_count: task.char_count(),
        error: task.error().map(String::from),
        download_url: task
            .artifact()
            .map(|_| format!("/api/v1/jobs/{}/tasks/{}/artifact", job_id, task.id())),
    }
}

/// Response for listing jobs
#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobResponse>,
    pub total: usize,
}

/// Response for deleting a job
#[derive(Debug, Serialize)]
pub struct DeleteJobResponse {
    pub removed: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A service error rendered as a JSON error response.
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::JobNotFound { .. }
            | ServiceError::TaskNotFound { .. }
            | ServiceError::ArtifactUnavailable { .. } => StatusCode::NOT_FOUND,
            ServiceError::NotReady { .. } | ServiceError::TaskNotReady { .. } => {
                StatusCode::CONFLICT
            }
            ServiceError::InvalidRole { .. } | ServiceError::NoAcceptedFiles { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Storage { .. } | ServiceError::Job(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        error_response(status, self.0.to_string())
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a batch of documents.
///
/// Multipart fields: `role` (optional text) and one or more `files`.
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<JobResponse>), Response> {
    let mut files = Vec::new();
    let mut role: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid multipart body: {}", e),
                ))
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "role" => {
                let value = field.text().await.map_err(|e| {
                    error_response(StatusCode::BAD_REQUEST, format!("Invalid role field: {}", e))
                })?;
                role = Some(value);
            }
            "files" | "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file {}: {}", file_name, e),
                    )
                })?;
                files.push(UploadedFile::new(file_name, bytes.to_vec()));
            }
            other => debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    let job = state
        .service()
        .submit(files, role.as_deref())
        .await
        .map_err(|e| ApiError(e).into_response())?;

    Ok((StatusCode::ACCEPTED, Json(JobResponse::from(job))))
}

/// List all jobs
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<ListJobsResponse> {
    let jobs: Vec<JobResponse> = state
        .service()
        .list()
        .into_iter()
        .map(JobResponse::from)
        .collect();
    Json(ListJobsResponse {
        total: jobs.len(),
        jobs,
    })
}

/// Get a job by ID
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let job = state.service().poll(&id)?;
    Ok(Json(JobResponse::from(job)))
}

/// Delete a job and its files
pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteJobResponse>, ApiError> {
    let removed = state.service().delete(&id).await?;
    Ok(Json(DeleteJobResponse { removed }))
}

/// Download the job archive
pub async fn download_archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let archive = state.service().archive(&id)?;
    serve_artifact(archive, ZIP_CONTENT_TYPE).await
}

/// Download the report of one file
pub async fn download_task_artifact(
    State(state): State<Arc<AppState>>,
    Path((id, task_id)): Path<(String, u32)>,
) -> Result<Response, ApiError> {
    let artifact = state.service().task_artifact(&id, task_id)?;
    serve_artifact(artifact, DOCX_CONTENT_TYPE).await
}

async fn serve_artifact(artifact: ArtifactRef, content_type: &str) -> Result<Response, ApiError> {
    // The job may have been deleted since the lookup.
    let bytes = tokio::fs::read(&artifact.path).await.map_err(|e| {
        ApiError(ServiceError::ArtifactUnavailable {
            reason: format!("{}: {}", artifact.file_name, e),
        })
    })?;

    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        artifact.file_name.replace('"', ""),
        urlencoding::encode(&artifact.file_name)
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes))
        .map_err(|e| ApiError(ServiceError::storage(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (ServiceError::job_not_found("x"), StatusCode::NOT_FOUND),
            (
                ServiceError::NotReady {
                    job_id: "x".to_string(),
                    status: JobStatus::Processing,
                },
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::InvalidRole {
                    role: "pirate".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Unavailable {
                    reason: "no key".to_string(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ServiceError::storage("disk full"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn test_job_response_shape() {
        let job = JobRecord::new("job-1", vec!["a.docx".to_string()], "academic");
        let json = serde_json::to_value(JobResponse::from(job)).unwrap();

        assert_eq!(json["id"], "job-1");
        assert_eq!(json["status"], "queued");
        assert_eq!(json["counts"]["total"], 1);
        assert_eq!(json["tasks"][0]["id"], 1);
        assert_eq!(json["tasks"][0]["status"], "queued");
        assert!(json["tasks"][0].get("download_url").is_none());
        assert!(json.get("archive").is_none());
    }
}
