//! Assignment upload handler
//!
//! Validates the document, persists a Pending submission, hands the bytes to
//! the dispatch worker, and returns the new assignment id. The caller never
//! waits on the forward to the analysis workflow.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::dispatch::DispatchJob;
use crate::extract::CurrentStudent;
use crate::AppState;
use scholarcheck_common::{
    errors::{AppError, Result},
    metrics,
};

/// Upload size ceiling
pub const MAX_FILE_SIZE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted document media types: PDF and DOCX
pub const ALLOWED_MEDIA_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Multipart field the document is expected under
const FILE_FIELD: &str = "file";

#[derive(Serialize)]
pub struct UploadResponse {
    pub assignment_id: i32,
}

/// Check a media type against the allow-list
pub fn is_allowed_media_type(content_type: &str) -> bool {
    ALLOWED_MEDIA_TYPES.contains(&content_type)
}

/// Check a running byte count against the ceiling
pub fn check_size(total_bytes: usize) -> Result<()> {
    if total_bytes > MAX_FILE_SIZE_BYTES {
        Err(AppError::PayloadTooLarge {
            limit_bytes: MAX_FILE_SIZE_BYTES,
        })
    } else {
        Ok(())
    }
}

/// Accept an assignment document and trigger background analysis
pub async fn upload_assignment(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidArgument {
                message: format!("Malformed multipart body: {}", e),
            })? {
            Some(candidate) => {
                if candidate.name() == Some(FILE_FIELD) || candidate.file_name().is_some() {
                    break candidate;
                }
            }
            None => {
                return Err(AppError::InvalidArgument {
                    message: "Multipart field 'file' is required".to_string(),
                })
            }
        }
    };

    let content_type = field
        .content_type()
        .map(str::to_string)
        .ok_or(AppError::UnsupportedMediaType)?;
    if !is_allowed_media_type(&content_type) {
        return Err(AppError::UnsupportedMediaType);
    }

    let filename = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| "upload".to_string());

    // Drain the stream chunk by chunk so an oversized upload is rejected as
    // soon as the running total crosses the ceiling, not after buffering it.
    let mut payload = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::InvalidArgument {
            message: format!("Failed to read upload: {}", e),
        })?
    {
        check_size(payload.len() + chunk.len())?;
        payload.extend_from_slice(&chunk);
    }

    // The record must exist before the forward so the callback can always
    // correlate its id.
    let submission = state
        .repo
        .create_submission(student.id, &filename)
        .await?;

    tracing::info!(
        submission_id = submission.id,
        student_id = student.id,
        filename = %filename,
        size_bytes = payload.len(),
        "Submission created"
    );
    metrics::record_upload(&content_type);

    state.dispatcher.enqueue(DispatchJob {
        submission_id: submission.id,
        owner_email: student.email,
        filename,
        content_type,
        payload,
    });

    Ok(Json(UploadResponse {
        assignment_id: submission.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_allow_list() {
        assert!(is_allowed_media_type("application/pdf"));
        assert!(is_allowed_media_type(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        ));
        assert!(!is_allowed_media_type("text/plain"));
        assert!(!is_allowed_media_type("application/msword"));
        assert!(!is_allowed_media_type(""));
    }

    #[test]
    fn test_size_ceiling_boundary() {
        // Exactly at the ceiling is accepted, one byte over is not.
        assert!(check_size(MAX_FILE_SIZE_BYTES).is_ok());
        assert!(matches!(
            check_size(MAX_FILE_SIZE_BYTES + 1).unwrap_err(),
            AppError::PayloadTooLarge { .. }
        ));
    }

    #[test]
    fn test_size_ceiling_is_five_mib() {
        assert_eq!(MAX_FILE_SIZE_BYTES, 5 * 1024 * 1024);
    }
}
