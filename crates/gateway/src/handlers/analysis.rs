//! Analysis status reads
//!
//! Status is derived at read time from the presence of an analysis result;
//! it is never stored. The submission and its result come back from one
//! joined query, so a concurrent ingestion is either fully visible or not
//! at all.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::extract::CurrentStudent;
use crate::AppState;
use scholarcheck_common::{
    db::models::{AnalysisResult, Submission, SubmissionStatus},
    errors::{AppError, Result},
};

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub id: i32,
    pub filename: String,
    pub uploaded_at: chrono::DateTime<chrono::FixedOffset>,
    pub status: SubmissionStatus,
    pub analysis: Option<AnalysisPayload>,
}

#[derive(Serialize)]
pub struct AnalysisPayload {
    pub suggested_sources: serde_json::Value,
    pub plagiarism_score: f64,
    pub research_suggestions: String,
    pub citation_recommendations: String,
    pub analyzed_at: chrono::DateTime<chrono::FixedOffset>,
}

fn analysis_response(submission: Submission, result: Option<AnalysisResult>) -> AnalysisResponse {
    AnalysisResponse {
        id: submission.id,
        filename: submission.filename,
        uploaded_at: submission.uploaded_at,
        status: SubmissionStatus::derive(result.is_some()),
        analysis: result.map(|r| AnalysisPayload {
            suggested_sources: r.suggested_sources,
            plagiarism_score: r.plagiarism_score,
            research_suggestions: r.research_suggestions,
            citation_recommendations: r.citation_recommendations,
            analyzed_at: r.analyzed_at,
        }),
    }
}

/// Retrieve the analysis status for one of the caller's submissions
pub async fn get_analysis_results(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(assignment_id): Path<i32>,
) -> Result<Json<AnalysisResponse>> {
    let (submission, result) = state
        .repo
        .find_submission_with_result(assignment_id, student.id)
        .await?
        .ok_or(AppError::NotFound {
            resource: "Assignment",
        })?;

    Ok(Json(analysis_response(submission, result)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> Submission {
        Submission {
            id: 7,
            student_id: 1,
            filename: "essay.pdf".to_string(),
            original_text: None,
            topic: None,
            academic_level: None,
            word_count: None,
            uploaded_at: chrono::Utc::now().into(),
        }
    }

    fn result() -> AnalysisResult {
        AnalysisResult {
            id: 3,
            submission_id: 7,
            suggested_sources: serde_json::json!([{"title": "Some Paper"}]),
            plagiarism_score: 0.12,
            research_suggestions: "Read more".to_string(),
            citation_recommendations: "Cite properly".to_string(),
            confidence_score: 0.9,
            analyzed_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_pending_response_has_null_analysis() {
        let resp = analysis_response(submission(), None);
        assert_eq!(resp.status, SubmissionStatus::Pending);
        assert!(resp.analysis.is_none());

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "Pending");
        assert!(json["analysis"].is_null());
    }

    #[test]
    fn test_completed_response_carries_payload() {
        let resp = analysis_response(submission(), Some(result()));
        assert_eq!(resp.status, SubmissionStatus::Completed);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "Completed");
        assert_eq!(json["analysis"]["plagiarism_score"], 0.12);
        // Confidence stays internal; it is not part of the read payload.
        assert!(json["analysis"].get("confidence_score").is_none());
    }
}
