//! Internal endpoints for trusted backend callers
//!
//! The analysis workflow posts its findings here, and internal services
//! query reference sources by semantic similarity. Both routes require the
//! service credential, never a student bearer token.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::extract::ServiceKey;
use crate::AppState;
use scholarcheck_common::{
    db::AnalysisIngest,
    errors::{AppError, Result},
    metrics,
    retrieval::DEFAULT_TOP_K,
};

/// Payload the analysis workflow posts back for one assignment
#[derive(Debug, Deserialize, Validate)]
pub struct AnalysisResultCreate {
    pub assignment_id: i32,

    pub original_text: String,

    pub topic: String,

    pub academic_level: String,

    #[validate(range(min = 0))]
    pub word_count: i32,

    pub suggested_sources: Vec<serde_json::Value>,

    #[validate(range(min = 0.0, max = 1.0))]
    pub plagiarism_score: f64,

    pub research_suggestions: String,

    pub citation_recommendations: String,

    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence_score: f64,
}

#[derive(Serialize)]
pub struct AnalysisResultCreated {
    pub message: String,
}

/// Ingest an analysis result from the external workflow.
///
/// Metadata update and result insert land in one transaction; re-delivery
/// for an already-analyzed assignment is a conflict, never an overwrite.
pub async fn create_analysis_result(
    _key: ServiceKey,
    State(state): State<AppState>,
    Json(request): Json<AnalysisResultCreate>,
) -> Result<(StatusCode, Json<AnalysisResultCreated>)> {
    request.validate().map_err(|e| AppError::InvalidArgument {
        message: e.to_string(),
    })?;

    let submission_id = request.assignment_id;

    state
        .repo
        .attach_analysis_result(AnalysisIngest {
            submission_id,
            original_text: request.original_text,
            topic: request.topic,
            academic_level: request.academic_level,
            word_count: request.word_count,
            suggested_sources: serde_json::Value::Array(request.suggested_sources),
            plagiarism_score: request.plagiarism_score,
            research_suggestions: request.research_suggestions,
            citation_recommendations: request.citation_recommendations,
            confidence_score: request.confidence_score,
        })
        .await?;

    tracing::info!(submission_id, "Analysis result ingested");
    metrics::record_result_ingested();

    Ok((
        StatusCode::CREATED,
        Json(AnalysisResultCreated {
            message: "Analysis result created successfully".to_string(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SourcesQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
pub struct SourceResponse {
    pub id: i32,
    pub title: String,
    pub authors: String,
    pub publication_year: i32,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub source_type: String,
    pub similarity_score: f64,
}

/// Rank stored reference sources against a free-text query
pub async fn get_sources(
    _key: ServiceKey,
    State(state): State<AppState>,
    Query(params): Query<SourcesQuery>,
) -> Result<Json<Vec<SourceResponse>>> {
    let timer = metrics::Timer::start();

    let sources = state.retriever.retrieve(&params.q, DEFAULT_TOP_K).await?;

    metrics::record_retrieval(timer.elapsed_secs(), sources.len());
    tracing::info!(
        query = %params.q,
        results = sources.len(),
        "Reference source retrieval completed"
    );

    Ok(Json(
        sources
            .into_iter()
            .map(|s| SourceResponse {
                id: s.id,
                title: s.title,
                authors: s.authors,
                publication_year: s.publication_year,
                abstract_text: s.abstract_text,
                source_type: s.source_type,
                similarity_score: s.similarity,
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> AnalysisResultCreate {
        AnalysisResultCreate {
            assignment_id: 1,
            original_text: "text".to_string(),
            topic: "ethics".to_string(),
            academic_level: "undergraduate".to_string(),
            word_count: 1200,
            suggested_sources: vec![serde_json::json!({"title": "A"})],
            plagiarism_score: 0.3,
            research_suggestions: "r".to_string(),
            citation_recommendations: "c".to_string(),
            confidence_score: 0.8,
        }
    }

    #[test]
    fn test_score_range_validation() {
        assert!(valid_payload().validate().is_ok());

        let mut over = valid_payload();
        over.plagiarism_score = 1.5;
        assert!(over.validate().is_err());

        let mut under = valid_payload();
        under.confidence_score = -0.1;
        assert!(under.validate().is_err());

        let mut negative_words = valid_payload();
        negative_words.word_count = -1;
        assert!(negative_words.validate().is_err());
    }

    #[test]
    fn test_source_response_renames_abstract() {
        let resp = SourceResponse {
            id: 1,
            title: "T".to_string(),
            authors: "A".to_string(),
            publication_year: 2021,
            abstract_text: "abs".to_string(),
            source_type: "paper".to_string(),
            similarity_score: 0.5,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["abstract"], "abs");
        assert!(json.get("abstract_text").is_none());
    }
}
