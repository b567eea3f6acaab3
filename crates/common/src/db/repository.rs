//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    EntityTrait, QueryFilter, Set, SqlErr, Statement, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};

/// One candidate row from the vector ranking query.
///
/// `similarity` is the reported cosine similarity; the row order produced by
/// the query follows the storage index metric (L2), which is not necessarily
/// the same ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSource {
    pub id: i32,
    pub title: String,
    pub authors: String,
    pub publication_year: i32,
    pub abstract_text: String,
    pub source_type: String,
    pub similarity: f64,
}

/// Everything result ingestion writes in one unit of work
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisIngest {
    pub submission_id: i32,
    pub original_text: String,
    pub topic: String,
    pub academic_level: String,
    pub word_count: i32,
    pub suggested_sources: serde_json::Value,
    pub plagiarism_score: f64,
    pub research_suggestions: String,
    pub citation_recommendations: String,
    pub confidence_score: f64,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Student Operations
    // ========================================================================

    /// Create a new student account
    pub async fn create_student(
        &self,
        email: String,
        password_hash: String,
        full_name: String,
        student_id: String,
    ) -> Result<Student> {
        let now = chrono::Utc::now();

        let student = StudentActiveModel {
            email: Set(email),
            password_hash: Set(password_hash),
            full_name: Set(full_name),
            student_id: Set(student_id),
            created_at: Set(now.into()),
            ..Default::default()
        };

        student.insert(self.conn()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::DuplicateAccount
            } else {
                AppError::Database(e)
            }
        })
    }

    /// Find a student by email
    pub async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>> {
        StudentEntity::find()
            .filter(StudentColumn::Email.eq(email))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Check whether an account with the given email or institutional id
    /// already exists
    pub async fn student_exists(&self, email: &str, student_id: &str) -> Result<bool> {
        let existing = StudentEntity::find()
            .filter(
                Condition::any()
                    .add(StudentColumn::Email.eq(email))
                    .add(StudentColumn::StudentId.eq(student_id)),
            )
            .one(self.conn())
            .await?;

        Ok(existing.is_some())
    }

    // ========================================================================
    // Submission Operations
    // ========================================================================

    /// Create a pending submission record for an upload
    pub async fn create_submission(&self, student_id: i32, filename: &str) -> Result<Submission> {
        let now = chrono::Utc::now();

        let submission = SubmissionActiveModel {
            student_id: Set(student_id),
            filename: Set(filename.to_string()),
            original_text: Set(None),
            topic: Set(None),
            academic_level: Set(None),
            word_count: Set(None),
            uploaded_at: Set(now.into()),
            ..Default::default()
        };

        submission.insert(self.conn()).await.map_err(Into::into)
    }

    /// Fetch a submission together with its analysis result, scoped to an
    /// owner. An absent submission and one owned by someone else are both
    /// `None`: the caller cannot distinguish them.
    pub async fn find_submission_with_result(
        &self,
        id: i32,
        student_id: i32,
    ) -> Result<Option<(Submission, Option<AnalysisResult>)>> {
        SubmissionEntity::find_by_id(id)
            .filter(SubmissionColumn::StudentId.eq(student_id))
            .find_also_related(AnalysisResultEntity)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Attach extracted metadata and the analysis result to a submission as
    /// a single unit of work.
    ///
    /// The whole step runs in one transaction: a crash can never leave the
    /// metadata written without the result row or vice versa. A unique
    /// constraint on `analysis_results.submission_id` backs the in-transaction
    /// existence check, so concurrent deliveries for the same submission have
    /// exactly one winner.
    pub async fn attach_analysis_result(&self, ingest: AnalysisIngest) -> Result<AnalysisResult> {
        self.conn()
            .transaction::<_, AnalysisResult, AppError>(|txn| {
                Box::pin(async move {
                    let submission = SubmissionEntity::find_by_id(ingest.submission_id)
                        .one(txn)
                        .await?
                        .ok_or(AppError::NotFound {
                            resource: "Assignment",
                        })?;

                    let existing = AnalysisResultEntity::find()
                        .filter(AnalysisResultColumn::SubmissionId.eq(ingest.submission_id))
                        .one(txn)
                        .await?;
                    if existing.is_some() {
                        return Err(AppError::DuplicateResult);
                    }

                    let mut submission: SubmissionActiveModel = submission.into();
                    submission.original_text = Set(Some(ingest.original_text));
                    submission.topic = Set(Some(ingest.topic));
                    submission.academic_level = Set(Some(ingest.academic_level));
                    submission.word_count = Set(Some(ingest.word_count));
                    submission.update(txn).await?;

                    let now = chrono::Utc::now();
                    let result = AnalysisResultActiveModel {
                        submission_id: Set(ingest.submission_id),
                        suggested_sources: Set(ingest.suggested_sources),
                        plagiarism_score: Set(ingest.plagiarism_score),
                        research_suggestions: Set(ingest.research_suggestions),
                        citation_recommendations: Set(ingest.citation_recommendations),
                        confidence_score: Set(ingest.confidence_score),
                        analyzed_at: Set(now.into()),
                        ..Default::default()
                    };

                    result.insert(txn).await.map_err(|e| {
                        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                            AppError::DuplicateResult
                        } else {
                            AppError::Database(e)
                        }
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => AppError::Database(db),
                TransactionError::Transaction(app) => app,
            })
    }

    // ========================================================================
    // Reference Source Operations
    // ========================================================================

    /// Rank stored reference sources against a query embedding.
    ///
    /// Candidate selection orders by L2 distance (the metric the pgvector
    /// index serves); the reported score is cosine similarity computed as an
    /// independent expression. Ties in the selection order break on ascending
    /// id so the result set is deterministic.
    pub async fn nearest_sources(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CandidateSource>> {
        let embedding_str = format!(
            "[{}]",
            embedding
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );

        let sql = r#"
            SELECT
                s.id,
                s.title,
                s.authors,
                s.publication_year,
                s.abstract_text,
                s.source_type,
                1 - (s.embedding <=> $1::vector) AS similarity
            FROM reference_sources s
            WHERE s.embedding IS NOT NULL
            ORDER BY s.embedding <-> $1::vector ASC, s.id ASC
            LIMIT $2
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            vec![embedding_str.into(), (limit as i64).into()],
        );

        let results = self
            .conn()
            .query_all(stmt)
            .await?
            .into_iter()
            .filter_map(|row| {
                Some(CandidateSource {
                    id: row.try_get_by_index::<i32>(0).ok()?,
                    title: row.try_get_by_index::<String>(1).ok()?,
                    authors: row.try_get_by_index::<String>(2).ok()?,
                    publication_year: row.try_get_by_index::<i32>(3).ok()?,
                    abstract_text: row.try_get_by_index::<String>(4).ok()?,
                    source_type: row.try_get_by_index::<String>(5).ok()?,
                    similarity: row.try_get_by_index::<f64>(6).ok()?,
                })
            })
            .collect();

        Ok(results)
    }
}
