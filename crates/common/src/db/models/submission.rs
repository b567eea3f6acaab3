//! Submission entity
//!
//! Created at upload time with the extracted fields null; those fields are
//! written exactly once, by result ingestion, in the same transaction that
//! inserts the analysis result.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Derived submission status. Never persisted: a submission is `Pending`
/// exactly until an analysis result row exists for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    Completed,
}

impl SubmissionStatus {
    /// Derive the status from the presence of an analysis result
    pub fn derive(has_result: bool) -> Self {
        if has_result {
            SubmissionStatus::Completed
        } else {
            SubmissionStatus::Pending
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub student_id: i32,

    #[sea_orm(column_type = "Text")]
    pub filename: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub original_text: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub topic: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub academic_level: Option<String>,

    pub word_count: Option<i32>,

    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,

    #[sea_orm(has_one = "super::analysis_result::Entity")]
    AnalysisResult,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::analysis_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnalysisResult.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_derivation() {
        assert_eq!(SubmissionStatus::derive(false), SubmissionStatus::Pending);
        assert_eq!(SubmissionStatus::derive(true), SubmissionStatus::Completed);
    }
}
