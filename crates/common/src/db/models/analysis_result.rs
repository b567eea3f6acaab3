//! Analysis result entity
//!
//! One-to-zero-or-one with submissions; append-only. The unique constraint
//! on `submission_id` arbitrates concurrent ingestion: exactly one writer
//! wins, the loser observes a conflict.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "analysis_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub submission_id: i32,

    /// Suggested source descriptors, free-form structured records
    #[sea_orm(column_type = "JsonBinary")]
    pub suggested_sources: Json,

    pub plagiarism_score: f64,

    #[sea_orm(column_type = "Text")]
    pub research_suggestions: String,

    #[sea_orm(column_type = "Text")]
    pub citation_recommendations: String,

    pub confidence_score: f64,

    pub analyzed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submission::Entity",
        from = "Column::SubmissionId",
        to = "super::submission::Column::Id"
    )]
    Submission,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
