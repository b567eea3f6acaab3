//! Reference source entity
//!
//! Stored academic documents with precomputed embeddings, immutable after
//! bulk ingestion.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Source category
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Paper,
    Textbook,
    CourseMaterial,
}

impl From<String> for SourceType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "textbook" => SourceType::Textbook,
            "course_material" => SourceType::CourseMaterial,
            _ => SourceType::Paper,
        }
    }
}

impl From<SourceType> for String {
    fn from(source_type: SourceType) -> Self {
        match source_type {
            SourceType::Paper => "paper".to_string(),
            SourceType::Textbook => "textbook".to_string(),
            SourceType::CourseMaterial => "course_material".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reference_sources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub authors: String,

    pub publication_year: i32,

    #[sea_orm(column_type = "Text")]
    pub abstract_text: String,

    #[sea_orm(column_type = "Text")]
    pub full_text: String,

    #[sea_orm(column_type = "Text")]
    pub source_type: String,

    /// pgvector embedding stored as text for SeaORM compatibility.
    /// Actual vector operations done via raw SQL.
    #[sea_orm(column_type = "Text", nullable)]
    pub embedding: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Get the source category as an enum
    pub fn category(&self) -> SourceType {
        SourceType::from(self.source_type.clone())
    }

    /// Parse embedding from stored text format to Vec<f32>
    pub fn parse_embedding(&self) -> Option<Vec<f32>> {
        self.embedding.as_ref().and_then(|s| {
            // Format: "[1.0,2.0,3.0,...]"
            let inner = s.trim_start_matches('[').trim_end_matches(']');
            inner
                .split(',')
                .map(|v| v.trim().parse::<f32>().ok())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_roundtrip() {
        assert_eq!(
            SourceType::from(String::from("course_material")),
            SourceType::CourseMaterial
        );
        assert_eq!(String::from(SourceType::Textbook), "textbook");
    }
}
