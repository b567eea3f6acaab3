//! SeaORM entity models
//!
//! Database entities for ScholarCheck

mod analysis_result;
mod reference_source;
mod student;
mod submission;

pub use student::{
    ActiveModel as StudentActiveModel, Column as StudentColumn, Entity as StudentEntity,
    Model as Student,
};

pub use submission::{
    ActiveModel as SubmissionActiveModel, Column as SubmissionColumn, Entity as SubmissionEntity,
    Model as Submission, SubmissionStatus,
};

pub use analysis_result::{
    ActiveModel as AnalysisResultActiveModel, Column as AnalysisResultColumn,
    Entity as AnalysisResultEntity, Model as AnalysisResult,
};

pub use reference_source::{
    ActiveModel as ReferenceSourceActiveModel, Column as ReferenceSourceColumn,
    Entity as ReferenceSourceEntity, Model as ReferenceSource, SourceType,
};
