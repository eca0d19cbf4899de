// Model exports
pub mod domain;
pub mod responses;

pub use domain::{
    Component, ComponentScores, EducationLevel, JobRoleSpec, ResumeExtract, ScoreBreakdown,
    ScoreResult, ScoringWeights,
};
pub use responses::BatchReport;
