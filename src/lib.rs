//! Resume Screen - explainable resume scoring for job roles
//!
//! Scores a parsed resume against a job role across five components
//! (semantic similarity, skills, experience, education, projects), combines
//! them into a 0-100 score with a shortlist decision, and explains the
//! result with matched and missing skills plus improvement suggestions.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use core::{BatchItem, ContractViolation, Screener, ScoringConfig, SemanticEngine, SkillAliases};
pub use models::{BatchReport, EducationLevel, JobRoleSpec, ResumeExtract, ScoreResult, ScoringWeights};
pub use services::{EmbeddingError, EmbeddingProvider, HashEmbedder, HttpEmbeddingProvider};
