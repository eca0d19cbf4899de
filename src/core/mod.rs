// Core algorithm exports
pub mod contract;
pub mod normalizer;
pub mod scoring;
pub mod screener;
pub mod signals;
pub mod similarity;
pub mod skills;

pub use contract::{check_config, check_job, check_resume, ContractViolation};
pub use normalizer::{normalize, NormalizedText};
pub use scoring::{aggregate, rank, ComponentFloors, ScoringConfig, Signals};
pub use screener::{BatchItem, Screener};
pub use similarity::{SemanticEngine, SemanticOptions, SemanticSignal};
pub use skills::{match_skills, SkillAliases, SkillMatch};
