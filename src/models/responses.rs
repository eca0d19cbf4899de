use serde::{Deserialize, Serialize};
use crate::models::domain::ScoreResult;

/// Report produced for one screened batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub job_title: String,
    pub total_resumes: usize,
    pub shortlisted_count: usize,
    /// Result indices, best candidate first
    pub ranking: Vec<usize>,
    pub results: Vec<ScoreResult>,
}

impl BatchReport {
    pub fn new(job_title: impl Into<String>, results: Vec<ScoreResult>) -> Self {
        let ranking = crate::core::scoring::rank(&results);
        let shortlisted_count = results.iter().filter(|r| r.shortlisted).count();

        Self {
            job_title: job_title.into(),
            total_resumes: results.len(),
            shortlisted_count,
            ranking,
            results,
        }
    }
}
