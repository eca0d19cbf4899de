use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::contract::{check_config, check_job, check_resume, ContractViolation};
use crate::core::normalizer::{normalize, NormalizedText};
use crate::core::scoring::{aggregate, failed_result, ScoringConfig, Signals};
use crate::core::signals::{
    education_score, experience_score, infer_education_level, infer_experience_years,
    project_score, JobTerms,
};
use crate::core::similarity::{SemanticEngine, SemanticSignal};
use crate::core::skills::{match_skills, skills_in_text, SkillAliases};
use crate::models::{JobRoleSpec, ResumeExtract, ScoreResult};

/// Outcome of one batch item
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem {
    Scored(ScoreResult),
    /// Cancelled before evaluation started
    Cancelled,
}

impl BatchItem {
    pub fn into_result(self) -> Option<ScoreResult> {
        match self {
            BatchItem::Scored(result) => Some(result),
            BatchItem::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BatchItem::Cancelled)
    }
}

/// Batch input that failed to deserialize
#[derive(Debug)]
struct UnparsedResume {
    candidate_id: Option<String>,
    reason: String,
}

/// Job role data derived once and shared by every resume in a run
#[derive(Debug)]
struct PreparedJob {
    job: JobRoleSpec,
    description: NormalizedText,
    terms: JobTerms,
}

impl PreparedJob {
    fn new(job: &JobRoleSpec) -> Self {
        Self {
            description: normalize(&job.description),
            terms: JobTerms::from_job(job),
            job: job.clone(),
        }
    }

    fn job_skills(&self) -> impl Iterator<Item = &String> {
        self.job
            .required_skills
            .iter()
            .chain(self.job.preferred_skills.iter())
    }
}

/// Resume screening orchestrator
///
/// # Pipeline
/// 1. Normalize resume text
/// 2. Skills, experience, education and projects (structured signals)
/// 3. Semantic similarity, concurrently with step 2
/// 4. Aggregate into a scored, explained result
#[derive(Clone)]
pub struct Screener {
    semantic: SemanticEngine,
    aliases: Arc<SkillAliases>,
    workers: usize,
}

impl Screener {
    pub fn new(semantic: SemanticEngine, aliases: SkillAliases, workers: usize) -> Self {
        Self {
            semantic,
            aliases: Arc::new(aliases),
            workers: workers.max(1),
        }
    }

    /// Hash embeddings, builtin skill aliases, one worker per CPU
    pub fn with_defaults() -> Self {
        Self::new(SemanticEngine::default(), SkillAliases::builtin(), default_workers())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Score one resume against one job role
    ///
    /// Fails only for malformed input; missing data and embedding outages
    /// produce a complete result with degraded components.
    pub async fn evaluate(
        &self,
        resume: &ResumeExtract,
        job: &JobRoleSpec,
        config: &ScoringConfig,
    ) -> Result<ScoreResult, ContractViolation> {
        check_config(config)?;
        check_job(job)?;
        check_resume(resume)?;

        let prepared = PreparedJob::new(job);
        Ok(self.score(resume, &prepared, config).await)
    }

    /// Score many resumes against one job role, results in input order
    ///
    /// A malformed resume yields a zero-scored result noting the failure;
    /// only an invalid job or config fails the whole batch.
    pub async fn evaluate_batch(
        &self,
        resumes: &[ResumeExtract],
        job: &JobRoleSpec,
        config: &ScoringConfig,
    ) -> Result<Vec<ScoreResult>, ContractViolation> {
        let items = self
            .evaluate_batch_with_cancel(resumes, job, config, CancellationToken::new())
            .await?;
        Ok(items.into_iter().filter_map(BatchItem::into_result).collect())
    }

    /// Like `evaluate_batch`, stopping when `cancel` fires
    ///
    /// Items already running finish and keep their results; items still
    /// queued are reported as `BatchItem::Cancelled`.
    pub async fn evaluate_batch_with_cancel(
        &self,
        resumes: &[ResumeExtract],
        job: &JobRoleSpec,
        config: &ScoringConfig,
        cancel: CancellationToken,
    ) -> Result<Vec<BatchItem>, ContractViolation> {
        let inputs = resumes.iter().cloned().map(Ok).collect();
        self.run_batch(inputs, job, config, cancel).await
    }

    /// Score resumes given as raw JSON values
    ///
    /// Values that do not deserialize into a `ResumeExtract` become failed
    /// results instead of aborting the batch.
    pub async fn evaluate_batch_values(
        &self,
        values: Vec<serde_json::Value>,
        job: &JobRoleSpec,
        config: &ScoringConfig,
    ) -> Result<Vec<ScoreResult>, ContractViolation> {
        let items = self
            .evaluate_batch_values_with_cancel(values, job, config, CancellationToken::new())
            .await?;
        Ok(items.into_iter().filter_map(BatchItem::into_result).collect())
    }

    pub async fn evaluate_batch_values_with_cancel(
        &self,
        values: Vec<serde_json::Value>,
        job: &JobRoleSpec,
        config: &ScoringConfig,
        cancel: CancellationToken,
    ) -> Result<Vec<BatchItem>, ContractViolation> {
        let inputs = values
            .into_iter()
            .map(|value| {
                let candidate_id = value
                    .get("candidate_id")
                    .and_then(|id| id.as_str())
                    .map(str::to_string);
                serde_json::from_value::<ResumeExtract>(value)
                    .map_err(|e| UnparsedResume { candidate_id, reason: e.to_string() })
            })
            .collect();
        self.run_batch(inputs, job, config, cancel).await
    }

    async fn run_batch(
        &self,
        inputs: Vec<Result<ResumeExtract, UnparsedResume>>,
        job: &JobRoleSpec,
        config: &ScoringConfig,
        cancel: CancellationToken,
    ) -> Result<Vec<BatchItem>, ContractViolation> {
        check_config(config)?;
        check_job(job)?;

        let total = inputs.len();
        info!("Screening {} resumes for '{}' with {} workers", total, job.title, self.workers);

        let prepared = Arc::new(PreparedJob::new(job));
        let config = Arc::new(config.clone());
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(total);

        for input in inputs {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let candidate_id = match &input {
                Ok(resume) => resume.candidate_id.clone(),
                Err(unparsed) => unparsed.candidate_id.clone(),
            };
            let screener = self.clone();
            let prepared = prepared.clone();
            let task_config = config.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                screener.score_item(input, &prepared, &task_config).await
            });
            handles.push((candidate_id, handle));
        }

        let started = handles.len();
        let mut items = Vec::with_capacity(total);
        for (candidate_id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Evaluation task failed: {}", e);
                    failed_result(candidate_id, &format!("evaluation task failed: {}", e), &config)
                }
            };
            items.push(BatchItem::Scored(result));
        }
        items.resize(total, BatchItem::Cancelled);

        if started < total {
            info!("Batch cancelled: {} of {} resumes were not evaluated", total - started, total);
        } else {
            info!("Batch complete: {} resumes screened", total);
        }
        Ok(items)
    }

    async fn score_item(
        &self,
        input: Result<ResumeExtract, UnparsedResume>,
        prepared: &PreparedJob,
        config: &ScoringConfig,
    ) -> ScoreResult {
        let resume = match input {
            Ok(resume) => resume,
            Err(unparsed) => {
                warn!(candidate = ?unparsed.candidate_id, "Unparseable resume extract: {}", unparsed.reason);
                let reason = format!("unparseable resume extract: {}", unparsed.reason);
                return failed_result(unparsed.candidate_id, &reason, config);
            }
        };
        if let Err(violation) = check_resume(&resume) {
            warn!(candidate = ?resume.candidate_id, "Skipping malformed resume: {}", violation);
            return failed_result(resume.candidate_id.clone(), &violation.to_string(), config);
        }
        self.score(&resume, prepared, config).await
    }

    /// Fan out to the semantic engine and the structured extractors, then join
    async fn score(
        &self,
        resume: &ResumeExtract,
        prepared: &PreparedJob,
        config: &ScoringConfig,
    ) -> ScoreResult {
        let text = normalize(&resume.raw_text);

        let semantic = self.semantic.score(&text, &prepared.description);
        let structured = async { self.structured_signals(resume, &text, prepared, config) };
        let (semantic, mut signals) = tokio::join!(semantic, structured);
        signals.semantic = semantic;

        let result = aggregate(resume.candidate_id.clone(), signals, &prepared.job, config);
        debug!(
            candidate = ?result.candidate_id,
            final_score = result.final_score,
            shortlisted = result.shortlisted,
            degraded = ?result.degraded,
            "Evaluated resume"
        );
        result
    }

    fn structured_signals(
        &self,
        resume: &ResumeExtract,
        text: &NormalizedText,
        prepared: &PreparedJob,
        config: &ScoringConfig,
    ) -> Signals {
        let job = &prepared.job;
        let infer = config.infer_missing_signals;

        let mut candidate_skills: Vec<String> = resume
            .extracted_skills
            .iter()
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect();
        if candidate_skills.is_empty() && infer {
            candidate_skills = skills_in_text(text, prepared.job_skills(), &self.aliases);
        }
        let skills = match_skills(
            &candidate_skills,
            &job.required_skills,
            &job.preferred_skills,
            &self.aliases,
            config.preferred_bonus_cap,
        );

        let experience_years = resume
            .experience_years
            .or_else(|| infer.then(|| infer_experience_years(text)).flatten());
        let education_level = resume
            .education_level
            .or_else(|| infer.then(|| infer_education_level(text)).flatten());

        Signals {
            has_skills: !candidate_skills.is_empty(),
            skills,
            experience: experience_score(experience_years, job.required_experience_years),
            experience_years,
            education: education_score(education_level, job.required_education_level),
            education_level,
            projects: project_score(&resume.project_descriptions, &prepared.terms),
            semantic: SemanticSignal::Unavailable("not computed".to_string()),
        }
    }
}

impl Default for Screener {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// One worker per available CPU
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EducationLevel;

    fn job() -> JobRoleSpec {
        JobRoleSpec {
            title: "Backend Engineer".to_string(),
            description: "Design and operate Rust services backed by PostgreSQL".to_string(),
            required_skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            preferred_skills: vec!["Kubernetes".to_string()],
            required_experience_years: 2.0,
            required_education_level: EducationLevel::Bachelor,
        }
    }

    fn resume(id: &str) -> ResumeExtract {
        ResumeExtract {
            candidate_id: Some(id.to_string()),
            raw_text: "Rust engineer operating PostgreSQL backed services on Kubernetes".to_string(),
            extracted_skills: vec!["rust".to_string(), "postgres".to_string(), "k8s".to_string()],
            experience_years: Some(3.0),
            education_level: Some(EducationLevel::Master),
            project_descriptions: vec!["Rust ingestion service writing to PostgreSQL".to_string()],
        }
    }

    #[tokio::test]
    async fn test_evaluate_strong_candidate() {
        let screener = Screener::with_defaults();
        let result = screener
            .evaluate(&resume("1"), &job(), &ScoringConfig::default())
            .await
            .unwrap();

        assert_eq!(result.candidate_id.as_deref(), Some("1"));
        assert_eq!(result.breakdown.components.skills, 1.0);
        assert_eq!(result.breakdown.components.experience, 1.0);
        assert_eq!(result.breakdown.components.education, 1.0);
        assert_eq!(result.matched_skills, vec!["PostgreSQL", "Rust", "Kubernetes"]);
        assert!(result.missing_skills.is_empty());
        assert!(result.degraded.is_empty());
    }

    #[tokio::test]
    async fn test_infers_missing_fields_from_text() {
        let screener = Screener::with_defaults();
        let resume = ResumeExtract {
            raw_text: "Rust developer with 4 years of experience. B.Sc in Computer Science. Skills: Rust, Postgres".to_string(),
            ..ResumeExtract::default()
        };

        let result = screener
            .evaluate(&resume, &job(), &ScoringConfig::default())
            .await
            .unwrap();
        assert_eq!(result.breakdown.components.experience, 1.0);
        assert_eq!(result.breakdown.components.education, 1.0);
        assert_eq!(result.breakdown.components.skills, 1.0);

        let strict = ScoringConfig {
            infer_missing_signals: false,
            ..ScoringConfig::default()
        };
        let result = screener.evaluate(&resume, &job(), &strict).await.unwrap();
        assert_eq!(result.breakdown.components.experience, 0.0);
        assert_eq!(result.breakdown.components.education, 0.0);
        assert_eq!(result.breakdown.components.skills, 0.0);
    }

    #[tokio::test]
    async fn test_evaluate_rejects_malformed_input() {
        let screener = Screener::with_defaults();
        let mut bad = resume("1");
        bad.experience_years = Some(-1.0);

        let err = screener.evaluate(&bad, &job(), &ScoringConfig::default()).await;
        assert!(matches!(err, Err(ContractViolation::InvalidResume(_))));
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let screener = Screener::new(SemanticEngine::default(), SkillAliases::builtin(), 2);
        let resumes: Vec<_> = (0..10).map(|i| resume(&i.to_string())).collect();

        let results = screener
            .evaluate_batch(&resumes, &job(), &ScoringConfig::default())
            .await
            .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.candidate_id.clone().unwrap()).collect();
        let expected: Vec<_> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_batch_cancelled_before_start() {
        let screener = Screener::with_defaults();
        let resumes: Vec<_> = (0..3).map(|i| resume(&i.to_string())).collect();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let items = screener
            .evaluate_batch_with_cancel(&resumes, &job(), &ScoringConfig::default(), cancel)
            .await
            .unwrap();

        assert_eq!(items.len(), 3);
        assert!(items.iter().all(BatchItem::is_cancelled));
    }

    #[tokio::test]
    async fn test_batch_values_isolate_unparseable_items() {
        let screener = Screener::with_defaults();
        let values = vec![
            serde_json::to_value(resume("a")).unwrap(),
            serde_json::json!({ "candidate_id": "b", "raw_text": 42 }),
        ];

        let results = screener
            .evaluate_batch_values(values, &job(), &ScoringConfig::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].final_score > 0);
        assert_eq!(results[1].final_score, 0);
        assert_eq!(results[1].candidate_id.as_deref(), Some("b"));
        assert!(results[1].suggestions[0].contains("unparseable"));
    }
}
