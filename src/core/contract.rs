use thiserror::Error;
use validator::Validate;

use crate::core::scoring::ScoringConfig;
use crate::models::{Component, JobRoleSpec, ResumeExtract};

/// Weights may deviate from a sum of 1.0 by at most this much
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Malformed input that cannot be scored
///
/// Missing or unknown data is never a violation; it scores zero with a
/// suggestion instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    #[error("Invalid job role: {0}")]
    InvalidJob(String),

    #[error("Invalid resume extract: {0}")]
    InvalidResume(String),

    #[error("Invalid scoring config: {0}")]
    InvalidConfig(String),

    #[error("Weights must sum to 1.0, got {0}")]
    WeightSum(f64),

    #[error("Weight for {component} must be within [0, 1], got {value}")]
    WeightRange { component: Component, value: f64 },
}

fn not_finite(value: f64) -> bool {
    !value.is_finite()
}

pub fn check_job(job: &JobRoleSpec) -> Result<(), ContractViolation> {
    if not_finite(job.required_experience_years) {
        return Err(ContractViolation::InvalidJob(
            "required_experience_years must be a finite number".to_string(),
        ));
    }
    job.validate()
        .map_err(|e| ContractViolation::InvalidJob(e.to_string()))?;
    if job.title.trim().is_empty() {
        return Err(ContractViolation::InvalidJob("title must not be blank".to_string()));
    }
    Ok(())
}

pub fn check_resume(resume: &ResumeExtract) -> Result<(), ContractViolation> {
    if resume.experience_years.is_some_and(not_finite) {
        return Err(ContractViolation::InvalidResume(
            "experience_years must be a finite number".to_string(),
        ));
    }
    resume
        .validate()
        .map_err(|e| ContractViolation::InvalidResume(e.to_string()))
}

pub fn check_config(config: &ScoringConfig) -> Result<(), ContractViolation> {
    for component in Component::ALL {
        let value = config.weights.get(component);
        if not_finite(value) || !(0.0..=1.0).contains(&value) {
            return Err(ContractViolation::WeightRange { component, value });
        }
    }

    if config.shortlist_threshold > 100 {
        return Err(ContractViolation::InvalidConfig(format!(
            "shortlist_threshold must be within [0, 100], got {}",
            config.shortlist_threshold
        )));
    }

    let sum = config.weights.sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ContractViolation::WeightSum(sum));
    }

    let floors = &config.floors;
    let any_nan = Component::ALL
        .iter()
        .any(|c| not_finite(floors.get(*c)))
        || not_finite(config.preferred_bonus_cap);
    if any_nan {
        return Err(ContractViolation::InvalidConfig(
            "floors and bonus cap must be finite".to_string(),
        ));
    }

    config
        .validate()
        .map_err(|e| ContractViolation::InvalidConfig(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EducationLevel, ScoringWeights};

    fn job() -> JobRoleSpec {
        JobRoleSpec {
            title: "Backend Engineer".to_string(),
            description: String::new(),
            required_skills: vec![],
            preferred_skills: vec![],
            required_experience_years: 2.0,
            required_education_level: EducationLevel::Bachelor,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(check_config(&ScoringConfig::default()), Ok(()));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let config = ScoringConfig {
            weights: ScoringWeights {
                semantic: 0.30,
                skills: 0.20,
                experience: 0.25,
                education: 0.15,
                projects: 0.05,
            },
            ..ScoringConfig::default()
        };

        assert!(matches!(check_config(&config), Err(ContractViolation::WeightSum(_))));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = ScoringConfig {
            weights: ScoringWeights {
                semantic: 1.1,
                skills: -0.1,
                experience: 0.0,
                education: 0.0,
                projects: 0.0,
            },
            ..ScoringConfig::default()
        };

        assert!(matches!(check_config(&config), Err(ContractViolation::WeightRange { .. })));
    }

    #[test]
    fn test_threshold_above_100_rejected() {
        let config = ScoringConfig {
            shortlist_threshold: 101,
            ..ScoringConfig::default()
        };
        assert!(matches!(check_config(&config), Err(ContractViolation::InvalidConfig(_))));
    }

    #[test]
    fn test_floor_outside_unit_interval_rejected() {
        let mut config = ScoringConfig::default();
        config.floors.skills = 1.5;
        assert!(matches!(check_config(&config), Err(ContractViolation::InvalidConfig(_))));

        config.floors.skills = f64::NAN;
        assert!(matches!(check_config(&config), Err(ContractViolation::InvalidConfig(_))));
    }

    #[test]
    fn test_job_checks() {
        assert!(check_job(&job()).is_ok());

        let mut blank = job();
        blank.title = "   ".to_string();
        assert!(check_job(&blank).is_err());

        let mut negative = job();
        negative.required_experience_years = -1.0;
        assert!(check_job(&negative).is_err());

        let mut nan = job();
        nan.required_experience_years = f64::NAN;
        assert!(check_job(&nan).is_err());
    }

    #[test]
    fn test_resume_checks() {
        assert!(check_resume(&ResumeExtract::default()).is_ok());

        let negative = ResumeExtract {
            experience_years: Some(-2.0),
            ..ResumeExtract::default()
        };
        assert!(matches!(check_resume(&negative), Err(ContractViolation::InvalidResume(_))));

        let veteran = ResumeExtract {
            experience_years: Some(85.0),
            ..ResumeExtract::default()
        };
        assert_eq!(check_resume(&veteran), Ok(()));

        let infinite = ResumeExtract {
            experience_years: Some(f64::INFINITY),
            ..ResumeExtract::default()
        };
        assert!(check_resume(&infinite).is_err());
    }
}
