use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use validator::Validate;

use crate::core::signals::ProjectSignal;
use crate::core::similarity::SemanticSignal;
use crate::core::skills::{SkillMatch, PREFERRED_BONUS_CAP};
use crate::models::{
    Component, ComponentScores, EducationLevel, JobRoleSpec, ScoreBreakdown, ScoreResult,
    ScoringWeights,
};

/// Canonical component weights, overridable through `ScoringConfig`
pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    semantic: 0.40,
    skills: 0.30,
    experience: 0.15,
    education: 0.10,
    projects: 0.05,
};

/// Final score at or above which a candidate is shortlisted
pub const DEFAULT_SHORTLIST_THRESHOLD: u8 = 70;

/// Per-component scores below which a suggestion is emitted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct ComponentFloors {
    #[validate(range(min = 0.0, max = 1.0))]
    pub skills: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub experience: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub education: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub projects: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub semantic: f64,
}

impl ComponentFloors {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Skills => self.skills,
            Component::Experience => self.experience,
            Component::Education => self.education,
            Component::Projects => self.projects,
            Component::Semantic => self.semantic,
        }
    }
}

impl Default for ComponentFloors {
    fn default() -> Self {
        Self {
            skills: 0.5,
            experience: 1.0,
            education: 1.0,
            projects: 0.5,
            semantic: 0.25,
        }
    }
}

/// Immutable scoring parameters passed into every evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// 0-100
    pub shortlist_threshold: u8,
    #[validate(nested)]
    pub floors: ComponentFloors,
    #[validate(range(min = 0.0, max = 1.0))]
    pub preferred_bonus_cap: f64,
    /// Derive missing experience, education and skills from resume text
    pub infer_missing_signals: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            shortlist_threshold: DEFAULT_SHORTLIST_THRESHOLD,
            floors: ComponentFloors::default(),
            preferred_bonus_cap: PREFERRED_BONUS_CAP,
            infer_missing_signals: true,
        }
    }
}

/// Everything the aggregator needs about one (resume, job) pair
#[derive(Debug, Clone)]
pub struct Signals {
    pub skills: SkillMatch,
    /// Whether the candidate had any skills at all
    pub has_skills: bool,
    pub experience_years: Option<f64>,
    pub experience: f64,
    pub education_level: Option<EducationLevel>,
    pub education: f64,
    pub projects: ProjectSignal,
    pub semantic: SemanticSignal,
}

/// Weighted sum of component scores in [0, 1]
pub fn weighted_sum(scores: &ComponentScores, weights: &ScoringWeights) -> f64 {
    Component::ALL
        .iter()
        .map(|c| scores.get(*c) * weights.get(*c))
        .sum()
}

/// Round a raw [0, 1] score to an integer 0-100
#[inline]
pub fn to_final_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    (raw * 100.0).round().clamp(0.0, 100.0) as u8
}

fn contributions(scores: &ComponentScores, weights: &ScoringWeights) -> ComponentScores {
    ComponentScores {
        semantic: scores.semantic * weights.semantic * 100.0,
        skills: scores.skills * weights.skills * 100.0,
        experience: scores.experience * weights.experience * 100.0,
        education: scores.education * weights.education * 100.0,
        projects: scores.projects * weights.projects * 100.0,
    }
}

/// Years rounded to one decimal without a trailing ".0"
fn years(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    format_years(rounded)
}

/// Shortfall rounded up to one decimal, so any gap shows as at least 0.1
fn shortfall_years(value: f64) -> String {
    // tolerance keeps float noise such as 7.000000000000001 from rounding up
    let rounded = ((value * 10.0 - 1e-9).ceil() / 10.0).max(0.1);
    format_years(rounded)
}

fn format_years(rounded: f64) -> String {
    if (rounded - 1.0).abs() < f64::EPSILON {
        "1 year".to_string()
    } else {
        format!("{} years", rounded)
    }
}

fn suggestion_for(
    component: Component,
    signals: &Signals,
    job: &JobRoleSpec,
    scores: &ComponentScores,
    config: &ScoringConfig,
) -> Option<String> {
    if let (Component::Semantic, SemanticSignal::Unavailable(reason)) = (component, &signals.semantic) {
        return Some(format!("Semantic scoring unavailable: {}", reason));
    }
    if scores.get(component) >= config.floors.get(component) {
        return None;
    }

    let text = match component {
        Component::Skills if !signals.has_skills => format!(
            "No skills could be extracted from the resume; the role requires {}",
            signals.skills.missing.join(", ")
        ),
        Component::Skills => format!(
            "Missing required skills: {}",
            signals.skills.missing.join(", ")
        ),
        Component::Experience => match signals.experience_years {
            None => format!(
                "Could not determine experience; the role requires {}",
                years(job.required_experience_years)
            ),
            Some(have) => format!(
                "Experience shortfall: {} below the {} required",
                shortfall_years(job.required_experience_years - have),
                years(job.required_experience_years)
            ),
        },
        Component::Education => match signals.education_level {
            None => format!(
                "Could not determine education level; the role requires a {} degree or higher",
                job.required_education_level
            ),
            Some(have) => format!(
                "The role requires a {} degree or higher; the resume shows {}",
                job.required_education_level, have
            ),
        },
        Component::Projects if signals.projects.considered == 0 => format!(
            "No project descriptions found; add projects relevant to {}",
            job.title
        ),
        Component::Projects => format!(
            "Only {} of {} projects relate to {}; highlight work that uses the role's key skills",
            signals.projects.relevant, signals.projects.considered, job.title
        ),
        Component::Semantic => "Resume content is weakly aligned with the job description; \
             describe experience in terms of the role's responsibilities"
            .to_string(),
    };
    Some(text)
}

fn degraded_components(signals: &Signals, job: &JobRoleSpec) -> Vec<Component> {
    Component::ALL
        .into_iter()
        .filter(|c| match c {
            Component::Skills => !signals.has_skills && signals.skills.required_total > 0,
            Component::Experience => {
                signals.experience_years.is_none() && job.required_experience_years > 0.0
            }
            Component::Education => {
                signals.education_level.is_none()
                    && job.required_education_level != EducationLevel::None
            }
            Component::Projects => signals.projects.considered == 0,
            Component::Semantic => !signals.semantic.is_available(),
        })
        .collect()
}

fn summary(shortlisted: bool, job: &JobRoleSpec, config: &ScoringConfig) -> String {
    if shortlisted {
        format!("Strong candidate, well matched for {}", job.title)
    } else {
        format!(
            "Below the shortlist threshold of {} for {}",
            config.shortlist_threshold, job.title
        )
    }
}

/// Combine component signals into the final, explained result
pub fn aggregate(
    candidate_id: Option<String>,
    signals: Signals,
    job: &JobRoleSpec,
    config: &ScoringConfig,
) -> ScoreResult {
    let components = ComponentScores {
        semantic: signals.semantic.score().clamp(0.0, 1.0),
        skills: signals.skills.score.clamp(0.0, 1.0),
        experience: signals.experience.clamp(0.0, 1.0),
        education: signals.education.clamp(0.0, 1.0),
        projects: signals.projects.score.clamp(0.0, 1.0),
    };

    let final_score = to_final_score(weighted_sum(&components, &config.weights));
    let shortlisted = final_score >= config.shortlist_threshold;

    let suggestions = Component::ALL
        .into_iter()
        .filter_map(|c| suggestion_for(c, &signals, job, &components, config))
        .collect();

    ScoreResult {
        candidate_id,
        final_score,
        shortlisted,
        breakdown: ScoreBreakdown {
            components,
            weights: config.weights,
            contributions: contributions(&components, &config.weights),
        },
        matched_skills: signals.skills.matched.clone(),
        missing_skills: signals.skills.missing.clone(),
        extra_skills: signals.skills.extra.clone(),
        suggestions,
        degraded: degraded_components(&signals, job),
        summary: summary(shortlisted, job, config),
    }
}

/// Zero-scored result for a resume that could not be evaluated
pub fn failed_result(candidate_id: Option<String>, reason: &str, config: &ScoringConfig) -> ScoreResult {
    let components = ComponentScores::default();
    ScoreResult {
        candidate_id,
        final_score: 0,
        shortlisted: false,
        breakdown: ScoreBreakdown {
            components,
            weights: config.weights,
            contributions: components,
        },
        matched_skills: vec![],
        missing_skills: vec![],
        extra_skills: vec![],
        suggestions: vec![format!("Resume could not be evaluated: {}", reason)],
        degraded: Component::ALL.to_vec(),
        summary: "Could not evaluate resume".to_string(),
    }
}

/// Result indices ordered best first
///
/// Ties that `compare_results` leaves equal keep input order, so equal
/// inputs always rank identically.
pub fn rank(results: &[ScoreResult]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..results.len()).collect();
    order.sort_by(|&a, &b| compare_results(&results[a], &results[b]).then(a.cmp(&b)));
    order
}

/// Best first: final score, then skills, then semantic similarity
pub fn compare_results(a: &ScoreResult, b: &ScoreResult) -> Ordering {
    let (ca, cb) = (&a.breakdown.components, &b.breakdown.components);
    b.final_score
        .cmp(&a.final_score)
        .then_with(|| cb.skills.total_cmp(&ca.skills))
        .then_with(|| cb.semantic.total_cmp(&ca.semantic))
}
