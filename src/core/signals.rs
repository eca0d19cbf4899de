use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::core::normalizer::{is_stopword, normalize, raw_tokens, NormalizedText};
use crate::core::skills::contains_phrase;
use crate::models::{EducationLevel, JobRoleSpec};

/// Credit for a candidate exactly one education level below the requirement
pub const EDUCATION_ONE_LEVEL_BELOW_CREDIT: f64 = 0.5;

/// Distinct job terms a project must mention to count as relevant
pub const MIN_RELEVANT_TERM_HITS: usize = 2;

/// Relevant projects needed for a full project score
pub const PROJECT_SATURATION: usize = 3;

/// Text claims above this many years are treated as misreads (dates, ids)
pub const MAX_INFERRED_YEARS: f64 = 60.0;

/// Description keywords shorter than this are ignored as job terms
const MIN_KEYWORD_LEN: usize = 3;

static RE_YEARS_OF_EXPERIENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)\s*(?:of\s*)?(?:professional\s+|work\s+|industry\s+)?(?:experience|exp)\b")
        .unwrap()
});

static RE_EXPERIENCE_COLON_YEARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:experience|exp)\s*[:;-]?\s*(\d+(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)\b").unwrap()
});

/// Degree abbreviations match on their own; "master" and "bachelor" only in
/// degree context, so "scrum master" is not a master's degree
static RE_DEGREE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b(?:(ph\.?\s?d|doctorate|m\.?\s?sc|m\.?\s?tech|mba|b\.?\s?sc|b\.?\s?tech|b\.\s?e|high\s+school|diploma)",
        r"|(master|bachelor|doctoral)(?:['’]?s)?\s+(?:of|in|degree)|(masters|bachelors))\b",
    ))
    .unwrap()
});

/// Experience component score
///
/// `None` means the years could not be determined and scores 0.
pub fn experience_score(years: Option<f64>, required_years: f64) -> f64 {
    if required_years <= 0.0 {
        return 1.0;
    }
    match years {
        Some(y) => (y.max(0.0) / required_years).min(1.0),
        None => 0.0,
    }
}

/// Education component score
///
/// Meeting the requirement scores 1.0, one level short scores
/// `EDUCATION_ONE_LEVEL_BELOW_CREDIT`, anything further scores 0. A role
/// without an education requirement always scores 1.0.
pub fn education_score(level: Option<EducationLevel>, required: EducationLevel) -> f64 {
    if required == EducationLevel::None {
        return 1.0;
    }
    let Some(level) = level else {
        return 0.0;
    };
    if level >= required {
        return 1.0;
    }
    match required.rank() - level.rank() {
        1 => EDUCATION_ONE_LEVEL_BELOW_CREDIT,
        _ => 0.0,
    }
}

/// Terms that make a project relevant to a job
#[derive(Debug, Clone, Default)]
pub struct JobTerms {
    /// Normalized skill phrases, matched as token runs
    phrases: Vec<String>,
    /// Single-token keywords from the title and description
    keywords: BTreeSet<String>,
}

impl JobTerms {
    pub fn from_job(job: &JobRoleSpec) -> Self {
        let mut phrases: Vec<String> = job
            .required_skills
            .iter()
            .chain(job.preferred_skills.iter())
            .map(|s| normalize(s).canonical)
            .filter(|s| !s.is_empty())
            .collect();
        phrases.sort();
        phrases.dedup();

        let keywords = normalize(&job.title)
            .tokens
            .into_iter()
            .chain(normalize(&job.description).tokens)
            .filter(|t| is_keyword(t) && !t.chars().all(|c| c.is_numeric()))
            .collect();

        Self { phrases, keywords }
    }

    /// Number of distinct job terms mentioned in `text`
    pub fn hits(&self, text: &NormalizedText) -> usize {
        let tokens: Vec<String> = raw_tokens(&text.canonical).collect();
        let phrase_hits = self
            .phrases
            .iter()
            .filter(|p| contains_phrase(&tokens, p))
            .count();

        let seen: BTreeSet<&str> = text.tokens.iter().map(String::as_str).collect();
        let keyword_hits = self
            .keywords
            .iter()
            .filter(|k| seen.contains(k.as_str()) && !self.phrases.contains(*k))
            .count();

        phrase_hits + keyword_hits
    }
}

/// Project relevance outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectSignal {
    pub score: f64,
    pub relevant: usize,
    pub considered: usize,
}

/// Project component score from the candidate's project descriptions
pub fn project_score(projects: &[String], terms: &JobTerms) -> ProjectSignal {
    let mut considered = 0;
    let mut relevant = 0;

    for project in projects {
        let text = normalize(project);
        if text.tokens.is_empty() {
            continue;
        }
        considered += 1;
        if terms.hits(&text) >= MIN_RELEVANT_TERM_HITS {
            relevant += 1;
        }
    }

    let score = relevant.min(PROJECT_SATURATION) as f64 / PROJECT_SATURATION as f64;
    ProjectSignal {
        score,
        relevant,
        considered,
    }
}

/// Years of experience stated in resume text, the largest claim wins
pub fn infer_experience_years(text: &NormalizedText) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    RE_YEARS_OF_EXPERIENCE
        .captures_iter(&text.canonical)
        .chain(RE_EXPERIENCE_COLON_YEARS.captures_iter(&text.canonical))
        .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
        .filter(|y| y.is_finite() && *y <= MAX_INFERRED_YEARS)
        .fold(None, |best: Option<f64>, y| Some(best.map_or(y, |b| b.max(y))))
}

/// Highest degree mentioned in resume text
pub fn infer_education_level(text: &NormalizedText) -> Option<EducationLevel> {
    if text.is_empty() {
        return None;
    }
    RE_DEGREE
        .captures_iter(&text.canonical)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .filter_map(|m| EducationLevel::parse(m.as_str()))
        .max()
}

/// Whether a token carries meaning for relevance matching
#[inline]
pub fn is_keyword(token: &str) -> bool {
    token.chars().count() >= MIN_KEYWORD_LEN && !is_stopword(token)
}
