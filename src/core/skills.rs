use std::collections::{BTreeSet, HashMap, HashSet};

use crate::core::normalizer::{normalize_phrase, raw_tokens, NormalizedText};

/// Maximum skills-score bonus earned from preferred skills
pub const PREFERRED_BONUS_CAP: f64 = 0.15;

/// Extra candidate skills reported per result
pub const MAX_EXTRA_SKILLS: usize = 5;

/// Skill spellings that are also everyday English words
///
/// Free-text inference skips them; explicit skill lists still match them.
const AMBIGUOUS_SPELLINGS: &[&str] = &["go", "r", "c", "swift", "spring", "express", "dart"];

/// Default alias → canonical table
const DEFAULT_ALIASES: &[(&str, &[&str])] = &[
    ("javascript", &["js", "java script", "ecmascript", "es6"]),
    ("typescript", &["ts", "type script"]),
    ("nodejs", &["node.js", "node js", "node"]),
    ("react", &["reactjs", "react.js", "react js"]),
    ("vue", &["vue.js", "vuejs"]),
    ("angular", &["angularjs", "angular.js"]),
    ("postgresql", &["postgres", "postgre sql"]),
    ("mongodb", &["mongo", "mongo db"]),
    ("kubernetes", &["k8s"]),
    ("aws", &["amazon web services"]),
    ("gcp", &["google cloud platform", "google cloud"]),
    ("azure", &["microsoft azure"]),
    ("python", &["python3", "python 3", "py"]),
    ("golang", &["go lang", "go"]),
    ("c++", &["cpp", "cplusplus"]),
    ("c#", &["csharp", "c sharp"]),
    ("machine learning", &["ml"]),
    ("deep learning", &["dl"]),
    ("scikit-learn", &["sklearn", "scikit learn"]),
    ("power bi", &["powerbi"]),
    ("ci/cd", &["cicd", "ci cd"]),
];

/// Configurable alias table mapping skill spellings to one canonical key
///
/// Keys and values are stored normalized; lookups normalize their input the
/// same way, so "JS", " js " and "Js" resolve identically.
#[derive(Debug, Clone, Default)]
pub struct SkillAliases {
    table: HashMap<String, String>,
}

impl SkillAliases {
    /// Table without any aliases; skills only match on exact normalized text
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in table of common technology spellings
    pub fn builtin() -> Self {
        let mut aliases = Self::empty();
        for (canonical, spellings) in DEFAULT_ALIASES {
            for spelling in *spellings {
                aliases.insert(spelling, canonical);
            }
        }
        aliases
    }

    /// Builtin table extended (and overridden) by `extra`
    pub fn with_overrides<'a, I>(extra: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut aliases = Self::builtin();
        for (alias, canonical) in extra {
            aliases.insert(alias, canonical);
        }
        aliases
    }

    /// Map `alias` to `canonical`
    ///
    /// Keeps every value a fixed point: `canonical` stops being an alias of
    /// anything else, and spellings that pointed at `alias` follow it to
    /// `canonical`. A single lookup therefore always lands on a canonical key.
    pub fn insert(&mut self, alias: &str, canonical: &str) {
        let alias = normalize_phrase(alias);
        let canonical = normalize_phrase(canonical);
        if alias.is_empty() || canonical.is_empty() || alias == canonical {
            return;
        }
        self.table.remove(&canonical);
        for target in self.table.values_mut() {
            if *target == alias {
                *target = canonical.clone();
            }
        }
        self.table.insert(alias, canonical);
    }

    /// Canonical key for a skill spelling
    pub fn resolve(&self, skill: &str) -> String {
        let key = normalize_phrase(skill);
        match self.table.get(&key) {
            Some(canonical) => canonical.clone(),
            None => key,
        }
    }

    /// All spellings (canonical included) that resolve to `canonical`
    pub fn spellings_of(&self, canonical: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .table
            .iter()
            .filter(|(_, c)| c.as_str() == canonical)
            .map(|(alias, _)| alias.clone())
            .collect();
        out.push(canonical.to_string());
        out.sort();
        out
    }

}

/// Skill overlap between a resume and a job role
#[derive(Debug, Clone, PartialEq)]
pub struct SkillMatch {
    pub score: f64,
    /// Job skills the candidate has, required first, in the job's spelling
    pub matched: Vec<String>,
    /// Required skills the candidate lacks, in the job's spelling
    pub missing: Vec<String>,
    /// Candidate skills outside the job's lists
    pub extra: Vec<String>,
    pub required_matched: usize,
    pub required_total: usize,
    pub preferred_matched: usize,
}

/// Canonical key → first spelling seen, keys sorted
fn canonical_map(skills: &[String], aliases: &SkillAliases) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    let mut out: Vec<(String, String)> = skills
        .iter()
        .filter_map(|s| {
            let key = aliases.resolve(s);
            if key.is_empty() || !seen.insert(key.clone()) {
                return None;
            }
            Some((key, s.trim().to_string()))
        })
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

/// Compare extracted skills against a job's required and preferred skills
///
/// `score = |matched ∩ required| / |required|` plus a preferred bonus of up to
/// `bonus_cap`, capped at 1.0. An empty required list earns full credit.
pub fn match_skills(
    extracted: &[String],
    required: &[String],
    preferred: &[String],
    aliases: &SkillAliases,
    bonus_cap: f64,
) -> SkillMatch {
    let candidate: BTreeSet<String> = extracted
        .iter()
        .map(|s| aliases.resolve(s))
        .filter(|s| !s.is_empty())
        .collect();

    let required = canonical_map(required, aliases);
    let required_keys: HashSet<&str> = required.iter().map(|(k, _)| k.as_str()).collect();
    // A skill listed as both required and preferred counts as required
    let preferred: Vec<(String, String)> = canonical_map(preferred, aliases)
        .into_iter()
        .filter(|(k, _)| !required_keys.contains(k.as_str()))
        .collect();

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    for (key, display) in &required {
        if candidate.contains(key) {
            matched.push(display.clone());
        } else {
            missing.push(display.clone());
        }
    }
    let required_matched = matched.len();

    let mut preferred_matched = 0;
    for (key, display) in &preferred {
        if candidate.contains(key) {
            matched.push(display.clone());
            preferred_matched += 1;
        }
    }

    let job_keys: HashSet<&str> = required
        .iter()
        .chain(preferred.iter())
        .map(|(k, _)| k.as_str())
        .collect();
    let extra: Vec<String> = candidate
        .iter()
        .filter(|k| !job_keys.contains(k.as_str()))
        .take(MAX_EXTRA_SKILLS)
        .cloned()
        .collect();

    let score = if required.is_empty() {
        1.0
    } else {
        let base = required_matched as f64 / required.len() as f64;
        let bonus = if preferred.is_empty() {
            0.0
        } else {
            bonus_cap.clamp(0.0, 1.0) * preferred_matched as f64 / preferred.len() as f64
        };
        (base + bonus).min(1.0)
    };

    SkillMatch {
        score,
        matched,
        missing,
        extra,
        required_matched,
        required_total: required.len(),
        preferred_matched,
    }
}

/// Find job skills mentioned in free text
///
/// Used when the upstream parser delivered no skill list. A skill is found
/// when any of its spellings appears as a whole token sequence; spellings
/// that double as common words ("go", "swift") are not searched for.
pub fn skills_in_text(
    text: &NormalizedText,
    job_skills: impl IntoIterator<Item = impl AsRef<str>>,
    aliases: &SkillAliases,
) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let tokens: Vec<String> = raw_tokens(&text.canonical).collect();

    let mut found = BTreeSet::new();
    for skill in job_skills {
        let canonical = aliases.resolve(skill.as_ref());
        if canonical.is_empty() {
            continue;
        }
        let hit = aliases
            .spellings_of(&canonical)
            .iter()
            .filter(|spelling| !AMBIGUOUS_SPELLINGS.contains(&spelling.as_str()))
            .any(|spelling| contains_phrase(&tokens, spelling));
        if hit {
            found.insert(canonical);
        }
    }
    found.into_iter().collect()
}

/// Whether `phrase` occurs as a contiguous token run in `tokens`
pub(crate) fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let needle: Vec<String> = raw_tokens(phrase).collect();
    if needle.is_empty() || needle.len() > tokens.len() {
        return false;
    }
    tokens.windows(needle.len()).any(|w| w == needle.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalizer::normalize;

    fn skills(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_required_match() {
        let result = match_skills(
            &skills(&["Python", "SQL", "AWS"]),
            &skills(&["python", "sql"]),
            &[],
            &SkillAliases::builtin(),
            PREFERRED_BONUS_CAP,
        );

        assert_eq!(result.score, 1.0);
        assert_eq!(result.matched, vec!["python", "sql"]);
        assert!(result.missing.is_empty());
        assert_eq!(result.extra, vec!["aws"]);
    }

    #[test]
    fn test_partial_match_reports_missing_in_job_spelling() {
        let result = match_skills(
            &skills(&["python"]),
            &skills(&["Python", "Docker", "Kubernetes"]),
            &[],
            &SkillAliases::builtin(),
            PREFERRED_BONUS_CAP,
        );

        assert!((result.score - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.matched, vec!["Python"]);
        assert_eq!(result.missing, vec!["Docker", "Kubernetes"]);
    }

    #[test]
    fn test_no_required_skills_gives_full_credit() {
        let result = match_skills(&[], &[], &skills(&["rust"]), &SkillAliases::builtin(), 0.15);
        assert_eq!(result.score, 1.0);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_aliases_resolve_before_matching() {
        let result = match_skills(
            &skills(&["JS", "k8s"]),
            &skills(&["JavaScript", "Kubernetes"]),
            &[],
            &SkillAliases::builtin(),
            PREFERRED_BONUS_CAP,
        );
        assert_eq!(result.score, 1.0);

        let strict = match_skills(
            &skills(&["JS", "k8s"]),
            &skills(&["JavaScript", "Kubernetes"]),
            &[],
            &SkillAliases::empty(),
            PREFERRED_BONUS_CAP,
        );
        assert_eq!(strict.score, 0.0);
    }

    #[test]
    fn test_preferred_bonus_is_capped() {
        let result = match_skills(
            &skills(&["python", "docker", "terraform"]),
            &skills(&["python", "sql"]),
            &skills(&["docker", "terraform"]),
            &SkillAliases::builtin(),
            PREFERRED_BONUS_CAP,
        );

        assert!((result.score - (0.5 + PREFERRED_BONUS_CAP)).abs() < 1e-9);
        assert_eq!(result.preferred_matched, 2);
        assert_eq!(result.matched, vec!["python", "docker", "terraform"]);
    }

    #[test]
    fn test_score_never_exceeds_one() {
        let result = match_skills(
            &skills(&["python", "docker"]),
            &skills(&["python"]),
            &skills(&["docker"]),
            &SkillAliases::builtin(),
            PREFERRED_BONUS_CAP,
        );
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_duplicate_and_whitespace_skills() {
        let result = match_skills(
            &skills(&["  Machine   Learning ", "ML"]),
            &skills(&["machine learning", "Machine Learning"]),
            &[],
            &SkillAliases::builtin(),
            PREFERRED_BONUS_CAP,
        );
        assert_eq!(result.required_total, 1);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_config_alias_override() {
        let mut extra = HashMap::new();
        extra.insert("rustlang".to_string(), "rust".to_string());
        let aliases = SkillAliases::with_overrides(extra.iter());

        assert_eq!(aliases.resolve("RustLang"), "rust");
        assert_eq!(aliases.resolve("JS"), "javascript");
    }

    #[test]
    fn test_reversed_override_keeps_aliases_consistent() {
        let mut extra = HashMap::new();
        extra.insert("kubernetes".to_string(), "k8s".to_string());
        let aliases = SkillAliases::with_overrides(extra.iter());

        assert_eq!(aliases.resolve("Kubernetes"), "k8s");
        assert_eq!(aliases.resolve("k8s"), "k8s");

        let result = match_skills(
            &skills(&["k8s"]),
            &skills(&["Kubernetes"]),
            &[],
            &aliases,
            PREFERRED_BONUS_CAP,
        );
        assert_eq!(result.score, 1.0);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_insert_repoints_existing_spellings() {
        let mut aliases = SkillAliases::empty();
        aliases.insert("py", "python");
        aliases.insert("python", "python3");

        assert_eq!(aliases.resolve("py"), "python3");
        assert_eq!(aliases.resolve("python"), "python3");
        assert_eq!(aliases.resolve("python3"), "python3");
    }

    #[test]
    fn test_common_words_are_not_skills_in_text() {
        let aliases = SkillAliases::builtin();

        let idiom = normalize("My go to approach is pairing with the team");
        assert!(skills_in_text(&idiom, ["Go"], &aliases).is_empty());

        let explicit = normalize("Services written in Golang");
        assert_eq!(skills_in_text(&explicit, ["Go"], &aliases), vec!["golang"]);

        // explicit skill lists still accept the short spelling
        let listed = match_skills(&skills(&["go"]), &skills(&["Go"]), &[], &aliases, PREFERRED_BONUS_CAP);
        assert_eq!(listed.score, 1.0);
    }

    #[test]
    fn test_skills_in_text() {
        let text = normalize("Five years building services in Python 3 on Amazon Web Services with Postgres.");
        let found = skills_in_text(
            &text,
            ["Python", "AWS", "PostgreSQL", "Go"],
            &SkillAliases::builtin(),
        );
        assert_eq!(found, vec!["aws", "postgresql", "python"]);
    }
}
