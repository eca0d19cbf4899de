use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Ordered education levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationLevel {
    #[serde(alias = "None")]
    None,
    #[serde(alias = "high_school", alias = "high school")]
    HighSchool,
    #[serde(alias = "bachelors", alias = "undergraduate")]
    Bachelor,
    #[serde(alias = "masters", alias = "graduate")]
    Master,
    #[serde(alias = "phd")]
    Doctorate,
}

impl EducationLevel {
    /// Position on the ordered scale (none = 0 .. doctorate = 4)
    pub fn rank(self) -> u8 {
        match self {
            EducationLevel::None => 0,
            EducationLevel::HighSchool => 1,
            EducationLevel::Bachelor => 2,
            EducationLevel::Master => 3,
            EducationLevel::Doctorate => 4,
        }
    }

    /// Parse a single degree name such as "B.Tech", "MSc" or "Ph.D"
    pub fn parse(value: &str) -> Option<Self> {
        let key: String = value
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();

        match key.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "none" => Some(EducationLevel::None),
            "highschool" | "high school" | "secondary" | "diploma" | "ged" => {
                Some(EducationLevel::HighSchool)
            }
            "bachelor" | "bachelors" | "bsc" | "bs" | "ba" | "btech" | "be" | "bca"
            | "undergraduate" => Some(EducationLevel::Bachelor),
            "master" | "masters" | "msc" | "ms" | "ma" | "mtech" | "me" | "mba" | "mca" => {
                Some(EducationLevel::Master)
            }
            "doctorate" | "phd" | "doctoral" => Some(EducationLevel::Doctorate),
            _ => None,
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EducationLevel::None => "no formal education",
            EducationLevel::HighSchool => "high school",
            EducationLevel::Bachelor => "bachelor",
            EducationLevel::Master => "master",
            EducationLevel::Doctorate => "doctorate",
        };
        f.write_str(label)
    }
}

/// Job role requirements a resume is screened against
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobRoleSpec {
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(alias = "required_experience", default)]
    #[validate(range(min = 0.0))]
    pub required_experience_years: f64,
    #[serde(default = "default_required_education")]
    pub required_education_level: EducationLevel,
}

fn default_required_education() -> EducationLevel {
    EducationLevel::None
}

/// Structured fields extracted from one resume by the upstream parser
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResumeExtract {
    #[serde(default)]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub raw_text: String,
    #[serde(alias = "skills", default)]
    pub extracted_skills: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub experience_years: Option<f64>,
    #[serde(alias = "education", default)]
    pub education_level: Option<EducationLevel>,
    #[serde(alias = "projects", default)]
    pub project_descriptions: Vec<String>,
}

/// The five weighted components, in suggestion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Skills,
    Experience,
    Education,
    Projects,
    Semantic,
}

impl Component {
    /// Fixed order used for suggestions and degraded listings
    pub const ALL: [Component; 5] = [
        Component::Skills,
        Component::Experience,
        Component::Education,
        Component::Projects,
        Component::Semantic,
    ];
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Component::Skills => "skills",
            Component::Experience => "experience",
            Component::Education => "education",
            Component::Projects => "projects",
            Component::Semantic => "semantic",
        };
        f.write_str(label)
    }
}

/// Per-component scores, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub semantic: f64,
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
    pub projects: f64,
}

impl ComponentScores {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Semantic => self.semantic,
            Component::Skills => self.skills,
            Component::Experience => self.experience,
            Component::Education => self.education,
            Component::Projects => self.projects,
        }
    }
}

/// Component weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub semantic: f64,
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
    pub projects: f64,
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.semantic + self.skills + self.experience + self.education + self.projects
    }

    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Semantic => self.semantic,
            Component::Skills => self.skills,
            Component::Experience => self.experience,
            Component::Education => self.education,
            Component::Projects => self.projects,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        crate::core::scoring::DEFAULT_WEIGHTS
    }
}

/// Scores, weights and point contributions behind a final score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub components: ComponentScores,
    pub weights: ScoringWeights,
    /// `weight × score × 100` per component
    pub contributions: ComponentScores,
}

/// Outcome of screening one resume against one job role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub candidate_id: Option<String>,
    pub final_score: u8,
    pub shortlisted: bool,
    pub breakdown: ScoreBreakdown,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub extra_skills: Vec<String>,
    pub suggestions: Vec<String>,
    pub degraded: Vec<Component>,
    pub summary: String,
}
