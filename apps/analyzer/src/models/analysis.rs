use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::lenient::Label;

/// Qualitative strength label. Parsed case-insensitively from model output;
/// unknown labels read as `Moderate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Label")]
pub enum MatchStrength {
    #[default]
    Weak,
    Moderate,
    Strong,
}

impl From<String> for MatchStrength {
    fn from(label: String) -> Self {
        match label.trim().to_lowercase().as_str() {
            "weak" => MatchStrength::Weak,
            "strong" => MatchStrength::Strong,
            _ => MatchStrength::Moderate,
        }
    }
}

impl From<Label> for MatchStrength {
    fn from(label: Label) -> Self {
        label.into_text().map_or(MatchStrength::Moderate, MatchStrength::from)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchQuality {
    #[default]
    None,
    Partial,
    Full,
}

/// One matching required skill and where the CV shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: String,
    #[serde(default)]
    pub cv_evidence: Vec<String>,
    #[serde(default)]
    pub strength: MatchStrength,
}

/// Best CV statement found for one job responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceMatch {
    pub requirement: String,
    #[serde(default)]
    pub cv_experience: Option<String>,
    #[serde(default)]
    pub match_quality: MatchQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationMatch {
    pub requirement: String,
    #[serde(default)]
    pub cv_education: Option<String>,
    #[serde(default)]
    pub meets_requirement: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailedAnalysis {
    pub skill_matches: Vec<SkillMatch>,
    pub experience_matches: Vec<ExperienceMatch>,
    pub education_matches: Vec<EducationMatch>,
    pub certification_matches: Vec<String>,
    pub technical_strengths: Vec<String>,
    pub technical_gaps: Vec<String>,
    pub experience_strengths: Vec<String>,
    pub experience_gaps: Vec<String>,
    pub education_alignment: MatchStrength,
}

/// Final output of one (CV, job) analysis. Scores are always within 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "suitability_score")]
    pub overall_score: u8,
    pub technical_score: u8,
    pub experience_score: u8,
    pub education_score: u8,
    pub scoring_rationale: String,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_analysis: Option<DetailedAnalysis>,
}

/// A persisted analysis. Never updated; re-running an analysis makes a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub job_id: Uuid,
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub analysis_duration_seconds: f64,
    pub analysis_date: DateTime<Utc>,
}
