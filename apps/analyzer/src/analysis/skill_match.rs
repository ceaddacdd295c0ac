//! Skill matching: deterministic required/preferred overlap plus an optional
//! qualitative layer from the reasoning engine.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::normalizer::{skills_in_text, skills_match};
use crate::analysis::prompts::SKILL_INSIGHT_PROMPT_TEMPLATE;
use crate::llm_client::prompts::json_only;
use crate::llm_client::Reasoner;
use crate::models::analysis::MatchStrength;
use crate::models::cv::StructuredCv;
use crate::models::job::StructuredJob;
use crate::models::lenient;

/// Qualitative skill judgment. Empty with a moderate rating when the engine
/// could not be reached or answered garbage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillInsights {
    #[serde(deserialize_with = "lenient::string_list")]
    pub strong_matches: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub partial_matches: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub critical_gaps: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub transferable_skills: Vec<String>,
    pub skill_strength_rating: MatchStrength,
}

impl Default for SkillInsights {
    fn default() -> Self {
        Self {
            strong_matches: Vec::new(),
            partial_matches: Vec::new(),
            critical_gaps: Vec::new(),
            transferable_skills: Vec::new(),
            skill_strength_rating: MatchStrength::Moderate,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillAnalysis {
    /// Every skill the CV evidences, deduplicated case-insensitively.
    pub cv_skills: Vec<String>,
    pub matching_required: Vec<String>,
    pub matching_preferred: Vec<String>,
    /// Required skills with no match. Preferred skills are never missing.
    pub missing: Vec<String>,
    pub insights: SkillInsights,
}

impl SkillAnalysis {
    /// Matching required skills followed by matching preferred skills.
    pub fn matching(&self) -> Vec<String> {
        self.matching_required
            .iter()
            .chain(&self.matching_preferred)
            .cloned()
            .collect()
    }
}

/// Union of the flat skill list, categorized technical skills, keywords
/// mentioned in experience text, and project technologies.
pub fn collect_cv_skills(cv: &StructuredCv) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut skills = Vec::new();
    let mut push = |skill: &str| {
        let skill = skill.trim();
        if !skill.is_empty() && seen.insert(skill.to_lowercase()) {
            skills.push(skill.to_string());
        }
    };

    cv.skills.iter().for_each(|s| push(s));
    cv.technical_skills.values().flatten().for_each(|s| push(s));
    for exp in &cv.experiences {
        let text = exp.statements().map(String::as_str).collect::<Vec<_>>().join(" ");
        skills_in_text(&text).into_iter().for_each(&mut push);
    }
    cv.projects
        .iter()
        .flat_map(|p| &p.technologies)
        .for_each(|s| push(s));

    skills
}

fn partition(wanted: &[String], cv_skills: &[String]) -> (Vec<String>, Vec<String>) {
    wanted.iter().cloned().partition(|skill| {
        cv_skills
            .iter()
            .any(|candidate| skills_match(skill, candidate))
    })
}

/// Never fails: a failed insight call leaves the deterministic lists intact.
pub async fn analyze_skills(
    reasoner: &Reasoner,
    cv: &StructuredCv,
    job: &StructuredJob,
) -> SkillAnalysis {
    let cv_skills = collect_cv_skills(cv);
    let (matching_required, missing) = partition(&job.required_skills, &cv_skills);
    let (matching_preferred, _) = partition(&job.preferred_skills, &cv_skills);

    debug!(
        "Skill match: {}/{} required, {}/{} preferred",
        matching_required.len(),
        job.required_skills.len(),
        matching_preferred.len(),
        job.preferred_skills.len()
    );

    let insights = skill_insights(reasoner, &cv_skills, job).await;

    SkillAnalysis {
        cv_skills,
        matching_required,
        matching_preferred,
        missing,
        insights,
    }
}

async fn skill_insights(
    reasoner: &Reasoner,
    cv_skills: &[String],
    job: &StructuredJob,
) -> SkillInsights {
    let prompt = SKILL_INSIGHT_PROMPT_TEMPLATE
        .replace("{cv_skills}", &json_list(cv_skills))
        .replace("{required_skills}", &json_list(&job.required_skills))
        .replace("{preferred_skills}", &json_list(&job.preferred_skills));

    match reasoner.generate_json::<SkillInsights>(&json_only(&prompt)).await {
        Ok(insights) => insights,
        Err(e) => {
            warn!("Skill insight call failed, continuing without insights: {e}");
            SkillInsights::default()
        }
    }
}

pub(crate) fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}
