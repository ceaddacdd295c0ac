//! Score Synthesizer: turns the three match analyses into bounded scores and
//! a narrative recommendation.
//!
//! Scores:
//!   technical  = round(matching / (matching + missing) × 100), 50 if the job lists no skills
//!   experience = relevance base (30/60/90, 50 if unrecognized) + 10 when years are met
//!   education  = 100 if met else 50, −20 when certifications are missing
//!   overall    = ⌊0.4·technical + 0.4·experience + 0.2·education⌋, then
//!                "strong yes" raises it to ≥ 85 and "no" caps it at ≤ 40
//! Every score is clamped to 0..=100 last.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::education_match::EducationAnalysis;
use crate::analysis::experience_match::ExperienceAnalysis;
use crate::analysis::prompts::OVERALL_PROMPT_TEMPLATE;
use crate::analysis::skill_match::{json_list, SkillAnalysis};
use crate::llm_client::prompts::json_only;
use crate::llm_client::Reasoner;
use crate::models::analysis::{DetailedAnalysis, MatchStrength, SkillMatch};
use crate::models::cv::StructuredCv;
use crate::models::job::StructuredJob;
use crate::models::lenient::{self, Label};

// ────────────────────────────────────────────────────────────────────────────
// Constants
// ────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_TECHNICAL_SCORE: i32 = 50;
pub const YEARS_MET_BONUS: i32 = 10;
pub const EDUCATION_MET_SCORE: i32 = 100;
pub const EDUCATION_UNMET_SCORE: i32 = 50;
pub const MISSING_CERTIFICATION_PENALTY: i32 = 20;
pub const STRONG_YES_FLOOR: i32 = 85;
pub const NO_CEILING: i32 = 40;

const MAX_SKILL_EVIDENCE: usize = 3;
const GAPS_IN_PROMPT: usize = 5;
const TECHNICAL_HIGHLIGHTS: usize = 5;
const EXPERIENCE_HIGHLIGHTS: usize = 3;

const FALLBACK_RATIONALE: &str = "Unable to generate detailed analysis";
const FALLBACK_RECOMMENDATIONS: [&str; 2] = ["Review skills match", "Consider experience relevance"];

/// Category weights of the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub technical: f64,
    pub experience: f64,
    pub education: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            technical: 0.4,
            experience: 0.4,
            education: 0.2,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Overall assessment (reasoning call)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Label")]
pub enum HireRecommendation {
    #[serde(rename = "strong yes")]
    StrongYes,
    #[serde(rename = "yes")]
    Yes,
    #[default]
    #[serde(rename = "maybe")]
    Maybe,
    #[serde(rename = "no")]
    No,
}

impl From<Option<String>> for HireRecommendation {
    fn from(label: Option<String>) -> Self {
        let label = label.unwrap_or_default().trim().to_lowercase();
        match label.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "strong yes" => HireRecommendation::StrongYes,
            "yes" => HireRecommendation::Yes,
            "no" => HireRecommendation::No,
            _ => HireRecommendation::Maybe,
        }
    }
}

impl From<Label> for HireRecommendation {
    fn from(label: Label) -> Self {
        HireRecommendation::from(label.into_text())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverallAssessment {
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub rationale: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub recommendations: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub red_flags: Vec<String>,
    pub hire_recommendation: HireRecommendation,
    #[serde(deserialize_with = "lenient::string_list")]
    pub key_strengths: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub improvement_areas: Vec<String>,
}

impl OverallAssessment {
    /// Substituted when the overall call fails.
    pub fn fallback() -> Self {
        Self {
            rationale: FALLBACK_RATIONALE.to_string(),
            recommendations: FALLBACK_RECOMMENDATIONS.map(String::from).to_vec(),
            ..Default::default()
        }
    }
}

/// Never fails: any engine or parse error yields [`OverallAssessment::fallback`].
pub async fn assess_overall(
    reasoner: &Reasoner,
    job: &StructuredJob,
    skills: &SkillAnalysis,
    experience: &ExperienceAnalysis,
    education: &EducationAnalysis,
) -> OverallAssessment {
    let missing: Vec<String> = skills.missing.iter().take(GAPS_IN_PROMPT).cloned().collect();

    let prompt = OVERALL_PROMPT_TEMPLATE
        .replace("{job_title}", &job.job_title)
        .replace(
            "{company}",
            job.company.as_deref().unwrap_or("Unknown Company"),
        )
        .replace(
            "{experience_level}",
            job.experience_level.as_deref().unwrap_or("Not specified"),
        )
        .replace("{matching_required}", &skills.matching_required.len().to_string())
        .replace("{total_required}", &job.required_skills.len().to_string())
        .replace("{missing}", &json_list(&missing))
        .replace("{total_years}", &experience.total_years.to_string())
        .replace("{required_years}", &experience.required_years.to_string())
        .replace("{relevance}", experience.insights.relevance_score.label())
        .replace("{meets_education}", &education.meets_requirements.to_string())
        .replace(
            "{has_certifications}",
            &education.has_required_certifications.to_string(),
        );

    match reasoner
        .generate_json::<OverallAssessment>(&json_only(&prompt))
        .await
    {
        Ok(assessment) => assessment,
        Err(e) => {
            warn!("Overall assessment call failed, using fallback rationale: {e}");
            OverallAssessment::fallback()
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Numeric scores
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub overall: u8,
    pub technical: u8,
    pub experience: u8,
    pub education: u8,
}

pub fn compute_scores(
    weights: &ScoringWeights,
    skills: &SkillAnalysis,
    experience: &ExperienceAnalysis,
    education: &EducationAnalysis,
    hire: HireRecommendation,
) -> CategoryScores {
    let technical = technical_score(skills.matching_required.len(), skills.missing.len());

    let mut experience_score = experience.insights.relevance_score.base_score();
    if experience.meets_required_years() {
        experience_score = (experience_score + YEARS_MET_BONUS).min(100);
    }

    let mut education_score = if education.meets_requirements {
        EDUCATION_MET_SCORE
    } else {
        EDUCATION_UNMET_SCORE
    };
    if !education.has_required_certifications {
        education_score -= MISSING_CERTIFICATION_PENALTY;
    }

    let weighted = technical as f64 * weights.technical
        + experience_score as f64 * weights.experience
        + education_score as f64 * weights.education;
    let overall = adjust_for_recommendation(weighted.trunc() as i32, hire);

    CategoryScores {
        overall: clamp_score(overall),
        technical: clamp_score(technical),
        experience: clamp_score(experience_score),
        education: clamp_score(education_score),
    }
}

fn technical_score(matching: usize, missing: usize) -> i32 {
    let total = matching + missing;
    if total == 0 {
        return DEFAULT_TECHNICAL_SCORE;
    }
    (matching as f64 / total as f64 * 100.0).round() as i32
}

fn adjust_for_recommendation(score: i32, hire: HireRecommendation) -> i32 {
    match hire {
        HireRecommendation::StrongYes => score.max(STRONG_YES_FLOOR),
        HireRecommendation::No => score.min(NO_CEILING),
        HireRecommendation::Yes | HireRecommendation::Maybe => score,
    }
}

fn clamp_score(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}

// ────────────────────────────────────────────────────────────────────────────
// Detailed breakdown
// ────────────────────────────────────────────────────────────────────────────

pub fn build_detailed_analysis(
    cv: &StructuredCv,
    skills: &SkillAnalysis,
    experience: &ExperienceAnalysis,
    education: &EducationAnalysis,
) -> DetailedAnalysis {
    let skill_matches = skills
        .matching_required
        .iter()
        .map(|skill| {
            let cv_evidence = skill_evidence(skill, cv);
            let strength = if cv_evidence.len() > 2 {
                MatchStrength::Strong
            } else {
                MatchStrength::Moderate
            };
            SkillMatch {
                skill: skill.clone(),
                cv_evidence,
                strength,
            }
        })
        .collect();

    let first = |items: &[String], n: usize| items.iter().take(n).cloned().collect::<Vec<_>>();

    DetailedAnalysis {
        skill_matches,
        experience_matches: experience.responsibility_matches.clone(),
        education_matches: education.education_matches.clone(),
        certification_matches: education.certification_matches.clone(),
        technical_strengths: first(&skills.insights.strong_matches, TECHNICAL_HIGHLIGHTS),
        technical_gaps: first(&skills.insights.critical_gaps, TECHNICAL_HIGHLIGHTS),
        experience_strengths: first(
            &experience.insights.matching_experiences,
            EXPERIENCE_HIGHLIGHTS,
        ),
        experience_gaps: first(&experience.insights.experience_gaps, EXPERIENCE_HIGHLIGHTS),
        education_alignment: education.alignment,
    }
}

/// Where the CV shows a skill, case-insensitively. At most three pieces.
pub fn skill_evidence(skill: &str, cv: &StructuredCv) -> Vec<String> {
    let needle = skill.to_lowercase();
    let mentions = |text: &str| text.to_lowercase().contains(&needle);
    let mut evidence = Vec::new();

    if cv.skills.iter().any(|s| mentions(s)) {
        evidence.push("Listed in skills section".to_string());
    }
    for (category, listed) in &cv.technical_skills {
        if listed.iter().any(|s| mentions(s)) {
            evidence.push(format!("Listed under {category}"));
        }
    }
    for exp in &cv.experiences {
        if exp.statements().any(|s| mentions(s)) {
            evidence.push(format!("Used at {}", exp.company));
        }
    }
    for project in &cv.projects {
        if project.technologies.iter().any(|t| mentions(t)) {
            evidence.push(format!("Used in project: {}", project.name));
        }
    }

    evidence.truncate(MAX_SKILL_EVIDENCE);
    evidence
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::analysis::experience_match::{ExperienceInsights, Relevance};
    use crate::analysis::skill_match::SkillInsights;
    use crate::llm_client::testing::ScriptedEngine;
    use crate::models::cv::{Experience, Project};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn skills(matching: &[&str], missing: &[&str]) -> SkillAnalysis {
        SkillAnalysis {
            cv_skills: strings(matching),
            matching_required: strings(matching),
            matching_preferred: vec![],
            missing: strings(missing),
            insights: SkillInsights::default(),
        }
    }

    fn experience(relevance: Relevance, total_years: u32, required_years: u32) -> ExperienceAnalysis {
        ExperienceAnalysis {
            total_years,
            required_years,
            insights: ExperienceInsights {
                relevance_score: relevance,
                ..Default::default()
            },
            responsibility_matches: vec![],
        }
    }

    fn education(meets: bool, certified: bool) -> EducationAnalysis {
        EducationAnalysis {
            meets_requirements: meets,
            has_required_certifications: certified,
            missing_certifications: vec![],
            education_matches: vec![],
            certification_matches: vec![],
            alignment: MatchStrength::Weak,
        }
    }

    #[test]
    fn test_technical_score_is_rounded_ratio() {
        let scores = compute_scores(
            &ScoringWeights::default(),
            &skills(&["a", "b", "c", "d"], &["e"]),
            &experience(Relevance::Medium, 0, 0),
            &education(true, true),
            HireRecommendation::Maybe,
        );
        assert_eq!(scores.technical, 80);
        assert_eq!(technical_score(2, 1), 67);
        assert_eq!(technical_score(0, 0), DEFAULT_TECHNICAL_SCORE);
    }

    #[test]
    fn test_weighted_overall_is_truncated() {
        // 0.4·67 + 0.4·70 + 0.2·100 = 74.8
        let scores = compute_scores(
            &ScoringWeights::default(),
            &skills(&["a", "b"], &["c"]),
            &experience(Relevance::Medium, 5, 3),
            &education(true, true),
            HireRecommendation::Yes,
        );
        assert_eq!(scores.experience, 70);
        assert_eq!(scores.overall, 74);
    }

    #[test]
    fn test_no_caps_overall_at_forty() {
        let scores = compute_scores(
            &ScoringWeights::default(),
            &skills(&["a"], &[]),
            &experience(Relevance::High, 10, 5),
            &education(true, true),
            HireRecommendation::No,
        );
        assert_eq!(scores.technical, 100);
        assert_eq!(scores.experience, 100);
        assert_eq!(scores.education, 100);
        assert!(scores.overall <= NO_CEILING as u8);
    }

    #[test]
    fn test_strong_yes_raises_floor() {
        // technical 50 (no skills), experience 50 (unrecognized, years unmet), education 50
        let scores = compute_scores(
            &ScoringWeights::default(),
            &skills(&[], &[]),
            &experience(Relevance::Unrecognized("great".to_string()), 0, 1),
            &education(false, true),
            HireRecommendation::StrongYes,
        );
        assert_eq!(scores.technical, 50);
        assert_eq!(scores.experience, 50);
        assert_eq!(scores.education, 50);
        assert!(scores.overall >= STRONG_YES_FLOOR as u8);
    }

    #[test]
    fn test_education_penalty_and_bounds() {
        let scores = compute_scores(
            &ScoringWeights::default(),
            &skills(&[], &["a", "b"]),
            &experience(Relevance::Low, 0, 3),
            &education(false, false),
            HireRecommendation::Maybe,
        );
        assert_eq!(scores.technical, 0);
        assert_eq!(scores.experience, 30);
        assert_eq!(scores.education, 30);
        // 0 + 12 + 6
        assert_eq!(scores.overall, 18);
    }

    #[test]
    fn test_hire_recommendation_parsing() {
        let parse = |label: &str| HireRecommendation::from(Some(label.to_string()));
        assert_eq!(parse("Strong Yes"), HireRecommendation::StrongYes);
        assert_eq!(parse("  strong   yes "), HireRecommendation::StrongYes);
        assert_eq!(parse("NO"), HireRecommendation::No);
        assert_eq!(parse("absolutely"), HireRecommendation::Maybe);
        assert_eq!(HireRecommendation::from(None), HireRecommendation::Maybe);
    }

    #[test]
    fn test_odd_hire_recommendation_keeps_rationale() {
        let assessment: OverallAssessment = serde_json::from_value(serde_json::json!({
            "rationale": "Strong backend fit.",
            "red_flags": ["Short tenures"],
            "hire_recommendation": true,
        }))
        .unwrap();
        assert_eq!(assessment.rationale, "Strong backend fit.");
        assert_eq!(assessment.red_flags, vec!["Short tenures"]);
        assert_eq!(assessment.hire_recommendation, HireRecommendation::Maybe);

        let assessment: OverallAssessment = serde_json::from_value(serde_json::json!({
            "rationale": "Borderline.",
            "hire_recommendation": "Strong Yes",
        }))
        .unwrap();
        assert_eq!(assessment.hire_recommendation, HireRecommendation::StrongYes);
    }

    #[tokio::test]
    async fn test_failed_overall_call_uses_fallback() {
        let engine = Arc::new(ScriptedEngine::failing());
        let assessment = assess_overall(
            &engine.reasoner(),
            &StructuredJob::titled("Dev"),
            &skills(&["Rust"], &["Go"]),
            &experience(Relevance::Medium, 3, 3),
            &education(true, true),
        )
        .await;

        assert_eq!(assessment.rationale, FALLBACK_RATIONALE);
        assert_eq!(
            assessment.recommendations,
            strings(&["Review skills match", "Consider experience relevance"])
        );
        assert!(assessment.red_flags.is_empty());
        assert_eq!(assessment.hire_recommendation, HireRecommendation::Maybe);
    }

    #[tokio::test]
    async fn test_overall_prompt_and_reply() {
        let engine = Arc::new(ScriptedEngine::replying(&[
            r#"Here you go: {"rationale": "Strong backend fit.", "recommendations": ["Learn Go"],
               "red_flags": [], "hire_recommendation": "yes"}"#,
        ]));
        let mut job = StructuredJob::titled("Backend Engineer");
        job.company = Some("Initech".to_string());
        job.required_skills = strings(&["Rust", "Go"]);

        let assessment = assess_overall(
            &engine.reasoner(),
            &job,
            &skills(&["Rust"], &["Go"]),
            &experience(Relevance::High, 4, 3),
            &education(true, false),
        )
        .await;

        assert_eq!(assessment.rationale, "Strong backend fit.");
        assert_eq!(assessment.hire_recommendation, HireRecommendation::Yes);

        let prompt = &engine.prompts()[0];
        assert!(prompt.contains("Job: Backend Engineer at Initech"));
        assert!(prompt.contains("- Matching required: 1/2"));
        assert!(prompt.contains(r#"- Missing critical: ["Go"]"#));
        assert!(prompt.contains("- Years: 4 (required: 3)"));
        assert!(prompt.contains("- Relevance: high"));
        assert!(prompt.contains("- Has required certifications: false"));
    }

    #[test]
    fn test_skill_evidence_sources_and_cap() {
        let cv = StructuredCv {
            skills: strings(&["Rust"]),
            technical_skills: BTreeMap::from([("Languages".to_string(), strings(&["rust"]))]),
            experiences: vec![Experience {
                company: "Acme".to_string(),
                position: "Engineer".to_string(),
                start_date: None,
                end_date: None,
                location: None,
                responsibilities: strings(&["Rewrote the ingest path in Rust"]),
                achievements: vec![],
            }],
            projects: vec![Project {
                name: "cli".to_string(),
                description: None,
                technologies: strings(&["Rust"]),
                role: None,
                highlights: vec![],
            }],
            ..Default::default()
        };

        assert_eq!(
            skill_evidence("Rust", &cv),
            strings(&["Listed in skills section", "Listed under Languages", "Used at Acme"])
        );
        assert_eq!(skill_evidence("Go", &cv), Vec::<String>::new());
    }

    #[test]
    fn test_detailed_analysis_strength_and_highlights() {
        let cv = StructuredCv {
            skills: strings(&["Rust"]),
            ..Default::default()
        };
        let mut skill_analysis = skills(&["Rust"], &["Go"]);
        skill_analysis.insights.strong_matches = (0..8).map(|i| format!("s{i}")).collect();
        let mut experience_analysis = experience(Relevance::High, 5, 3);
        experience_analysis.insights.experience_gaps = strings(&["a", "b", "c", "d"]);
        let mut education_analysis = education(true, true);
        education_analysis.alignment = MatchStrength::Strong;
        education_analysis.certification_matches = strings(&["CKA"]);

        let detailed =
            build_detailed_analysis(&cv, &skill_analysis, &experience_analysis, &education_analysis);

        assert_eq!(detailed.skill_matches.len(), 1);
        assert_eq!(detailed.skill_matches[0].strength, MatchStrength::Moderate);
        assert_eq!(detailed.technical_strengths.len(), 5);
        assert_eq!(detailed.experience_gaps, strings(&["a", "b", "c"]));
        assert_eq!(detailed.certification_matches, strings(&["CKA"]));
        assert_eq!(detailed.education_alignment, MatchStrength::Strong);
    }
}
