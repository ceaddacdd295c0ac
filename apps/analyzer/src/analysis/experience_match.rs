//! Experience matching: years of experience vs. what the posting asks for,
//! a model judgment of relevance, and per-responsibility best matches.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::analysis::normalizer::{required_years, text_similarity, total_experience_years};
use crate::analysis::prompts::EXPERIENCE_PROMPT_TEMPLATE;
use crate::analysis::skill_match::json_list;
use crate::llm_client::prompts::json_only;
use crate::llm_client::Reasoner;
use crate::models::analysis::{ExperienceMatch, MatchQuality};
use crate::models::cv::StructuredCv;
use crate::models::job::StructuredJob;
use crate::models::lenient::{self, Label};

/// Similarity above which a CV statement counts as a match at all.
pub const PARTIAL_MATCH_THRESHOLD: f64 = 0.3;
/// Similarity above which a match is full rather than partial.
pub const FULL_MATCH_THRESHOLD: f64 = 0.6;
/// Only the leading responsibilities of a posting are matched individually.
pub const MATCHED_RESPONSIBILITIES: usize = 5;
const EXCERPT_CHARS: usize = 100;

/// Relevance label from the model. Parsed case-insensitively; anything
/// outside low/medium/high is kept verbatim as `Unrecognized`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Label", into = "String")]
pub enum Relevance {
    Low,
    #[default]
    Medium,
    High,
    Unrecognized(String),
}

impl From<Option<String>> for Relevance {
    fn from(label: Option<String>) -> Self {
        let Some(label) = label else {
            return Relevance::Medium;
        };
        match label.trim().to_lowercase().as_str() {
            "low" => Relevance::Low,
            "medium" => Relevance::Medium,
            "high" => Relevance::High,
            _ => Relevance::Unrecognized(label),
        }
    }
}

impl From<Label> for Relevance {
    fn from(label: Label) -> Self {
        Relevance::from(label.into_text())
    }
}

impl From<Relevance> for String {
    fn from(relevance: Relevance) -> Self {
        relevance.label().to_string()
    }
}

impl Relevance {
    pub fn label(&self) -> &str {
        match self {
            Relevance::Low => "low",
            Relevance::Medium => "medium",
            Relevance::High => "high",
            Relevance::Unrecognized(label) => label,
        }
    }

    /// Experience score before the years bonus.
    pub fn base_score(&self) -> i32 {
        match self {
            Relevance::Low => 30,
            Relevance::Medium => 60,
            Relevance::High => 90,
            Relevance::Unrecognized(_) => 50,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Label")]
pub enum CareerProgression {
    Positive,
    #[default]
    Neutral,
    Concerning,
}

impl From<Option<String>> for CareerProgression {
    fn from(label: Option<String>) -> Self {
        match label.as_deref().map(str::trim).map(str::to_lowercase).as_deref() {
            Some("positive") => CareerProgression::Positive,
            Some("concerning") => CareerProgression::Concerning,
            _ => CareerProgression::Neutral,
        }
    }
}

impl From<Label> for CareerProgression {
    fn from(label: Label) -> Self {
        CareerProgression::from(label.into_text())
    }
}

/// The model's reading of the candidate's experience. A failed call leaves
/// this at its default: medium relevance, nothing else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceInsights {
    pub relevance_score: Relevance,
    #[serde(deserialize_with = "lenient::string_list")]
    pub matching_experiences: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub experience_gaps: Vec<String>,
    pub career_progression: CareerProgression,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub years_match: Option<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub key_insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceAnalysis {
    pub total_years: u32,
    pub required_years: u32,
    pub insights: ExperienceInsights,
    pub responsibility_matches: Vec<ExperienceMatch>,
}

impl ExperienceAnalysis {
    pub fn meets_required_years(&self) -> bool {
        self.total_years >= self.required_years
    }
}

/// Never fails: a failed relevance call falls back to medium relevance.
pub async fn analyze_experience(
    reasoner: &Reasoner,
    cv: &StructuredCv,
    job: &StructuredJob,
    today: NaiveDate,
) -> ExperienceAnalysis {
    let total_years = total_experience_years(&cv.experiences, today);
    let required_years = required_years(job);
    debug!("Experience: {total_years} years (required: {required_years})");

    let insights = experience_insights(reasoner, cv, job).await;

    ExperienceAnalysis {
        total_years,
        required_years,
        insights,
        responsibility_matches: match_responsibilities(cv, job),
    }
}

async fn experience_insights(
    reasoner: &Reasoner,
    cv: &StructuredCv,
    job: &StructuredJob,
) -> ExperienceInsights {
    let experiences: Vec<_> = cv
        .experiences
        .iter()
        .map(|exp| {
            let key_points: Vec<&String> = exp
                .responsibilities
                .iter()
                .take(3)
                .chain(exp.achievements.iter().take(2))
                .collect();
            json!({
                "company": exp.company,
                "position": exp.position,
                "duration": format!(
                    "{} to {}",
                    exp.start_date.as_deref().unwrap_or("Unknown"),
                    exp.end_date.as_deref().unwrap_or("Present")
                ),
                "key_points": key_points,
            })
        })
        .collect();

    let responsibilities: Vec<String> = job
        .responsibilities
        .iter()
        .take(MATCHED_RESPONSIBILITIES)
        .cloned()
        .collect();

    let prompt = EXPERIENCE_PROMPT_TEMPLATE
        .replace(
            "{experiences}",
            &serde_json::to_string_pretty(&experiences).unwrap_or_else(|_| "[]".to_string()),
        )
        .replace("{job_title}", &job.job_title)
        .replace(
            "{experience_level}",
            job.experience_level.as_deref().unwrap_or("Not specified"),
        )
        .replace("{responsibilities}", &json_list(&responsibilities));

    match reasoner
        .generate_json::<ExperienceInsights>(&json_only(&prompt))
        .await
    {
        Ok(insights) => insights,
        Err(e) => {
            warn!("Experience relevance call failed, assuming medium relevance: {e}");
            ExperienceInsights::default()
        }
    }
}

/// Best CV statement for each of the first [`MATCHED_RESPONSIBILITIES`]
/// job responsibilities.
pub fn match_responsibilities(cv: &StructuredCv, job: &StructuredJob) -> Vec<ExperienceMatch> {
    job.responsibilities
        .iter()
        .take(MATCHED_RESPONSIBILITIES)
        .map(|requirement| best_experience_match(requirement, cv))
        .collect()
}

/// Within one role the first statement above the partial threshold is taken.
/// Roles are scanned in order until a full match is found, so a later
/// partial match replaces an earlier one.
fn best_experience_match(requirement: &str, cv: &StructuredCv) -> ExperienceMatch {
    let mut best = ExperienceMatch {
        requirement: requirement.to_string(),
        cv_experience: None,
        match_quality: MatchQuality::None,
    };

    for exp in &cv.experiences {
        let hit = exp.statements().find_map(|statement| {
            let similarity = text_similarity(requirement, statement);
            (similarity > PARTIAL_MATCH_THRESHOLD).then_some((statement, similarity))
        });

        if let Some((statement, similarity)) = hit {
            best.cv_experience = Some(format!(
                "{} at {}: {}",
                exp.position,
                exp.company,
                excerpt(statement)
            ));
            best.match_quality = if similarity > FULL_MATCH_THRESHOLD {
                MatchQuality::Full
            } else {
                MatchQuality::Partial
            };
        }

        if best.match_quality == MatchQuality::Full {
            break;
        }
    }

    best
}

fn excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_CHARS {
        format!("{}...", text.chars().take(EXCERPT_CHARS).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::testing::ScriptedEngine;
    use crate::models::cv::Experience;

    fn experience(company: &str, start: &str, end: Option<&str>, statements: &[&str]) -> Experience {
        Experience {
            company: company.to_string(),
            position: "Engineer".to_string(),
            start_date: Some(start.to_string()),
            end_date: end.map(str::to_string),
            location: None,
            responsibilities: statements.iter().map(|s| s.to_string()).collect(),
            achievements: vec![],
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn cv() -> StructuredCv {
        StructuredCv {
            experiences: vec![
                experience(
                    "Acme",
                    "2018-01",
                    Some("2021-01"),
                    &["Maintain REST APIs for billing"],
                ),
                experience(
                    "Globex",
                    "2021-02",
                    Some("2023-02"),
                    &["Design and build REST APIs in Rust for payments"],
                ),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_relevance_labels() {
        assert_eq!(Relevance::from(Some("HIGH".to_string())), Relevance::High);
        assert_eq!(Relevance::from(None), Relevance::Medium);
        let odd = Relevance::from(Some("very high".to_string()));
        assert_eq!(odd.base_score(), 50);
        assert_eq!(odd.label(), "very high");
    }

    #[test]
    fn test_full_match_stops_scan() {
        let mut job = StructuredJob::titled("Backend Engineer");
        job.responsibilities = vec!["Design and build REST APIs in Rust".to_string()];

        let matches = match_responsibilities(&cv(), &job);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_quality, MatchQuality::Full);
        assert_eq!(
            matches[0].cv_experience.as_deref(),
            Some("Engineer at Globex: Design and build REST APIs in Rust for payments")
        );
    }

    #[test]
    fn test_partial_match_and_no_match() {
        let mut job = StructuredJob::titled("Backend Engineer");
        job.responsibilities = vec![
            "Build REST APIs".to_string(),
            "Negotiate vendor contracts".to_string(),
        ];

        let matches = match_responsibilities(&cv(), &job);

        assert_eq!(matches[0].match_quality, MatchQuality::Partial);
        assert!(matches[0].cv_experience.is_some());
        assert_eq!(matches[1].match_quality, MatchQuality::None);
        assert!(matches[1].cv_experience.is_none());
    }

    #[test]
    fn test_only_first_five_responsibilities_are_matched() {
        let mut job = StructuredJob::titled("Backend Engineer");
        job.responsibilities = (0..8).map(|i| format!("Task {i}")).collect();
        assert_eq!(match_responsibilities(&cv(), &job).len(), MATCHED_RESPONSIBILITIES);
    }

    #[test]
    fn test_long_statements_are_excerpted() {
        let long = "word ".repeat(40);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 3);
        assert_eq!(excerpt("short"), "short");
    }

    #[tokio::test]
    async fn test_insights_parsed_from_reply() {
        let engine = Arc::new(ScriptedEngine::replying(&[
            r#"{"relevance_score": "High", "matching_experiences": ["Payments APIs"], "career_progression": "positive"}"#,
        ]));
        let mut job = StructuredJob::titled("Backend Engineer");
        job.experience_level = Some("Senior".to_string());

        let analysis = analyze_experience(&engine.reasoner(), &cv(), &job, today()).await;

        assert_eq!(analysis.total_years, 5);
        assert_eq!(analysis.required_years, 5);
        assert!(analysis.meets_required_years());
        assert_eq!(analysis.insights.relevance_score, Relevance::High);
        assert_eq!(analysis.insights.career_progression, CareerProgression::Positive);
        assert_eq!(analysis.insights.matching_experiences, vec!["Payments APIs"]);

        let prompt = &engine.prompts()[0];
        assert!(prompt.contains("\"duration\": \"2018-01 to 2021-01\""));
        assert!(prompt.contains("- Level: Senior"));
    }

    #[tokio::test]
    async fn test_failed_call_degrades_to_medium() {
        let engine = Arc::new(ScriptedEngine::failing());
        let job = StructuredJob::titled("Backend Engineer");

        let analysis = analyze_experience(&engine.reasoner(), &cv(), &job, today()).await;

        assert_eq!(analysis.insights, ExperienceInsights::default());
        assert_eq!(analysis.insights.relevance_score, Relevance::Medium);
        assert_eq!(analysis.required_years, 0);
    }

    #[test]
    fn test_numeric_relevance_keeps_other_insights() {
        let insights: ExperienceInsights = serde_json::from_value(serde_json::json!({
            "relevance_score": 85,
            "matching_experiences": ["Payments APIs"],
            "career_progression": 3,
        }))
        .unwrap();
        assert_eq!(insights.matching_experiences, vec!["Payments APIs"]);
        assert_eq!(insights.relevance_score, Relevance::Unrecognized("85".to_string()));
        assert_eq!(insights.relevance_score.base_score(), 50);
        assert_eq!(insights.career_progression, CareerProgression::Neutral);

        let insights: ExperienceInsights =
            serde_json::from_value(serde_json::json!({"relevance_score": null})).unwrap();
        assert_eq!(insights.relevance_score, Relevance::Medium);
    }
}
