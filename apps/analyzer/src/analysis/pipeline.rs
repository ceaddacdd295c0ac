//! Pipeline orchestrator: match engine → score synthesizer → `AnalysisResult`.
//!
//! `analyze` is infallible; every stage degrades on its own. Only the record
//! lookups in `run` can fail the pipeline.

use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::analysis::education_match::analyze_education;
use crate::analysis::experience_match::analyze_experience;
use crate::analysis::scoring::{
    assess_overall, build_detailed_analysis, compute_scores, ScoringWeights,
};
use crate::analysis::skill_match::analyze_skills;
use crate::llm_client::Reasoner;
use crate::models::analysis::AnalysisResult;
use crate::models::cv::StructuredCv;
use crate::models::job::StructuredJob;
use crate::repository::DocumentStore;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("CV {0} not found")]
    CvNotFound(Uuid),

    #[error("Job description {0} not found")]
    JobNotFound(Uuid),

    #[error("Storage error: {0}")]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Include the per-skill / per-requirement breakdown.
    pub detailed: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self { detailed: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub duration: Duration,
}

#[derive(Clone)]
pub struct AnalysisPipeline {
    reasoner: Reasoner,
    weights: ScoringWeights,
}

impl AnalysisPipeline {
    pub fn new(reasoner: Reasoner) -> Self {
        Self {
            reasoner,
            weights: ScoringWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Loads both records, analyzes them and times the analysis.
    pub async fn run(
        &self,
        store: &dyn DocumentStore,
        cv_id: Uuid,
        job_id: Uuid,
        options: AnalysisOptions,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let cv = store
            .get_cv(cv_id)
            .await?
            .ok_or(AnalysisError::CvNotFound(cv_id))?;
        let job = store
            .get_job(job_id)
            .await?
            .ok_or(AnalysisError::JobNotFound(job_id))?;

        info!("Starting analysis: cv={cv_id}, job={job_id} ('{}')", job.job.job_title);
        let started = Instant::now();
        let result = self.analyze(&cv.cv, &job.job, options).await;
        let duration = started.elapsed();

        info!(
            "Analysis finished in {:.2}s: overall={}, technical={}, experience={}, education={}",
            duration.as_secs_f64(),
            result.overall_score,
            result.technical_score,
            result.experience_score,
            result.education_score
        );

        Ok(AnalysisOutcome { result, duration })
    }

    pub async fn analyze(
        &self,
        cv: &StructuredCv,
        job: &StructuredJob,
        options: AnalysisOptions,
    ) -> AnalysisResult {
        self.analyze_on(cv, job, options, Utc::now().date_naive()).await
    }

    /// Same as [`analyze`](Self::analyze) with "present" pinned to `today`.
    pub async fn analyze_on(
        &self,
        cv: &StructuredCv,
        job: &StructuredJob,
        options: AnalysisOptions,
        today: NaiveDate,
    ) -> AnalysisResult {
        let (skills, experience) = tokio::join!(
            analyze_skills(&self.reasoner, cv, job),
            analyze_experience(&self.reasoner, cv, job, today),
        );
        let education = analyze_education(cv, job);

        let assessment =
            assess_overall(&self.reasoner, job, &skills, &experience, &education).await;
        let scores = compute_scores(
            &self.weights,
            &skills,
            &experience,
            &education,
            assessment.hire_recommendation,
        );

        let detailed_analysis = options
            .detailed
            .then(|| build_detailed_analysis(cv, &skills, &experience, &education));

        AnalysisResult {
            overall_score: scores.overall,
            technical_score: scores.technical,
            experience_score: scores.experience,
            education_score: scores.education,
            scoring_rationale: assessment.rationale,
            matching_skills: skills.matching(),
            missing_skills: skills.missing,
            recommendations: assessment.recommendations,
            red_flags: assessment.red_flags,
            detailed_analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::testing::ScriptedEngine;
    use crate::models::analysis::{MatchQuality, MatchStrength};
    use crate::models::cv::{Education, Experience};
    use crate::repository::InMemoryStore;

    /// Valid for every reasoning call the pipeline makes, in any order.
    const UNIVERSAL_REPLY: &str = r#"{
        "strong_matches": ["Rust"],
        "critical_gaps": ["Kubernetes"],
        "skill_strength_rating": "strong",
        "relevance_score": "high",
        "matching_experiences": ["Payments platform"],
        "rationale": "Strong backend engineer, light on orchestration.",
        "recommendations": ["Get hands-on with Kubernetes"],
        "red_flags": [],
        "hire_recommendation": "yes"
    }"#;

    fn cv() -> StructuredCv {
        StructuredCv {
            skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            experiences: vec![Experience {
                company: "Acme".to_string(),
                position: "Backend Engineer".to_string(),
                start_date: Some("2019-01".to_string()),
                end_date: Some("2024-01".to_string()),
                location: None,
                responsibilities: vec!["Build payment APIs in Rust".to_string()],
                achievements: vec![],
            }],
            education: vec![Education {
                institution: "MIT".to_string(),
                degree: "Bachelor of Science".to_string(),
                field_of_study: Some("Computer Science".to_string()),
                start_date: None,
                end_date: None,
                gpa: None,
                achievements: vec![],
            }],
            ..Default::default()
        }
    }

    fn job() -> StructuredJob {
        let mut job = StructuredJob::titled("Backend Engineer");
        job.experience_level = Some("Mid".to_string());
        job.required_skills = vec![
            "Rust".to_string(),
            "PostgreSQL".to_string(),
            "Kubernetes".to_string(),
        ];
        job.responsibilities = vec!["Build payment APIs in Rust".to_string()];
        job.education_requirements = vec!["Bachelor's degree".to_string()];
        job
    }

    fn pipeline(engine: &Arc<ScriptedEngine>) -> AnalysisPipeline {
        AnalysisPipeline::new(engine.reasoner())
    }

    #[tokio::test]
    async fn test_full_analysis() {
        let engine = Arc::new(ScriptedEngine::replying(&[UNIVERSAL_REPLY; 3]));

        let result = pipeline(&engine)
            .analyze(&cv(), &job(), AnalysisOptions::default())
            .await;

        assert_eq!(engine.calls(), 3);
        assert_eq!(result.technical_score, 67);
        assert_eq!(result.experience_score, 100);
        assert_eq!(result.education_score, 100);
        // ⌊0.4·67 + 0.4·100 + 0.2·100⌋
        assert_eq!(result.overall_score, 86);
        assert_eq!(result.matching_skills, vec!["Rust", "PostgreSQL"]);
        assert_eq!(result.missing_skills, vec!["Kubernetes"]);
        assert_eq!(result.recommendations, vec!["Get hands-on with Kubernetes"]);

        let detailed = result.detailed_analysis.unwrap();
        assert_eq!(detailed.skill_matches.len(), 2);
        assert_eq!(detailed.experience_matches[0].match_quality, MatchQuality::Full);
        assert!(detailed.education_matches[0].meets_requirement);
        assert_eq!(detailed.education_alignment, MatchStrength::Strong);
        assert_eq!(detailed.technical_gaps, vec!["Kubernetes"]);
        assert_eq!(detailed.experience_strengths, vec!["Payments platform"]);
    }

    #[tokio::test]
    async fn test_every_call_failing_still_scores() {
        let engine = Arc::new(ScriptedEngine::failing());

        let result = pipeline(&engine)
            .analyze(&cv(), &job(), AnalysisOptions { detailed: false })
            .await;

        assert_eq!(engine.calls(), 3);
        assert_eq!(result.scoring_rationale, "Unable to generate detailed analysis");
        assert_eq!(result.technical_score, 67);
        // medium relevance + years bonus
        assert_eq!(result.experience_score, 70);
        assert!(result.detailed_analysis.is_none());
        assert!(result.overall_score <= 100);
    }

    #[tokio::test]
    async fn test_run_reports_missing_records() {
        let engine = Arc::new(ScriptedEngine::failing());
        let store = InMemoryStore::new();
        let stored_cv = store.insert_cv(None, cv()).await.unwrap();
        let missing = Uuid::new_v4();

        let result = pipeline(&engine)
            .run(&store, missing, missing, AnalysisOptions::default())
            .await;
        assert!(matches!(result, Err(AnalysisError::CvNotFound(id)) if id == missing));

        let result = pipeline(&engine)
            .run(&store, stored_cv.id, missing, AnalysisOptions::default())
            .await;
        assert!(matches!(result, Err(AnalysisError::JobNotFound(id)) if id == missing));
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_run_analyzes_stored_records() {
        let engine = Arc::new(ScriptedEngine::replying(&[UNIVERSAL_REPLY; 3]));
        let store = InMemoryStore::new();
        let stored_cv = store.insert_cv(None, cv()).await.unwrap();
        let stored_job = store.insert_job(job()).await.unwrap();

        let outcome = pipeline(&engine)
            .run(&store, stored_cv.id, stored_job.id, AnalysisOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.result.overall_score, 86);
    }

    #[tokio::test]
    async fn test_custom_weights_drive_overall() {
        let engine = Arc::new(ScriptedEngine::replying(&[UNIVERSAL_REPLY; 3]));
        let weights = ScoringWeights {
            technical: 1.0,
            experience: 0.0,
            education: 0.0,
        };

        let result = pipeline(&engine)
            .with_weights(weights)
            .analyze(&cv(), &job(), AnalysisOptions { detailed: false })
            .await;

        assert_eq!(result.technical_score, 67);
        assert_eq!(result.overall_score, 67);
    }
}
