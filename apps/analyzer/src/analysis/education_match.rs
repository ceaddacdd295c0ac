//! Education matching. Purely rule-based: degree and certification checks are
//! categorical, so no reasoning call is made here.

use crate::analysis::normalizer::{certification_matches, education_meets_requirement};
use crate::models::analysis::{EducationMatch, MatchStrength};
use crate::models::cv::StructuredCv;
use crate::models::job::StructuredJob;

#[derive(Debug, Clone, PartialEq)]
pub struct EducationAnalysis {
    /// True when the job lists no education requirements.
    pub meets_requirements: bool,
    /// True when the job lists no required certifications.
    pub has_required_certifications: bool,
    pub missing_certifications: Vec<String>,
    pub education_matches: Vec<EducationMatch>,
    /// Required certifications the CV covers.
    pub certification_matches: Vec<String>,
    pub alignment: MatchStrength,
}

pub fn analyze_education(cv: &StructuredCv, job: &StructuredJob) -> EducationAnalysis {
    let education_matches: Vec<EducationMatch> = job
        .education_requirements
        .iter()
        .map(|requirement| education_match(requirement, cv))
        .collect();

    let meets_requirements = job.education_requirements.is_empty()
        || education_matches.iter().any(|m| m.meets_requirement);

    let (certification_matches, missing_certifications): (Vec<String>, Vec<String>) = job
        .certifications_required
        .iter()
        .cloned()
        .partition(|requirement| {
            cv.certifications
                .iter()
                .any(|cert| certification_matches(&cert.name, requirement))
        });
    let has_required_certifications = missing_certifications.is_empty();

    let alignment = match (meets_requirements, has_required_certifications) {
        (true, true) => MatchStrength::Strong,
        (true, false) => MatchStrength::Moderate,
        (false, _) => MatchStrength::Weak,
    };

    EducationAnalysis {
        meets_requirements,
        has_required_certifications,
        missing_certifications,
        education_matches,
        certification_matches,
        alignment,
    }
}

fn education_match(requirement: &str, cv: &StructuredCv) -> EducationMatch {
    let matched = cv
        .education
        .iter()
        .find(|edu| education_meets_requirement(edu, requirement));

    EducationMatch {
        requirement: requirement.to_string(),
        cv_education: matched.map(|edu| format!("{} from {}", edu.describe(), edu.institution)),
        meets_requirement: matched.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{Certification, Education};

    fn cv() -> StructuredCv {
        StructuredCv {
            education: vec![Education {
                institution: "MIT".to_string(),
                degree: "Bachelor of Science".to_string(),
                field_of_study: Some("Computer Science".to_string()),
                start_date: None,
                end_date: None,
                gpa: None,
                achievements: vec![],
            }],
            certifications: vec![Certification {
                name: "CCNA".to_string(),
                issuer: Some("Cisco".to_string()),
                date: None,
                credential_id: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_no_requirements_is_strong() {
        let analysis = analyze_education(&StructuredCv::default(), &StructuredJob::titled("Dev"));
        assert!(analysis.meets_requirements);
        assert!(analysis.has_required_certifications);
        assert_eq!(analysis.alignment, MatchStrength::Strong);
        assert!(analysis.education_matches.is_empty());
    }

    #[test]
    fn test_degree_met_certification_missing() {
        let mut job = StructuredJob::titled("Network Engineer");
        job.education_requirements = vec!["Bachelor's degree in Computer Science".to_string()];
        job.certifications_required = vec![
            "Cisco CCNP".to_string(),
            "AWS Certified Solutions Architect".to_string(),
        ];

        let analysis = analyze_education(&cv(), &job);

        assert!(analysis.meets_requirements);
        assert_eq!(
            analysis.education_matches[0].cv_education.as_deref(),
            Some("Bachelor of Science in Computer Science from MIT")
        );
        assert_eq!(analysis.certification_matches, vec!["Cisco CCNP"]);
        assert_eq!(
            analysis.missing_certifications,
            vec!["AWS Certified Solutions Architect"]
        );
        assert!(!analysis.has_required_certifications);
        assert_eq!(analysis.alignment, MatchStrength::Moderate);
    }

    #[test]
    fn test_unmet_degree_is_weak() {
        let mut job = StructuredJob::titled("Researcher");
        job.education_requirements = vec!["PhD in Physics".to_string()];

        let analysis = analyze_education(&cv(), &job);

        assert!(!analysis.meets_requirements);
        assert!(!analysis.education_matches[0].meets_requirement);
        assert!(analysis.education_matches[0].cv_education.is_none());
        assert_eq!(analysis.alignment, MatchStrength::Weak);
    }
}
