use serde::{Deserialize, Serialize};

use crate::models::lenient;

/// A group of requirements under one heading ("Required", "Preferred", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRequirement")]
pub struct JobRequirement {
    pub category: String,
    pub requirements: Vec<String>,
}

/// Requirement groups arrive either grouped or as bare strings; a bare string
/// is treated as a single required item.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRequirement {
    Grouped {
        category: String,
        #[serde(default, deserialize_with = "lenient::string_list")]
        requirements: Vec<String>,
    },
    Plain(String),
}

impl From<RawRequirement> for JobRequirement {
    fn from(raw: RawRequirement) -> Self {
        match raw {
            RawRequirement::Grouped {
                category,
                requirements,
            } => JobRequirement {
                category,
                requirements,
            },
            RawRequirement::Plain(text) => JobRequirement {
                category: "Required".to_string(),
                requirements: vec![text],
            },
        }
    }
}

/// A job posting as extracted by the reasoning engine. `job_title` is the only
/// required field; every list-typed field is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredJob {
    #[serde(deserialize_with = "lenient::required_text")]
    pub job_title: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub location: Option<String>,
    /// Full-time, Part-time, Contract, ...
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub job_type: Option<String>,
    /// Entry, Mid, Senior, ...
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub experience_level: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub responsibilities: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub required_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub preferred_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::item_list")]
    pub requirements: Vec<JobRequirement>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub education_requirements: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub certifications_required: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub benefits: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub salary_range: Option<String>,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub raw_text: String,
}

#[cfg(test)]
impl StructuredJob {
    /// A job with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            job_title: title.into(),
            company: None,
            location: None,
            job_type: None,
            experience_level: None,
            summary: None,
            responsibilities: Vec::new(),
            required_skills: Vec::new(),
            preferred_skills: Vec::new(),
            requirements: Vec::new(),
            education_requirements: Vec::new(),
            certifications_required: Vec::new(),
            benefits: Vec::new(),
            salary_range: None,
            raw_text: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_title_is_required() {
        let result: Result<StructuredJob, _> =
            serde_json::from_value(json!({"company": "Acme"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_minimal_job_has_empty_lists() {
        let job: StructuredJob =
            serde_json::from_value(json!({"job_title": "Backend Engineer"})).unwrap();
        assert_eq!(job, StructuredJob::titled("Backend Engineer"));
    }

    #[test]
    fn test_plain_string_requirements_become_required_group() {
        let job: StructuredJob = serde_json::from_value(json!({
            "job_title": "SRE",
            "requirements": [
                {"category": "Preferred", "requirements": ["Terraform"]},
                "5+ years of Linux administration",
                42
            ]
        }))
        .unwrap();
        assert_eq!(job.requirements.len(), 2);
        assert_eq!(job.requirements[0].category, "Preferred");
        assert_eq!(job.requirements[1].category, "Required");
        assert_eq!(
            job.requirements[1].requirements,
            vec!["5+ years of Linux administration"]
        );
    }

    #[test]
    fn test_serialized_requirement_round_trips() {
        let group = JobRequirement {
            category: "Required".to_string(),
            requirements: vec!["Rust".to_string()],
        };
        let value = serde_json::to_value(&group).unwrap();
        let back: JobRequirement = serde_json::from_value(value).unwrap();
        assert_eq!(back, group);
    }
}
