use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::lenient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub github: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(deserialize_with = "lenient::required_text")]
    pub company: String,
    #[serde(deserialize_with = "lenient::required_text")]
    pub position: String,
    /// `YYYY-MM` once normalized at ingestion.
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub start_date: Option<String>,
    /// `YYYY-MM`, "Present", or absent for a current role.
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub responsibilities: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub achievements: Vec<String>,
}

impl Experience {
    /// Responsibilities followed by achievements.
    pub fn statements(&self) -> impl Iterator<Item = &String> {
        self.responsibilities.iter().chain(&self.achievements)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(deserialize_with = "lenient::required_text")]
    pub institution: String,
    #[serde(deserialize_with = "lenient::required_text")]
    pub degree: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub field_of_study: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub gpa: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub achievements: Vec<String>,
}

impl Education {
    /// "Bachelor of Science in Computer Science", or "... in N/A" without a field.
    pub fn describe(&self) -> String {
        format!(
            "{} in {}",
            self.degree,
            self.field_of_study.as_deref().unwrap_or("N/A")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "lenient::required_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub technologies: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(deserialize_with = "lenient::required_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub issuer: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub credential_id: Option<String>,
}

/// An achievement as the model may emit it. Normalized to a single string at
/// ingestion and never branched on afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Achievement {
    PlainText(String),
    Dated {
        achievement: String,
        #[serde(default)]
        date: Option<String>,
    },
}

impl Achievement {
    pub fn into_text(self) -> String {
        match self {
            Achievement::PlainText(text) => text,
            Achievement::Dated {
                achievement,
                date: Some(date),
            } if !date.trim().is_empty() => format!("{achievement} ({date})"),
            Achievement::Dated { achievement, .. } => achievement,
        }
    }
}

/// A résumé as extracted by the reasoning engine. Every list-typed field is
/// always present, even when the source omitted it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredCv {
    #[serde(deserialize_with = "lenient::object_or_default")]
    pub contact_info: ContactInfo,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub skills: Vec<String>,
    /// Category (e.g. "Programming Languages") → skills.
    #[serde(deserialize_with = "lenient::category_map")]
    pub technical_skills: BTreeMap<String, Vec<String>>,
    #[serde(deserialize_with = "lenient::item_list")]
    pub experiences: Vec<Experience>,
    #[serde(deserialize_with = "lenient::item_list")]
    pub education: Vec<Education>,
    #[serde(deserialize_with = "lenient::item_list")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "lenient::item_list")]
    pub certifications: Vec<Certification>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub languages: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub achievements: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub publications: Vec<String>,
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub raw_text: String,
}
