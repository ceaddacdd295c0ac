//! Normalizer: deterministic reconciliation of free-text entities between a
//! CV and a job posting extracted independently of each other.
//!
//! Everything here is pure: no I/O, no model calls. The tables are hand-tuned
//! and kept as-is for behavior compatibility.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::models::cv::{Education, Experience};
use crate::models::job::StructuredJob;

/// Canonical term → accepted variants.
const SKILL_SYNONYMS: &[(&str, &[&str])] = &[
    ("javascript", &["js", "node.js", "nodejs"]),
    ("python", &["py"]),
    ("kubernetes", &["k8s"]),
    ("amazon web services", &["aws"]),
    ("google cloud platform", &["gcp"]),
    ("continuous integration", &["ci", "ci/cd"]),
];

/// Certification vendor → abbreviations and alternative spellings.
const CERTIFICATION_SYNONYMS: &[(&str, &[&str])] = &[
    ("aws certified", &["aws", "amazon web services"]),
    ("azure", &["az-", "microsoft azure"]),
    ("google cloud", &["gcp", "google certified"]),
    ("cisco", &["ccna", "ccnp", "ccie"]),
    ("comptia", &["a+", "network+", "security+"]),
];

const DEGREE_LEVELS: &[&str] = &["bachelor", "master", "phd", "doctorate"];

/// Checked in order; the first keyword contained in the level wins.
const EXPERIENCE_LEVEL_YEARS: &[(&str, u32)] = &[
    ("entry", 0),
    ("junior", 1),
    ("mid", 3),
    ("senior", 5),
    ("lead", 7),
    ("principal", 10),
];

/// Skills picked out of free-text responsibilities and project descriptions.
pub const SKILL_KEYWORDS: &[&str] = &[
    "python",
    "java",
    "javascript",
    "react",
    "django",
    "aws",
    "docker",
    "kubernetes",
    "sql",
    "mongodb",
    "git",
    "ci/cd",
    "agile",
    "scrum",
];

/// Months credited for a role whose dates cannot be parsed.
pub const UNPARSABLE_ROLE_MONTHS: u32 = 24;

/// Fuzzy skill comparison: exact (case-insensitive), substring either way, or
/// both terms in the same synonym group.
pub fn skills_match(required: &str, candidate: &str) -> bool {
    let required = required.trim().to_lowercase();
    let candidate = candidate.trim().to_lowercase();

    if required.is_empty() || candidate.is_empty() {
        return false;
    }
    if required == candidate || required.contains(&candidate) || candidate.contains(&required) {
        return true;
    }

    SKILL_SYNONYMS.iter().any(|(canonical, variants)| {
        let in_group = |term: &str| term == *canonical || variants.contains(&term);
        in_group(required.as_str()) && in_group(candidate.as_str())
    })
}

/// Substring either way, or some vendor group has a term occurring in both.
pub fn certification_matches(name: &str, requirement: &str) -> bool {
    let name = name.trim().to_lowercase();
    let requirement = requirement.trim().to_lowercase();

    if name.is_empty() || requirement.is_empty() {
        return false;
    }
    if requirement.contains(&name) || name.contains(&requirement) {
        return true;
    }

    CERTIFICATION_SYNONYMS.iter().any(|(vendor, variants)| {
        let mentions = |text: &str| text.contains(vendor) || variants.iter().any(|v| text.contains(v));
        mentions(requirement.as_str()) && mentions(name.as_str())
    })
}

/// True when both sides name the same degree level, or any word of the
/// field of study occurs in the requirement.
pub fn education_meets_requirement(education: &Education, requirement: &str) -> bool {
    let requirement = requirement.to_lowercase();
    let education_text = format!(
        "{} {}",
        education.degree,
        education.field_of_study.as_deref().unwrap_or("")
    )
    .to_lowercase();

    if DEGREE_LEVELS
        .iter()
        .any(|level| requirement.contains(level) && education_text.contains(level))
    {
        return true;
    }

    education
        .field_of_study
        .as_deref()
        .map(|field| {
            field
                .to_lowercase()
                .split_whitespace()
                .any(|word| requirement.contains(word))
        })
        .unwrap_or(false)
}

/// Jaccard similarity of the lower-cased whitespace-separated word sets.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let words = |text: &str| {
        text.to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect::<std::collections::HashSet<_>>()
    };
    let (left, right) = (words(a), words(b));

    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();
    intersection as f64 / union as f64
}

/// Whole years of experience across all roles, measured up to `today`.
///
/// Roles without a start date count for nothing. A missing or "present" end
/// date means the role is ongoing. When either date is present but cannot be
/// parsed as `YYYY-MM`, the role is credited with a flat
/// [`UNPARSABLE_ROLE_MONTHS`].
pub fn total_experience_years(experiences: &[Experience], today: NaiveDate) -> u32 {
    let total_months: u32 = experiences
        .iter()
        .filter_map(|exp| exp.start_date.as_deref().map(|start| (start, exp.end_date.as_deref())))
        .map(|(start, end)| role_months(start, end, today).unwrap_or(UNPARSABLE_ROLE_MONTHS))
        .sum();

    total_months / 12
}

fn role_months(start: &str, end: Option<&str>, today: NaiveDate) -> Option<u32> {
    let start = parse_year_month(start)?;
    let end = match end {
        Some(end) if !is_present(end) => parse_year_month(end)?,
        _ => today,
    };
    let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    Some(months.max(0) as u32)
}

fn is_present(date: &str) -> bool {
    matches!(
        date.trim().to_lowercase().as_str(),
        "present" | "current" | "now" | "ongoing"
    )
}

fn parse_year_month(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", date.trim()), "%Y-%m-%d").ok()
}

/// Years of experience a posting asks for: the experience-level table first,
/// then the first "<N>+ years" found in the requirement groups, else 0.
pub fn required_years(job: &StructuredJob) -> u32 {
    if let Some(level) = job.experience_level.as_deref() {
        let level = level.to_lowercase();
        if let Some((_, years)) = EXPERIENCE_LEVEL_YEARS
            .iter()
            .find(|(keyword, _)| level.contains(keyword))
        {
            return *years;
        }
    }

    job.requirements
        .iter()
        .flat_map(|group| &group.requirements)
        .find_map(|requirement| years_in_text(requirement))
        .unwrap_or(0)
}

fn years_in_text(text: &str) -> Option<u32> {
    static YEARS: OnceLock<Regex> = OnceLock::new();
    let pattern = YEARS.get_or_init(|| Regex::new(r"(\d+)\+?\s*years?").expect("valid regex"));
    pattern
        .captures(&text.to_lowercase())
        .and_then(|caps| caps[1].parse().ok())
}

/// Keywords from [`SKILL_KEYWORDS`] mentioned anywhere in `text`.
pub fn skills_in_text(text: &str) -> Vec<&'static str> {
    let text = text.to_lowercase();
    SKILL_KEYWORDS
        .iter()
        .copied()
        .filter(|skill| text.contains(skill))
        .collect()
}

/// Normalizes common résumé date spellings to `YYYY-MM`.
///
/// Accepts `YYYY-MM`, `MM/YYYY`, `Month YYYY` (full or abbreviated) and a bare
/// `YYYY` (→ January). Anything else, "Present" included, is returned trimmed
/// but otherwise untouched.
pub fn normalize_date(date: &str) -> String {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();
    let [year_month, month_slash_year, month_name_year, year_only] = PATTERNS.get_or_init(|| {
        [
            Regex::new(r"^(\d{4})-(\d{1,2})").expect("valid regex"),
            Regex::new(r"^(\d{1,2})/(\d{4})").expect("valid regex"),
            Regex::new(r"^([A-Za-z]+)\.?\s+(\d{4})").expect("valid regex"),
            Regex::new(r"^(\d{4})").expect("valid regex"),
        ]
    });

    let date = date.trim();

    let formatted = |year: &str, month: u32| -> Option<String> {
        (1..=12).contains(&month).then(|| format!("{year}-{month:02}"))
    };

    if let Some(caps) = year_month.captures(date) {
        if let Some(normalized) = caps[2].parse().ok().and_then(|m| formatted(&caps[1], m)) {
            return normalized;
        }
    }
    if let Some(caps) = month_slash_year.captures(date) {
        if let Some(normalized) = caps[1].parse().ok().and_then(|m| formatted(&caps[2], m)) {
            return normalized;
        }
    }
    if let Some(caps) = month_name_year.captures(date) {
        if let Some(month) = month_number(&caps[1]) {
            return format!("{}-{month:02}", &caps[2]);
        }
    }
    if let Some(caps) = year_only.captures(date) {
        return format!("{}-01", &caps[1]);
    }

    date.to_string()
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let name = name.to_lowercase();
    if name.len() < 3 {
        return None;
    }
    let month = MONTHS.iter().position(|m| name.starts_with(m))? as u32 + 1;
    let full = chrono::Month::try_from(month as u8).ok()?.name().to_lowercase();
    // Reject words that merely share the first three letters ("Marching").
    full.starts_with(&name).then_some(month)
}
