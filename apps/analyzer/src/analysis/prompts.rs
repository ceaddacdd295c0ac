// All reasoning-engine prompt constants for the analysis pipeline.
// Templates carry `{placeholder}` markers that are replaced before sending.

/// CV extraction prompt. The document itself follows as a separate prompt part.
pub const CV_EXTRACTION_PROMPT: &str = r#"You are an expert CV/résumé parser. Extract ALL information from the provided document
and return it as a JSON object following this EXACT schema. Be thorough.

INSTRUCTIONS:
1. Return ONLY valid JSON: no markdown fences, no explanations.
2. Use null for missing optional fields and [] for missing lists. Never omit a field.
3. Write dates as YYYY-MM when possible; use "Present" for current roles.
4. Group technical skills by category ("Programming Languages", "Frameworks", "Databases", "Tools", "Cloud", ...).
5. Separate responsibilities from achievements in each experience.
6. Extract skills mentioned anywhere in the document, not only in a skills section.
7. Arrays of strings must contain strings only, never objects. If an achievement has a date,
   write it into the string: "Achievement text (Date)".

SCHEMA:
{
  "contact_info": {
    "name": "string or null",
    "email": "string or null",
    "phone": "string or null",
    "linkedin": "string or null",
    "github": "string or null",
    "location": "string or null"
  },
  "summary": "string or null",
  "skills": ["string"],
  "technical_skills": {"Category name": ["string"]},
  "experiences": [{
    "company": "string (required)",
    "position": "string (required)",
    "start_date": "YYYY-MM or null",
    "end_date": "YYYY-MM, \"Present\", or null",
    "location": "string or null",
    "responsibilities": ["string"],
    "achievements": ["string"]
  }],
  "education": [{
    "institution": "string (required)",
    "degree": "string (required)",
    "field_of_study": "string or null",
    "start_date": "string or null",
    "end_date": "string or null",
    "gpa": "string or null",
    "achievements": ["string"]
  }],
  "projects": [{
    "name": "string (required)",
    "description": "string or null",
    "technologies": ["string"],
    "role": "string or null",
    "highlights": ["string"]
  }],
  "certifications": [{
    "name": "string (required)",
    "issuer": "string or null",
    "date": "string or null",
    "credential_id": "string or null"
  }],
  "languages": ["string"],
  "achievements": ["string"],
  "publications": ["string"]
}"#;

/// Job posting extraction prompt. The posting follows as a separate prompt part.
pub const JOB_EXTRACTION_PROMPT: &str = r#"You are an expert job description analyst. Extract the structure of the provided
job posting and return it as a JSON object following this EXACT schema.

INSTRUCTIONS:
1. Return ONLY valid JSON: no markdown fences, no explanations.
2. Use null for missing optional fields and [] for missing lists. Never omit a field.
3. required_skills and preferred_skills are short skill names ("Rust", "PostgreSQL"), not sentences.
4. Keep requirement sentences verbatim inside "requirements", grouped by category
   ("Required", "Preferred", "Nice to have").
5. Arrays of strings must contain strings only, never objects.

SCHEMA:
{
  "job_title": "string (required)",
  "company": "string or null",
  "location": "string or null",
  "job_type": "Full-time | Part-time | Contract | ... or null",
  "experience_level": "Entry | Junior | Mid | Senior | Lead | Principal | ... or null",
  "summary": "string or null",
  "responsibilities": ["string"],
  "required_skills": ["string"],
  "preferred_skills": ["string"],
  "requirements": [{"category": "string", "requirements": ["string"]}],
  "education_requirements": ["string"],
  "certifications_required": ["string"],
  "benefits": ["string"],
  "salary_range": "string or null"
}"#;

/// Secondary, best-effort call capturing the document's plain text.
pub const RAW_TEXT_PROMPT: &str =
    "Extract and return all text content from this document as plain text. \
    Do not summarize, reorder, or add commentary.";

/// Replace `{cv_skills}`, `{required_skills}`, `{preferred_skills}` (JSON arrays).
pub const SKILL_INSIGHT_PROMPT_TEMPLATE: &str = r#"Analyze the skills match between this CV and the job requirements.

CV Skills: {cv_skills}
Required Skills: {required_skills}
Preferred Skills: {preferred_skills}

Identify:
1. Direct skill matches
2. Related or transferable skills that could apply
3. Critical gaps
4. Hidden strengths not explicitly listed

Return a JSON object:
{
  "strong_matches": ["skills that strongly match"],
  "partial_matches": ["skills that partially match or are related"],
  "critical_gaps": ["important missing skills"],
  "transferable_skills": ["CV skills that could transfer to job requirements"],
  "skill_strength_rating": "weak | moderate | strong"
}"#;

/// Replace `{experiences}` (JSON), `{job_title}`, `{experience_level}`, `{responsibilities}` (JSON).
pub const EXPERIENCE_PROMPT_TEMPLATE: &str = r#"Analyze how well this candidate's experience matches the job requirements.

Candidate Experience:
{experiences}

Job Requirements:
- Title: {job_title}
- Level: {experience_level}
- Key Responsibilities: {responsibilities}

Analyze:
1. Role similarity and progression
2. Industry/domain relevance
3. Responsibility overlap
4. Achievement quality
5. Career trajectory

Return a JSON object:
{
  "relevance_score": "low | medium | high",
  "matching_experiences": ["relevant experience descriptions"],
  "experience_gaps": ["missing experience areas"],
  "career_progression": "positive | neutral | concerning",
  "years_match": "under | meets | exceeds requirements",
  "key_insights": ["important observations"]
}"#;

/// Replace `{job_title}`, `{company}`, `{experience_level}`, `{matching_required}`,
/// `{total_required}`, `{missing}`, `{total_years}`, `{required_years}`, `{relevance}`,
/// `{meets_education}`, `{has_certifications}`.
pub const OVERALL_PROMPT_TEMPLATE: &str = r#"Analyze this candidate's overall suitability for the position.

Job: {job_title} at {company}
Level: {experience_level}

Skills Match:
- Matching required: {matching_required}/{total_required}
- Missing critical: {missing}

Experience:
- Years: {total_years} (required: {required_years})
- Relevance: {relevance}

Education:
- Meets requirements: {meets_education}
- Has required certifications: {has_certifications}

Provide:
1. Executive summary of fit (2-3 sentences)
2. Top 3-5 specific recommendations for the candidate
3. Any red flags or concerns
4. Overall hire recommendation

Return a JSON object:
{
  "rationale": "executive summary",
  "recommendations": ["specific actionable recommendations"],
  "red_flags": ["concerns or gaps"],
  "hire_recommendation": "strong yes | yes | maybe | no",
  "key_strengths": ["top strengths for this role"],
  "improvement_areas": ["areas to improve for better fit"]
}"#;
