// CV / job analysis: document extraction, the three matchers, scoring and the
// pipeline that ties them together.
// All reasoning calls go through llm_client::Reasoner.

pub mod document;
pub mod education_match;
pub mod experience_match;
pub mod extractor;
pub mod handlers;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod scoring;
pub mod skill_match;
