//! Pipeline policy and prompt settings.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_CITATION_TOP_N: usize = 4;
pub const DEFAULT_SPECIALTY: &str = "General Surgery";
pub const DEFAULT_REFUSAL: &str =
    "<b>This information is not available in the provided material.</b>";

/// How the citation list is built from the retrieved hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationPolicy {
    /// Deduplicate, rank by occurrence count (ties by first occurrence), keep `top_n`.
    Ranked { top_n: usize },
    /// Deduplicate and list every pair alphabetically, untruncated.
    All,
}

impl Default for CitationPolicy {
    fn default() -> Self {
        CitationPolicy::Ranked { top_n: DEFAULT_CITATION_TOP_N }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationFormat {
    #[default]
    Html,
    Plain,
}

/// What happens when the query normaliser fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPolicy {
    /// The request fails.
    #[default]
    Abort,
    /// Embed the original question instead.
    UseOriginal,
}

/// Text that shapes the synthesis prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    pub specialty: String,
    /// Returned verbatim by the model when the context lacks the answer.
    pub refusal: String,
    /// Answer language; `None` leaves the choice to the model.
    pub language: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            specialty: DEFAULT_SPECIALTY.to_string(),
            refusal: DEFAULT_REFUSAL.to_string(),
            language: None,
        }
    }
}

/// Sampling overrides sent with both completion calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub top_k: usize,
    pub citation_policy: CitationPolicy,
    pub citation_format: CitationFormat,
    pub normalization: NormalizationPolicy,
    pub prompt: PromptConfig,
    pub generation: GenerationOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            citation_policy: CitationPolicy::default(),
            citation_format: CitationFormat::default(),
            normalization: NormalizationPolicy::default(),
            prompt: PromptConfig::default(),
            generation: GenerationOptions::default(),
        }
    }
}
