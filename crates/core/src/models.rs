use crate::error::{ConfigError, GenerationError};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const PROMPT_PREFIX: &str = "generate questions: ";
pub const DEFAULT_MAX_LENGTH: usize = 64;

/// What to do when the encoder fails while judging a candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncoderFailurePolicy {
    /// Accept the candidate and fall back to the degraded path when the
    /// encoder cannot be used at all.
    #[default]
    Lenient,
    /// Reject the candidate; an unusable encoder fails the whole call.
    Strict,
}

/// How aggressively to over-generate candidates for one path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverGeneration {
    pub multiplier: usize,
    pub min_candidates: usize,
    pub min_beams: usize,
}

impl OverGeneration {
    pub const FULL: Self = Self {
        multiplier: 6,
        min_candidates: 20,
        min_beams: 25,
    };

    pub const DEGRADED: Self = Self {
        multiplier: 3,
        min_candidates: 6,
        min_beams: 8,
    };

    pub fn candidate_count(&self, num_questions: usize) -> usize {
        num_questions
            .saturating_mul(self.multiplier)
            .max(self.min_candidates)
    }

    pub fn beam_width(&self, num_questions: usize) -> usize {
        self.candidate_count(num_questions).max(self.min_beams)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationOptions {
    pub num_questions: usize,
    /// Candidates at or above this similarity to an already kept question are
    /// dropped as semantic duplicates.
    pub similarity_threshold: f32,
    /// Minimum question/paragraph similarity for a candidate to count as relevant.
    pub relevance_threshold: f32,
    pub min_words: usize,
    pub max_length: usize,
    pub full_path: OverGeneration,
    pub degraded_path: OverGeneration,
    pub encoder_failure_policy: EncoderFailurePolicy,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            num_questions: 5,
            similarity_threshold: 0.85,
            relevance_threshold: 0.40,
            min_words: 4,
            max_length: DEFAULT_MAX_LENGTH,
            full_path: OverGeneration::FULL,
            degraded_path: OverGeneration::DEGRADED,
            encoder_failure_policy: EncoderFailurePolicy::Lenient,
        }
    }
}

impl GenerationOptions {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.num_questions == 0 {
            return Err(GenerationError::InvalidOptions(
                "num_questions must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("similarity_threshold", self.similarity_threshold),
            ("relevance_threshold", self.relevance_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(GenerationError::InvalidOptions(format!(
                    "{name} must be within [-1, 1], got {value}"
                )));
            }
        }
        for (name, path) in [("full_path", self.full_path), ("degraded_path", self.degraded_path)] {
            if path.multiplier == 0 {
                return Err(GenerationError::InvalidOptions(format!(
                    "{name}.multiplier must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// One beam-search request sent to the proposer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProposalRequest {
    pub prompt: String,
    pub max_length: usize,
    pub beam_width: usize,
    pub return_count: usize,
}

impl ProposalRequest {
    pub fn for_paragraph(
        paragraph: &str,
        num_questions: usize,
        plan: OverGeneration,
        max_length: usize,
    ) -> Self {
        Self {
            prompt: format!("{PROMPT_PREFIX}{paragraph}"),
            max_length,
            beam_width: plan.beam_width(num_questions),
            return_count: plan.candidate_count(num_questions),
        }
    }
}
