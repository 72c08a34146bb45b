use crate::embeddings::TextEncoder;
use crate::models::{EncoderFailurePolicy, GenerationOptions};
use regex::Regex;
use std::fmt;
use tracing::{debug, warn};

pub const INTERROGATIVE_OPENERS: [&str; 7] =
    ["who", "what", "when", "where", "why", "how", "which"];

/// Low-information templates the proposer tends to echo.
pub const VAGUE_PATTERNS: [&str; 6] = [
    r"what does it mean to",
    r"what does .* do",
    r"what is it",
    r"what does it mean",
    r"how does it work",
    r"what does it do",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Structure,
    Vague(String),
    Irrelevant { similarity: f32 },
    EncoderFailure(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Structure => write!(f, "too short or not interrogative"),
            Rejection::Vague(pattern) => write!(f, "matches vague pattern `{pattern}`"),
            Rejection::Irrelevant { similarity } => {
                write!(f, "paragraph similarity {similarity:.3} below threshold")
            }
            Rejection::EncoderFailure(cause) => write!(f, "encoder failed: {cause}"),
        }
    }
}

/// Trims `candidate`, appends `?` to interrogative openers missing one, and
/// returns the repaired question if it ends in `?` and has at least
/// `min_words` words.
pub fn repair_structure(candidate: &str, min_words: usize) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut question = trimmed.to_string();
    if !question.ends_with('?') {
        let lowered = question.to_lowercase();
        if INTERROGATIVE_OPENERS
            .iter()
            .any(|opener| lowered.starts_with(opener))
        {
            question.push('?');
        }
    }

    if question.ends_with('?') && question.split_whitespace().count() >= min_words {
        Some(question)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct QualityFilter {
    vague: Vec<Regex>,
    relevance_threshold: f32,
    min_words: usize,
    policy: EncoderFailurePolicy,
}

impl QualityFilter {
    pub fn new(options: &GenerationOptions) -> Result<Self, regex::Error> {
        Self::with_vague_patterns(options, &VAGUE_PATTERNS)
    }

    pub fn with_vague_patterns(
        options: &GenerationOptions,
        patterns: &[&str],
    ) -> Result<Self, regex::Error> {
        let vague = patterns
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            vague,
            relevance_threshold: options.relevance_threshold,
            min_words: options.min_words,
            policy: options.encoder_failure_policy,
        })
    }

    /// Same compiled patterns, thresholds and policy taken from `options`.
    pub fn configured_for(&self, options: &GenerationOptions) -> Self {
        Self {
            vague: self.vague.clone(),
            relevance_threshold: options.relevance_threshold,
            min_words: options.min_words,
            policy: options.encoder_failure_policy,
        }
    }

    pub fn repair_structure(&self, candidate: &str) -> Option<String> {
        repair_structure(candidate, self.min_words)
    }

    /// Returns the first vague pattern the lower-cased question matches.
    pub fn vague_match(&self, question: &str) -> Option<&str> {
        let lowered = question.to_lowercase();
        self.vague
            .iter()
            .find(|pattern| pattern.is_match(&lowered))
            .map(Regex::as_str)
    }

    /// Relevance against an already encoded paragraph. Encoder failures are
    /// resolved by the configured policy.
    pub fn check_relevance<E: TextEncoder>(
        &self,
        encoder: &E,
        question: &str,
        paragraph_embedding: &[f32],
    ) -> Result<(), Rejection> {
        let similarity = encoder
            .encode(question)
            .and_then(|embedding| encoder.similarity(&embedding, paragraph_embedding));

        match similarity {
            Ok(similarity) if similarity >= self.relevance_threshold => Ok(()),
            Ok(similarity) => Err(Rejection::Irrelevant { similarity }),
            Err(error) => match self.policy {
                EncoderFailurePolicy::Lenient => {
                    warn!(%error, question, "encoder failed during relevance check, accepting");
                    Ok(())
                }
                EncoderFailurePolicy::Strict => Err(Rejection::EncoderFailure(error.to_string())),
            },
        }
    }

    /// Semantic acceptance of a structurally valid question: not vague and
    /// related to `paragraph`.
    pub fn is_acceptable<E: TextEncoder>(&self, encoder: &E, question: &str, paragraph: &str) -> bool {
        if self.vague_match(question).is_some() {
            return false;
        }

        match encoder.encode(paragraph) {
            Ok(paragraph_embedding) => self
                .check_relevance(encoder, question, &paragraph_embedding)
                .is_ok(),
            Err(error) => {
                warn!(%error, "encoder failed on paragraph");
                self.policy == EncoderFailurePolicy::Lenient
            }
        }
    }

    /// Runs every check over `raw` in arrival order and returns the repaired
    /// survivors.
    pub fn filter<E: TextEncoder>(
        &self,
        encoder: &E,
        raw: &[String],
        paragraph_embedding: &[f32],
    ) -> Vec<String> {
        raw.iter()
            .filter_map(|candidate| match self.assess(encoder, candidate, paragraph_embedding) {
                Ok(question) => Some(question),
                Err(rejection) => {
                    debug!(candidate = candidate.as_str(), %rejection, "candidate rejected");
                    None
                }
            })
            .collect()
    }

    fn assess<E: TextEncoder>(
        &self,
        encoder: &E,
        candidate: &str,
        paragraph_embedding: &[f32],
    ) -> Result<String, Rejection> {
        let question = self.repair_structure(candidate).ok_or(Rejection::Structure)?;
        if let Some(pattern) = self.vague_match(&question) {
            return Err(Rejection::Vague(pattern.to_string()));
        }
        self.check_relevance(encoder, &question, paragraph_embedding)?;
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncoderError;
    use std::collections::HashMap;

    /// Looks embeddings up by exact text; unknown text fails to encode.
    struct TableEncoder {
        table: HashMap<String, Vec<f32>>,
    }

    impl TableEncoder {
        fn new(entries: &[(&str, [f32; 2])]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(text, vector)| (text.to_string(), vector.to_vec()))
                    .collect(),
            }
        }
    }

    impl TextEncoder for TableEncoder {
        fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
            self.table
                .get(text)
                .cloned()
                .ok_or_else(|| EncoderError::Request(format!("unknown text: {text}")))
        }
    }

    fn filter_with(policy: EncoderFailurePolicy) -> QualityFilter {
        let options = GenerationOptions {
            encoder_failure_policy: policy,
            ..GenerationOptions::default()
        };
        QualityFilter::new(&options).unwrap()
    }

    #[test]
    fn structure_repairs_interrogatives_and_rejects_others() {
        assert_eq!(
            repair_structure("  What is stored in glucose  ", 4),
            Some("What is stored in glucose?".to_string())
        );
        assert_eq!(
            repair_structure("Which organelle captures light?", 4),
            Some("Which organelle captures light?".to_string())
        );
        assert_eq!(repair_structure("Plants convert light energy", 4), None);
        assert_eq!(repair_structure("Why plants?", 4), None);
        assert_eq!(repair_structure("", 4), None);
        assert_eq!(repair_structure("   ", 4), None);
    }

    #[test]
    fn vague_templates_are_detected() {
        let filter = filter_with(EncoderFailurePolicy::Lenient);
        assert_eq!(filter.vague_match("What does it do?"), Some("what does .* do"));
        assert!(filter.vague_match("How does it work in practice?").is_some());
        assert!(filter.vague_match("What does the chlorophyll do?").is_some());
        assert!(filter
            .vague_match("What energy is stored in glucose?")
            .is_none());
    }

    #[test]
    fn relevance_threshold_separates_related_questions() {
        let filter = filter_with(EncoderFailurePolicy::Lenient);
        let encoder = TableEncoder::new(&[
            ("paragraph", [1.0, 0.0]),
            ("Where is energy stored in plants?", [0.6, 0.8]),
            ("Who won the football cup last year?", [0.0, 1.0]),
        ]);

        assert!(filter.is_acceptable(&encoder, "Where is energy stored in plants?", "paragraph"));
        assert!(!filter.is_acceptable(&encoder, "Who won the football cup last year?", "paragraph"));
    }

    #[test]
    fn encoder_failures_follow_policy() {
        let encoder = TableEncoder::new(&[("paragraph", [1.0, 0.0])]);
        let question = "Why is light energy converted?";

        let lenient = filter_with(EncoderFailurePolicy::Lenient);
        assert!(lenient.is_acceptable(&encoder, question, "paragraph"));
        assert!(lenient.is_acceptable(&encoder, question, "unknown paragraph"));

        let strict = filter_with(EncoderFailurePolicy::Strict);
        assert!(!strict.is_acceptable(&encoder, question, "paragraph"));
        assert!(!strict.is_acceptable(&encoder, question, "unknown paragraph"));
        assert!(matches!(
            strict.check_relevance(&encoder, question, &[1.0, 0.0]),
            Err(Rejection::EncoderFailure(_))
        ));
    }

    #[test]
    fn filter_applies_checks_in_order_and_keeps_arrival_order() {
        let filter = filter_with(EncoderFailurePolicy::Lenient);
        let encoder = TableEncoder::new(&[
            ("What is stored in glucose?", [0.9, 0.435_889_9]),
            ("How is light energy converted?", [0.8, 0.6]),
            ("Who painted the famous portrait?", [0.1, 0.994_987_4]),
        ]);
        let raw = vec![
            "How is light energy converted".to_string(),
            "What does it do?".to_string(),
            "Glucose".to_string(),
            "Who painted the famous portrait?".to_string(),
            "What is stored in glucose?".to_string(),
            String::new(),
        ];

        let accepted = filter.filter(&encoder, &raw, &[1.0, 0.0]);
        assert_eq!(
            accepted,
            vec![
                "How is light energy converted?".to_string(),
                "What is stored in glucose?".to_string(),
            ]
        );
    }

    #[test]
    fn configured_filter_keeps_patterns_and_takes_new_thresholds() {
        let base = QualityFilter::with_vague_patterns(&GenerationOptions::default(), &["glucose"])
            .unwrap();
        let options = GenerationOptions {
            min_words: 2,
            relevance_threshold: 0.9,
            encoder_failure_policy: EncoderFailurePolicy::Strict,
            ..GenerationOptions::default()
        };
        let configured = base.configured_for(&options);

        assert_eq!(configured.vague_match("Why store glucose?"), Some("glucose"));
        assert_eq!(configured.repair_structure("Why plants"), Some("Why plants?".to_string()));

        let encoder = TableEncoder::new(&[("How is light converted?", [0.8, 0.6])]);
        assert!(matches!(
            configured.check_relevance(&encoder, "How is light converted?", &[1.0, 0.0]),
            Err(Rejection::Irrelevant { .. })
        ));
        assert!(base
            .check_relevance(&encoder, "How is light converted?", &[1.0, 0.0])
            .is_ok());
    }
}
