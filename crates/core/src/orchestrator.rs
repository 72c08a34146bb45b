use crate::dedup::{surface_dedup, Deduplicator, SurfaceKeys};
use crate::embeddings::TextEncoder;
use crate::error::{EncoderError, GenerationError};
use crate::models::{EncoderFailurePolicy, GenerationOptions, ProposalRequest};
use crate::quality::{repair_structure, QualityFilter};
use crate::ranking::select;
use crate::traits::QuestionProposer;
use tracing::{debug, info, warn};

/// Turns a paragraph into a short ranked list of questions.
///
/// The proposer and encoder are optional: a missing proposer makes every call
/// return the "model not loaded" sentinel, a missing encoder switches to the
/// degraded path (structure checks and surface dedup only).
pub struct QuestionGenerator<P, E>
where
    P: QuestionProposer,
    E: TextEncoder,
{
    proposer: Option<P>,
    encoder: Option<E>,
    options: GenerationOptions,
    quality: Result<QualityFilter, regex::Error>,
}

impl<P, E> QuestionGenerator<P, E>
where
    P: QuestionProposer,
    E: TextEncoder,
{
    pub fn new(proposer: Option<P>, encoder: Option<E>) -> Self {
        let options = GenerationOptions::default();
        Self {
            proposer,
            encoder,
            quality: QualityFilter::new(&options),
            options,
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.quality = self
            .quality
            .map(|filter| filter.configured_for(&options));
        self.options = options;
        self
    }

    /// Replaces the vague-question patterns. They are compiled once here and
    /// reused by every call.
    pub fn with_vague_patterns(mut self, patterns: &[&str]) -> Self {
        self.quality = QualityFilter::with_vague_patterns(&self.options, patterns);
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Generates up to `num_questions` questions. Failures come back as a
    /// single human-readable message instead of an error.
    pub fn generate(
        &self,
        paragraph: &str,
        num_questions: usize,
        similarity_threshold: f32,
    ) -> Vec<String> {
        let options = GenerationOptions {
            num_questions,
            similarity_threshold,
            ..self.options.clone()
        };
        self.generate_with_options(paragraph, &options)
    }

    pub fn generate_with_options(&self, paragraph: &str, options: &GenerationOptions) -> Vec<String> {
        self.try_generate(paragraph, options).unwrap_or_else(|error| {
            warn!(%error, "question generation failed");
            error.into_messages()
        })
    }

    pub fn try_generate(
        &self,
        paragraph: &str,
        options: &GenerationOptions,
    ) -> Result<Vec<String>, GenerationError> {
        let proposer = self
            .proposer
            .as_ref()
            .ok_or(GenerationError::ModelUnavailable)?;
        options.validate()?;

        let Some(encoder) = self.encoder.as_ref() else {
            return match options.encoder_failure_policy {
                EncoderFailurePolicy::Lenient => {
                    warn!("text encoder not loaded, using degraded path");
                    degraded_path(proposer, paragraph, options)
                }
                EncoderFailurePolicy::Strict => Err(EncoderError::Unavailable.into()),
            };
        };

        let paragraph_embedding = match encoder.encode(paragraph) {
            Ok(embedding) => embedding,
            Err(error) if options.encoder_failure_policy == EncoderFailurePolicy::Lenient => {
                warn!(%error, "text encoder failed on paragraph, using degraded path");
                return degraded_path(proposer, paragraph, options);
            }
            Err(error) => return Err(error.into()),
        };

        let filter = self
            .quality
            .as_ref()
            .map_err(|error| GenerationError::Pattern(error.clone()))?
            .configured_for(options);
        full_path(proposer, encoder, &filter, paragraph, &paragraph_embedding, options)
    }
}

fn full_path<P, E>(
    proposer: &P,
    encoder: &E,
    filter: &QualityFilter,
    paragraph: &str,
    paragraph_embedding: &[f32],
    options: &GenerationOptions,
) -> Result<Vec<String>, GenerationError>
where
    P: QuestionProposer,
    E: TextEncoder,
{
    let request = ProposalRequest::for_paragraph(
        paragraph,
        options.num_questions,
        options.full_path,
        options.max_length,
    );
    debug!(
        return_count = request.return_count,
        beam_width = request.beam_width,
        "requesting candidates"
    );
    let raw = proposer.propose(&request)?;

    let accepted = filter.filter(encoder, &raw, paragraph_embedding);
    if accepted.is_empty() {
        info!(raw = raw.len(), "no candidate passed the quality filter");
        return Err(GenerationError::EmptyResult);
    }

    let surface_unique = surface_dedup(accepted.clone());
    if surface_unique.is_empty() {
        return Err(GenerationError::EmptyResult);
    }

    let deduplicator =
        Deduplicator::new(options.similarity_threshold, options.encoder_failure_policy);
    let unique = deduplicator.semantic_dedup(encoder, surface_unique.clone());
    if unique.is_empty() {
        return Err(GenerationError::EmptyResult);
    }

    let selected = select(unique.clone(), options.num_questions);
    info!(
        raw = raw.len(),
        accepted = accepted.len(),
        surface_unique = surface_unique.len(),
        semantic_unique = unique.len(),
        selected = selected.len(),
        "questions generated"
    );
    Ok(selected)
}

fn degraded_path<P>(
    proposer: &P,
    paragraph: &str,
    options: &GenerationOptions,
) -> Result<Vec<String>, GenerationError>
where
    P: QuestionProposer,
{
    let request = ProposalRequest::for_paragraph(
        paragraph,
        options.num_questions,
        options.degraded_path,
        options.max_length,
    );
    let raw = proposer.propose(&request)?;

    let mut keys = SurfaceKeys::default();
    let mut questions = Vec::new();
    for candidate in &raw {
        let Some(question) = repair_structure(candidate, options.min_words) else {
            continue;
        };
        if keys.insert(&question) {
            questions.push(question);
        }
        if questions.len() >= options.num_questions {
            break;
        }
    }

    info!(raw = raw.len(), selected = questions.len(), "questions generated without encoder");
    if questions.is_empty() {
        return Err(GenerationError::EmptyResult);
    }
    Ok(questions)
}
