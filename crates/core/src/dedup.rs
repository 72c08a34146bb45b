use crate::embeddings::TextEncoder;
use crate::error::EncoderError;
use crate::models::EncoderFailurePolicy;
use crate::normalize::normalize_question;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Tracks normalized keys already seen.
#[derive(Debug, Default)]
pub struct SurfaceKeys {
    seen: HashSet<String>,
}

impl SurfaceKeys {
    /// Records the key of `question` and reports whether it was new. Empty
    /// keys are never recorded and never count as new.
    pub fn insert(&mut self, question: &str) -> bool {
        let key = normalize_question(question);
        !key.is_empty() && self.seen.insert(key)
    }
}

pub fn surface_dedup(candidates: Vec<String>) -> Vec<String> {
    let mut keys = SurfaceKeys::default();
    candidates
        .into_iter()
        .filter(|question| keys.insert(question))
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    pub similarity_threshold: f32,
    pub policy: EncoderFailurePolicy,
}

impl Deduplicator {
    pub fn new(similarity_threshold: f32, policy: EncoderFailurePolicy) -> Self {
        Self {
            similarity_threshold,
            policy,
        }
    }

    /// Runs the surface pass then the semantic pass. Earlier candidates win
    /// every collision.
    pub fn dedup<E: TextEncoder>(&self, encoder: &E, candidates: Vec<String>) -> Vec<String> {
        let surface_unique = surface_dedup(candidates);
        debug!(count = surface_unique.len(), "surface dedup done");
        self.semantic_dedup(encoder, surface_unique)
    }

    /// Drops every candidate whose best similarity to an already kept
    /// embedding reaches the threshold.
    pub fn semantic_dedup<E: TextEncoder>(&self, encoder: &E, candidates: Vec<String>) -> Vec<String> {
        let mut kept = Vec::with_capacity(candidates.len());
        let mut kept_embeddings: Vec<Vec<f32>> = Vec::with_capacity(candidates.len());

        for question in candidates {
            let embedding = match encoder.encode(&question) {
                Ok(embedding) => embedding,
                Err(error) => {
                    let keep = self.keep_on_failure();
                    warn!(%error, question = question.as_str(), keep, "encoder failed in semantic dedup");
                    if keep {
                        kept.push(question);
                    }
                    continue;
                }
            };

            match self.max_similarity(encoder, &embedding, &kept_embeddings) {
                Ok(Some(similarity)) if similarity >= self.similarity_threshold => {
                    debug!(question = question.as_str(), similarity, "semantic duplicate dropped");
                }
                Ok(_) => {
                    kept_embeddings.push(embedding);
                    kept.push(question);
                }
                Err(error) => {
                    warn!(%error, question = question.as_str(), "similarity failed in semantic dedup");
                    if self.keep_on_failure() {
                        kept.push(question);
                    }
                }
            }
        }

        kept
    }

    fn keep_on_failure(&self) -> bool {
        self.policy == EncoderFailurePolicy::Lenient
    }

    fn max_similarity<E: TextEncoder>(
        &self,
        encoder: &E,
        embedding: &[f32],
        kept: &[Vec<f32>],
    ) -> Result<Option<f32>, EncoderError> {
        let mut best: Option<f32> = None;
        for other in kept {
            let similarity = encoder.similarity(embedding, other)?;
            best = Some(best.map_or(similarity, |current| current.max(similarity)));
        }
        Ok(best)
    }
}
