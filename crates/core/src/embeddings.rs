use crate::error::EncoderError;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 128;

/// Turns a text string into a unit-norm vector suitable for cosine similarity.
pub trait TextEncoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError>;

    fn similarity(&self, left: &[f32], right: &[f32]) -> Result<f32, EncoderError> {
        cosine_similarity(left, right)
    }
}

impl<T: TextEncoder + ?Sized> TextEncoder for &T {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        (**self).encode(text)
    }

    fn similarity(&self, left: &[f32], right: &[f32]) -> Result<f32, EncoderError> {
        (**self).similarity(left, right)
    }
}

impl<T: TextEncoder + ?Sized> TextEncoder for Box<T> {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        (**self).encode(text)
    }

    fn similarity(&self, left: &[f32], right: &[f32]) -> Result<f32, EncoderError> {
        (**self).similarity(left, right)
    }
}

/// Cosine similarity clamped to `[-1, 1]`. A zero vector has similarity 0 with
/// everything.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Result<f32, EncoderError> {
    if left.len() != right.len() {
        return Err(EncoderError::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    let dot = left.iter().zip(right).map(|(a, b)| a * b).sum::<f32>();
    let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();
    if left_norm == 0.0 || right_norm == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (left_norm * right_norm)).clamp(-1.0, 1.0))
}

/// Scales `vector` to unit length in place.
pub fn l2_normalize(vector: &mut [f32]) -> Result<(), EncoderError> {
    let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return Err(EncoderError::EmptyVector);
    }
    for value in vector.iter_mut() {
        *value /= magnitude;
    }
    Ok(())
}

/// Offline encoder hashing lower-cased character trigrams into a fixed number
/// of buckets.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEncoder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEncoder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl TextEncoder for CharacterNgramEncoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        l2_normalize(&mut vector)?;
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_is_deterministic() {
        let encoder = CharacterNgramEncoder::default();
        let first = encoder.encode("Light energy becomes chemical energy").unwrap();
        let second = encoder.encode("Light energy becomes chemical energy").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn encoder_outputs_unit_vectors_of_expected_length() {
        let encoder = CharacterNgramEncoder { dimensions: 32 };
        let vector = encoder.encode("what is glucose?").unwrap();
        assert_eq!(vector.len(), 32);
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn default_encoder_uses_default_dimensions() {
        let vector = CharacterNgramEncoder::default().encode("glucose").unwrap();
        assert_eq!(vector.len(), DEFAULT_EMBEDDING_DIMENSIONS);
        assert_eq!(DEFAULT_EMBEDDING_DIMENSIONS, 128);
    }

    #[test]
    fn encoder_rejects_text_without_trigrams() {
        let encoder = CharacterNgramEncoder::default();
        assert!(matches!(encoder.encode("ab"), Err(EncoderError::EmptyVector)));
    }

    #[test]
    fn similar_texts_score_higher_than_unrelated_ones() {
        let encoder = CharacterNgramEncoder::default();
        let base = encoder.encode("How does photosynthesis store energy?").unwrap();
        let close = encoder.encode("How does photosynthesis store energy in glucose?").unwrap();
        let far = encoder.encode("Who won the 1998 football cup?").unwrap();
        let close_sim = encoder.similarity(&base, &close).unwrap();
        let far_sim = encoder.similarity(&base, &far).unwrap();
        assert!(close_sim > far_sim);
        assert!((encoder.similarity(&base, &base).unwrap() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_similarity_checks_dimensions() {
        let result = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!(matches!(
            result,
            Err(EncoderError::DimensionMismatch { left: 2, right: 3 })
        ));
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap() + 1.0).abs() < 1e-6);
    }
}
