use crate::embeddings::{l2_normalize, TextEncoder};
use crate::error::{EncoderError, ProposerError};
use crate::models::ProposalRequest;
use crate::traits::QuestionProposer;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    pub url: Url,
    pub api_key: Option<String>,
}

impl RemoteEndpoint {
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self, url::ParseError> {
        let url = Url::parse(url.trim())?;
        let api_key = api_key.and_then(|value| {
            let key = value.trim().to_string();
            if key.is_empty() {
                None
            } else {
                Some(key)
            }
        });
        Ok(Self { url, api_key })
    }

    fn post(&self, client: &Client) -> RequestBuilder {
        let request = client
            .post(self.url.clone())
            .header("content-type", "application/json");
        match &self.api_key {
            Some(api_key) => request.bearer_auth(api_key),
            None => request,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_length: usize,
    num_beams: usize,
    num_return_sequences: usize,
    do_sample: bool,
    early_stopping: bool,
}

#[derive(Debug, Serialize)]
struct GenerationPayload<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

impl<'a> From<&'a ProposalRequest> for GenerationPayload<'a> {
    fn from(request: &'a ProposalRequest) -> Self {
        Self {
            inputs: &request.prompt,
            parameters: GenerationParameters {
                max_length: request.max_length,
                num_beams: request.beam_width,
                num_return_sequences: request.return_count,
                do_sample: false,
                early_stopping: true,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedSequence {
    #[serde(default)]
    generated_text: Option<String>,
}

/// Text2text generation endpoint: `{"inputs", "parameters"}` in,
/// `[{"generated_text"}]` out.
pub struct HttpQuestionProposer {
    endpoint: RemoteEndpoint,
    client: Client,
}

impl HttpQuestionProposer {
    pub fn new(endpoint: RemoteEndpoint) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }
}

impl QuestionProposer for HttpQuestionProposer {
    fn propose(&self, request: &ProposalRequest) -> Result<Vec<String>, ProposerError> {
        let response = self
            .endpoint
            .post(&self.client)
            .json(&GenerationPayload::from(request))
            .send()?;

        if !response.status().is_success() {
            return Err(ProposerError::Request(format!(
                "generation request to {} returned {}",
                self.endpoint.url,
                response.status()
            )));
        }

        let payload: Value = response.json()?;
        parse_generated(payload)
    }
}

fn parse_generated(payload: Value) -> Result<Vec<String>, ProposerError> {
    let sequences: Vec<GeneratedSequence> = serde_json::from_value(payload)
        .map_err(|error| ProposerError::InvalidResponse(error.to_string()))?;

    Ok(sequences
        .into_iter()
        .map(|sequence| {
            sequence
                .generated_text
                .map(|text| text.trim().to_string())
                .unwrap_or_default()
        })
        .collect())
}

#[derive(Debug, Serialize)]
struct EncodePayload<'a> {
    inputs: &'a str,
}

/// Feature-extraction endpoint: `{"inputs"}` in, a vector or one-row matrix out.
pub struct HttpTextEncoder {
    endpoint: RemoteEndpoint,
    client: Client,
}

impl HttpTextEncoder {
    pub fn new(endpoint: RemoteEndpoint) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }
}

impl TextEncoder for HttpTextEncoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        let response = self
            .endpoint
            .post(&self.client)
            .json(&EncodePayload { inputs: text })
            .send()?;

        if !response.status().is_success() {
            return Err(EncoderError::Request(format!(
                "embedding request to {} returned {}",
                self.endpoint.url,
                response.status()
            )));
        }

        let payload: Value = response.json()?;
        parse_embedding(&payload)
    }
}

/// Accepts a flat vector or a single-row matrix and returns it unit-normalized.
fn parse_embedding(payload: &Value) -> Result<Vec<f32>, EncoderError> {
    let row = match payload.as_array() {
        Some(values) if values.first().is_some_and(Value::is_array) => values[0]
            .as_array()
            .cloned()
            .unwrap_or_default(),
        Some(values) => values.clone(),
        None => {
            return Err(EncoderError::InvalidResponse(
                "expected a JSON array of numbers".to_string(),
            ))
        }
    };

    let mut vector = row
        .iter()
        .map(|value| {
            value
                .as_f64()
                .map(|number| number as f32)
                .ok_or_else(|| EncoderError::InvalidResponse(format!("not a number: {value}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if vector.is_empty() {
        return Err(EncoderError::EmptyVector);
    }
    l2_normalize(&mut vector)?;
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OverGeneration;
    use serde_json::json;

    #[test]
    fn endpoint_drops_blank_api_keys() {
        let endpoint = RemoteEndpoint::new(" http://localhost:8080/generate ", Some("  ".to_string()))
            .expect("url should parse");
        assert_eq!(endpoint.url.as_str(), "http://localhost:8080/generate");
        assert!(endpoint.api_key.is_none());

        assert!(RemoteEndpoint::new("not a url", None).is_err());
    }

    #[test]
    fn generation_payload_carries_beam_settings() {
        let request = ProposalRequest::for_paragraph("Cells divide.", 5, OverGeneration::FULL, 64);
        let payload = serde_json::to_value(GenerationPayload::from(&request)).unwrap();
        assert_eq!(
            payload,
            json!({
                "inputs": "generate questions: Cells divide.",
                "parameters": {
                    "max_length": 64,
                    "num_beams": 30,
                    "num_return_sequences": 30,
                    "do_sample": false,
                    "early_stopping": true,
                }
            })
        );
    }

    #[test]
    fn generated_sequences_are_trimmed_and_missing_text_is_empty() {
        let parsed = parse_generated(json!([
            {"generated_text": "  What divides? "},
            {"score": 0.3},
            {"generated_text": "How do cells divide?"},
        ]))
        .unwrap();
        assert_eq!(parsed, vec!["What divides?", "", "How do cells divide?"]);

        assert!(matches!(
            parse_generated(json!({"error": "model loading"})),
            Err(ProposerError::InvalidResponse(_))
        ));
    }

    #[test]
    fn embeddings_accept_flat_and_nested_shapes() {
        let flat = parse_embedding(&json!([3.0, 4.0])).unwrap();
        assert!((flat[0] - 0.6).abs() < 1e-6);
        assert!((flat[1] - 0.8).abs() < 1e-6);

        let nested = parse_embedding(&json!([[0.0, 2.0]])).unwrap();
        assert_eq!(nested, vec![0.0, 1.0]);
    }

    #[test]
    fn malformed_embeddings_are_rejected() {
        assert!(matches!(
            parse_embedding(&json!({"error": "busy"})),
            Err(EncoderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_embedding(&json!(["a", 1.0])),
            Err(EncoderError::InvalidResponse(_))
        ));
        assert!(matches!(parse_embedding(&json!([])), Err(EncoderError::EmptyVector)));
        assert!(matches!(
            parse_embedding(&json!([0.0, 0.0])),
            Err(EncoderError::EmptyVector)
        ));
    }
}
