pub mod dedup;
pub mod embeddings;
pub mod error;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod quality;
pub mod ranking;
pub mod remote;
pub mod traits;

pub use dedup::{surface_dedup, Deduplicator, SurfaceKeys};
pub use embeddings::{
    cosine_similarity, l2_normalize, CharacterNgramEncoder, TextEncoder,
    DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{
    ConfigError, EncoderError, GenerationError, ProposerError, MODEL_NOT_LOADED_MESSAGE,
    NO_GOOD_QUESTIONS_MESSAGE,
};
pub use models::{
    EncoderFailurePolicy, GenerationOptions, OverGeneration, ProposalRequest, DEFAULT_MAX_LENGTH,
    PROMPT_PREFIX,
};
pub use normalize::{normalize_question, normalize_whitespace, PHRASE_ALIASES};
pub use orchestrator::QuestionGenerator;
pub use quality::{repair_structure, QualityFilter, Rejection, INTERROGATIVE_OPENERS, VAGUE_PATTERNS};
pub use ranking::{rank, select};
pub use remote::{HttpQuestionProposer, HttpTextEncoder, RemoteEndpoint};
pub use traits::QuestionProposer;
