use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use question_gen_core::{
    CharacterNgramEncoder, EncoderFailurePolicy, GenerationOptions, HttpQuestionProposer,
    HttpTextEncoder, QuestionGenerator, RemoteEndpoint, TextEncoder,
};
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "question-generator", version)]
struct Cli {
    /// Paragraph to generate questions from.
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,

    /// Read the paragraph from a file instead. Stdin is used when neither is given.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Text2text generation endpoint for the question proposer
    #[arg(long, env = "QG_PROPOSER_URL")]
    proposer_url: Option<String>,

    /// Feature-extraction endpoint for the text encoder
    #[arg(long, env = "QG_ENCODER_URL")]
    encoder_url: Option<String>,

    /// Bearer token sent to both endpoints
    #[arg(long, env = "QG_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Use the offline character trigram encoder. Takes precedence over --encoder-url.
    #[arg(long, default_value_t = false)]
    local_encoder: bool,

    /// JSON file with generation options.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of questions to return.
    #[arg(long)]
    num_questions: Option<usize>,

    /// Similarity at which two questions count as duplicates.
    #[arg(long)]
    similarity_threshold: Option<f32>,

    /// Minimum question/paragraph similarity.
    #[arg(long)]
    relevance_threshold: Option<f32>,

    /// Fail instead of degrading when the encoder misbehaves.
    #[arg(long, default_value_t = false)]
    strict_encoder: bool,
}

fn build_options(cli: &Cli) -> anyhow::Result<GenerationOptions> {
    let mut options = match &cli.config {
        Some(path) => GenerationOptions::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GenerationOptions::default(),
    };

    if let Some(num_questions) = cli.num_questions {
        options.num_questions = num_questions;
    }
    if let Some(threshold) = cli.similarity_threshold {
        options.similarity_threshold = threshold;
    }
    if let Some(threshold) = cli.relevance_threshold {
        options.relevance_threshold = threshold;
    }
    if cli.strict_encoder {
        options.encoder_failure_policy = EncoderFailurePolicy::Strict;
    }
    Ok(options)
}

fn read_paragraph(cli: &Cli) -> anyhow::Result<String> {
    let raw = match (&cli.text, &cli.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };
    Ok(raw.trim().to_string())
}

fn endpoint(url: &str, api_key: &Option<String>, role: &str) -> Option<RemoteEndpoint> {
    match RemoteEndpoint::new(url, api_key.clone()) {
        Ok(endpoint) => Some(endpoint),
        Err(parse_error) => {
            error!(%parse_error, url, "invalid {role} endpoint");
            None
        }
    }
}

fn load_proposer(cli: &Cli) -> Option<HttpQuestionProposer> {
    let url = cli.proposer_url.as_deref()?;
    endpoint(url, &cli.api_key, "proposer").map(HttpQuestionProposer::new)
}

fn load_encoder(cli: &Cli) -> Option<Box<dyn TextEncoder>> {
    if cli.local_encoder {
        return Some(Box::new(CharacterNgramEncoder::default()));
    }
    let url = cli.encoder_url.as_deref()?;
    endpoint(url, &cli.api_key, "encoder")
        .map(|endpoint| Box::new(HttpTextEncoder::new(endpoint)) as Box<dyn TextEncoder>)
}

fn format_questions(questions: &[String]) -> String {
    if questions.is_empty() {
        return "No valid questions generated.\n".to_string();
    }
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| format!("{}. {question}\n\n", index + 1))
        .collect()
}

fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "question-generator boot"
    );

    let options = build_options(&cli)?;
    let paragraph = read_paragraph(&cli)?;
    if paragraph.is_empty() {
        println!("Please enter a Input.");
        return Ok(());
    }

    let proposer = load_proposer(&cli);
    let encoder = load_encoder(&cli);
    info!(
        proposer_loaded = proposer.is_some(),
        encoder_loaded = encoder.is_some(),
        num_questions = options.num_questions,
        "generating questions"
    );

    let generator = QuestionGenerator::new(proposer, encoder).with_options(options);
    let questions = generator.generate_with_options(&paragraph, generator.options());
    print!("{}", format_questions(&questions));

    Ok(())
}
