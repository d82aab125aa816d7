//! Emotion scores for the lyrics column.
//!
//! The classifier is opaque: text in, `(label, probability)` pairs out over a
//! fixed label set. This module owns the table contract around it: blank
//! lyrics and classifier failures give null scores for that row only, unknown
//! labels are dropped, and known labels the classifier omitted score 0.0.

use std::io::Read;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::models::LYRICS_COLUMN;
use crate::progress::{create_progress_bar, log_progress};
use crate::table::Table;

pub const EMOTION_LABELS: [&str; 7] = [
    "anger", "disgust", "fear", "joy", "neutral", "sadness", "surprise",
];

pub const DEFAULT_EMOTION_MODEL: &str = "j-hartmann/emotion-english-distilroberta-base";
pub const HOSTED_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";
pub const HF_TOKEN_ENV: &str = "HF_API_TOKEN";

/// Character budget per text; roughly the model's 512-token window.
pub const MAX_INPUT_CHARS: usize = 2000;

const LOG_INTERVAL: u64 = 50;

/// One probability per entry of `EMOTION_LABELS`, in the same order.
pub type EmotionScores = [f64; EMOTION_LABELS.len()];

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("classifier returned HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed classifier response: {0}")]
    Malformed(String),
}

impl From<ureq::Error> for ClassifierError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(code @ (401 | 403), _) => ClassifierError::Unauthorized(code),
            ureq::Error::Status(code, _) => ClassifierError::Status(code),
            ureq::Error::Transport(transport) => ClassifierError::Transport(transport.to_string()),
        }
    }
}

/// Text classification capability.
pub trait EmotionClassifier {
    fn classify(&self, text: &str) -> Result<Vec<(String, f64)>, ClassifierError>;
}

// ============================================================================
// Scoring Contract
// ============================================================================

/// Output column names, `score_<label>`, in label order.
pub fn score_column_names() -> Vec<String> {
    EMOTION_LABELS
        .iter()
        .map(|label| format!("score_{}", label))
        .collect()
}

/// Cut `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Scores for one lyrics cell. `None` for blank text (the classifier is not
/// called) and for classifier errors.
pub fn score_text<C: EmotionClassifier + ?Sized>(
    classifier: &C,
    text: Option<&str>,
) -> Option<EmotionScores> {
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;

    let results = match classifier.classify(truncate_chars(text, MAX_INPUT_CHARS)) {
        Ok(results) => results,
        Err(e) => {
            warn!("Emotion analysis failed: {}", e);
            return None;
        }
    };

    let mut scores = [0.0; EMOTION_LABELS.len()];
    for (label, score) in results {
        let label = label.to_lowercase();
        if let Some(index) = EMOTION_LABELS.iter().position(|known| *known == label) {
            scores[index] = score;
        }
    }
    Some(scores)
}

/// Score every row's `lyrics` cell and append the `score_<label>` columns.
/// Returns how many rows got scores.
pub fn score_table<C: EmotionClassifier + ?Sized>(table: &mut Table, classifier: &C) -> Result<usize> {
    let Some(lyrics_index) = table.column_index(LYRICS_COLUMN) else {
        bail!("Dataset must contain a '{}' column", LYRICS_COLUMN);
    };

    let total = table.len() as u64;
    let pb = create_progress_bar(total, "Scoring emotions");
    let mut rows_scores = Vec::with_capacity(table.len());

    for (index, row) in table.rows.iter().enumerate() {
        let text = row.get(lyrics_index).map(String::as_str);
        rows_scores.push(score_text(classifier, text));
        pb.inc(1);
        log_progress("emotions", index as u64 + 1, total, LOG_INTERVAL);
    }
    pb.finish_and_clear();

    let scored = rows_scores.iter().filter(|s| s.is_some()).count();
    for (label_index, column) in score_column_names().iter().enumerate() {
        let values = rows_scores
            .iter()
            .map(|scores| scores.map(|s| s[label_index].to_string()))
            .collect();
        table.set_column(column, values)?;
    }

    info!("Scored {}/{} rows", scored, table.len());
    Ok(scored)
}

// ============================================================================
// Hosted Inference Binding
// ============================================================================

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// The endpoint answers `[[{..}]]` for a single input, some deployments `[{..}]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

fn parse_classification(body: &str) -> Result<Vec<(String, f64)>, ClassifierError> {
    let response: ClassificationResponse = serde_json::from_str(body)
        .map_err(|e| ClassifierError::Malformed(format!("{e}: {}", truncate_chars(body, 200))))?;

    let scores = match response {
        ClassificationResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
        ClassificationResponse::Flat(scores) => scores,
    };
    Ok(scores.into_iter().map(|s| (s.label, s.score)).collect())
}

/// Text-classification model behind a hosted inference HTTP endpoint.
pub struct HostedClassifier {
    agent: ureq::Agent,
    token: String,
    endpoint: String,
}

impl HostedClassifier {
    pub fn new(token: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            bail!("{} is empty", HF_TOKEN_ENV);
        }
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();
        Ok(Self {
            agent,
            token,
            endpoint: endpoint.into(),
        })
    }

    /// Endpoint for a model id on the public hosted inference service.
    pub fn model_endpoint(model: &str) -> String {
        format!("{}/{}", HOSTED_INFERENCE_BASE, model)
    }

    /// Build from `HF_API_TOKEN`; a missing token fails before any row is read.
    pub fn from_env(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let token = std::env::var(HF_TOKEN_ENV).with_context(|| {
            format!("{} not found. Set it as an environment variable.", HF_TOKEN_ENV)
        })?;
        Self::new(token, endpoint, timeout)
    }
}

impl EmotionClassifier for HostedClassifier {
    fn classify(&self, text: &str) -> Result<Vec<(String, f64)>, ClassifierError> {
        let payload = json!({
            "inputs": text,
            "parameters": { "top_k": EMOTION_LABELS.len() },
            "options": { "wait_for_model": true },
        });

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_json(payload)?;

        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|e| ClassifierError::Transport(format!("reading response: {e}")))?;
        parse_classification(&body)
    }
}
