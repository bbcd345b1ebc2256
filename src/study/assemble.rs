//! Turns the model's raw study-guide text into validated [`StudyUnit`]s.
//!
//! Model output is parsed leniently (JSON5: comments, trailing commas,
//! single quotes) and then decoded strictly against the study-guide shape.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use super::model::StudyUnit;

static OPENING_FENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n").expect("valid opening fence regex"));
static CLOSING_FENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n?```$").expect("valid closing fence regex"));

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("Model response is not valid JSON: {0}")]
    Malformed(String),

    #[error("Model response does not match the study guide schema at '{path}': {message}")]
    Schema { path: String, message: String },

    #[error("Model response contained no study units")]
    Empty,

    #[error("Question {question} of unit {unit} has an answer that matches no single option")]
    AnswerMismatch { unit: usize, question: usize },
}

/// Removes a code fence wrapped around the whole response. Backticks inside
/// the body are left alone, and a missing closing fence is tolerated.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(opening) = OPENING_FENCE_REGEX.find(trimmed) else {
        return trimmed;
    };
    let body = &trimmed[opening.end()..];
    match CLOSING_FENCE_REGEX.find(body) {
        Some(closing) => body[..closing.start()].trim(),
        None => body.trim(),
    }
}

pub fn parse_lenient(text: &str) -> Result<Value, AssembleError> {
    json5::from_str::<Value>(text).map_err(|e| AssembleError::Malformed(e.to_string()))
}

pub fn decode_units(value: Value) -> Result<Vec<StudyUnit>, AssembleError> {
    let units: Vec<StudyUnit> =
        serde_path_to_error::deserialize(value).map_err(|e| AssembleError::Schema {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        })?;
    if units.is_empty() {
        return Err(AssembleError::Empty);
    }
    Ok(units)
}

/// Positions are 1-based in the error to match what a reader of the guide sees.
pub fn validate_answers(units: &[StudyUnit]) -> Result<(), AssembleError> {
    for (u, unit) in units.iter().enumerate() {
        for (q, question) in unit.questions.iter().enumerate() {
            if !question.answer_is_unambiguous() {
                return Err(AssembleError::AnswerMismatch {
                    unit: u + 1,
                    question: q + 1,
                });
            }
        }
    }
    Ok(())
}

/// Puts `video_url` on the first and last unit and clears it everywhere else.
pub fn place_video(units: &mut [StudyUnit], video_url: Option<&str>) {
    for unit in units.iter_mut() {
        unit.youtube = None;
    }
    if let Some(url) = video_url {
        if let Some(first) = units.first_mut() {
            first.youtube = Some(url.to_string());
        }
        if let Some(last) = units.last_mut() {
            last.youtube = Some(url.to_string());
        }
    }
}

pub fn assemble(raw: &str, video_url: Option<&str>) -> Result<Vec<StudyUnit>, AssembleError> {
    let value = parse_lenient(strip_code_fences(raw))?;
    let mut units = decode_units(value)?;
    validate_answers(&units)?;
    place_video(&mut units, video_url);
    Ok(units)
}
