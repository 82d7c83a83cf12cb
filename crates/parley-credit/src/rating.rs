//! Dispatcher-rated session quality: prompt construction and response parsing.

use parley_core::errors::DispatchError;
use parley_core::models::{AiRating, ClosedSession};
use serde_json::Value;

/// Prompt asking the dispatcher for a JSON quality rating of `closed`.
pub fn rating_prompt(closed: &ClosedSession) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "Rate the following finished conversation between you and another agent.\n\
         Answer with JSON only: {\"relevance\": 0-100, \"cooperation\": 0-100, \"value\": 0-100}.\n\n",
    );
    prompt.push_str(&format!(
        "peer: {}\nturns: {}\nduration_seconds: {}\nended_by: {}\n\n",
        closed.session.target,
        closed.session.turns,
        closed.duration_ms() / 1000,
        closed.reason,
    ));
    if closed.transcript.is_empty() {
        prompt.push_str("(no messages were exchanged)\n");
    }
    for entry in &closed.transcript {
        let who = if entry.from_peer { "peer" } else { "you" };
        prompt.push_str(&format!("[{who}] {}\n", entry.content));
    }
    prompt
}

/// Extract a rating from a dispatcher response.
///
/// The first JSON object carrying all three numeric axes wins, even when it is
/// embedded in prose or a code fence. Values are clamped to `[0, 100]`.
pub fn parse_rating(response: &str) -> Result<AiRating, DispatchError> {
    for (start, _) in response.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&response[start..]).into_iter::<Value>();
        if let Some(Ok(value)) = stream.next() {
            if let Some(rating) = rating_from_value(&value) {
                return Ok(rating);
            }
        }
    }
    Err(DispatchError::Malformed(format!(
        "no rating object in response ({} chars)",
        response.chars().count()
    )))
}

fn rating_from_value(value: &Value) -> Option<AiRating> {
    let axis = |name: &str| -> Option<u8> {
        let v = value.get(name)?;
        let n = match v {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if !n.is_finite() {
            return None;
        }
        Some(n.round().clamp(0.0, 100.0) as u8)
    };
    Some(AiRating {
        relevance: axis("relevance")?,
        cooperation: axis("cooperation")?,
        value: axis("value")?,
    })
}
