//! Reply intensity and post-processing of group replies.

use parley_core::config::GroupConfig;
use parley_core::constants::SHORT_REPLY_MAX_SENTENCES;
use parley_core::models::VitalityLevel;
use serde::{Deserialize, Serialize};

/// How much the agent should say in a group reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyIntensity {
    Reaction,
    Short,
    Normal,
}

impl ReplyIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reaction => "reaction",
            Self::Short => "short",
            Self::Normal => "normal",
        }
    }
}

/// A heated room gets reactions only, softened to short replies when the
/// identity is addressed. An active room gets full replies; a quiet one
/// gets short nudges.
pub fn resolve_intensity(level: VitalityLevel, mentioned: bool) -> ReplyIntensity {
    match level {
        VitalityLevel::Heated if mentioned => ReplyIntensity::Short,
        VitalityLevel::Heated => ReplyIntensity::Reaction,
        VitalityLevel::Active => ReplyIntensity::Normal,
        VitalityLevel::Cooling | VitalityLevel::Dormant => ReplyIntensity::Short,
    }
}

/// Shape a raw agent reply for the group according to `intensity`, then
/// enforce the hard character budget.
pub fn post_process(text: &str, intensity: ReplyIntensity, config: &GroupConfig) -> String {
    let text = text.trim();
    let shaped = match intensity {
        ReplyIntensity::Reaction => char_prefix(text, config.reaction_max_chars),
        ReplyIntensity::Short => first_sentences(text, SHORT_REPLY_MAX_SENTENCES),
        ReplyIntensity::Normal => text,
    };
    truncate_to_budget(shaped, config.max_reply_chars)
        .trim_end()
        .to_string()
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
}

fn is_cjk_terminator(c: char) -> bool {
    matches!(c, '。' | '！' | '？')
}

/// Byte offsets just past each sentence end. An ASCII terminator run only
/// ends a sentence when followed by whitespace or the end of text.
fn sentence_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        let end = idx + c.len_utf8();
        match chars.peek() {
            Some(&(_, next)) if is_terminator(next) => continue,
            Some(&(_, next)) if next.is_whitespace() || is_cjk_terminator(c) => {
                boundaries.push(end)
            }
            Some(_) => {}
            None => boundaries.push(end),
        }
    }
    boundaries
}

fn first_sentences(text: &str, n: usize) -> &str {
    match sentence_boundaries(text).get(n.saturating_sub(1)) {
        Some(&end) if n > 0 => &text[..end],
        _ => text,
    }
}

fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cut at the last sentence boundary inside the budget when that boundary
/// lies past the midpoint; otherwise cut raw at the char budget.
fn truncate_to_budget(text: &str, max_chars: usize) -> &str {
    let prefix = char_prefix(text, max_chars);
    if prefix.len() == text.len() {
        return text;
    }
    let boundary = sentence_boundaries(text)
        .into_iter()
        .take_while(|&end| end <= prefix.len())
        .last();
    match boundary {
        Some(end) if text[..end].chars().count() * 2 > max_chars => &text[..end],
        _ => prefix,
    }
}
