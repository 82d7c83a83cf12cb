/// Lowest possible credit score.
pub const CREDIT_MIN: u8 = 0;

/// Highest possible credit score.
pub const CREDIT_MAX: u8 = 100;

/// Neutral credit score for peers with no history.
pub const CREDIT_BASE: u8 = 50;

/// Mention keywords shorter than this (in chars) are discarded.
pub const MIN_MENTION_KEYWORD_CHARS: usize = 2;

/// Message and speaker bounds for the COOLING vitality class.
pub const COOLING_MAX_MESSAGES: usize = 5;
pub const COOLING_MAX_SPEAKERS: usize = 2;

/// Message bound for the ACTIVE vitality class.
pub const ACTIVE_MAX_MESSAGES: usize = 15;

/// Short replies keep at most this many sentences.
pub const SHORT_REPLY_MAX_SENTENCES: usize = 2;

/// Transcript tail kept in memory per session for the quality rating.
pub const TRANSCRIPT_TAIL_ENTRIES: usize = 20;

/// Each transcript entry is cut to this many chars.
pub const TRANSCRIPT_ENTRY_MAX_CHARS: usize = 400;
