// Single source of truth for all default values.

// --- Sessions ---
pub const DEFAULT_MAX_TURNS: u32 = 20;
pub const DEFAULT_MAX_DURATION_MS: u64 = 600_000; // 10 minutes
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 120_000; // 2 minutes
pub const DEFAULT_IDLE_CHECK_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_MAX_CONCURRENT_SESSIONS: usize = 10;
pub const DEFAULT_MAX_SESSIONS_PER_TARGET: usize = 2;
pub const DEFAULT_MAX_CONSECUTIVE_EMPTY_REPLIES: u32 = 2;
pub const DEFAULT_END_MARKER: &str = "[END]";
pub const DEFAULT_APPEND_END_MARKER_ON_CLOSE: bool = true;
pub const DEFAULT_ACKNOWLEDGE_PEER_END: bool = true;
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 60_000;

// --- Groups ---
pub const DEFAULT_GROUP_BUFFER_GATE_MS: u64 = 3_000;
pub const DEFAULT_GROUP_DISPATCH_COOLDOWN_MS: u64 = 10_000;
pub const DEFAULT_VITALITY_WINDOW_MS: u64 = 300_000; // 5 minutes
pub const DEFAULT_MENTION_DELAY_MS: u64 = 500;
pub const DEFAULT_MAX_REPLY_CHARS: usize = 500;
pub const DEFAULT_REACTION_MAX_CHARS: usize = 40;
pub const DEFAULT_SEEN_IDS_CAPACITY: usize = 1_000;
pub const DEFAULT_RECENT_REPLY_HASHES: usize = 8;

// --- Credit ---
pub const DEFAULT_REJECT_BELOW: u8 = 20;
pub const DEFAULT_SUCCESS_THRESHOLD: u8 = 50;
pub const DEFAULT_HISTORY_WEIGHT: f64 = 0.7;

// --- Scoring ---
pub const DEFAULT_AI_REFINEMENT: bool = true;
pub const DEFAULT_AI_TIMEOUT_MS: u64 = 8_000;
pub const DEFAULT_RULE_WEIGHT: f64 = 0.6;
pub const DEFAULT_ENGAGEMENT_TURN_CAP: u32 = 10;
pub const DEFAULT_SUMMARY_HISTORY: usize = 500;

// --- Reconnect ---
pub const DEFAULT_RECONNECT_BASE_MS: u64 = 1_000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 60_000;

// --- Storage ---
pub const DEFAULT_DATA_DIR: &str = ".parley";
pub const DEFAULT_CONTACTS_FILENAME: &str = "contacts.json";
pub const DEFAULT_SUMMARIES_FILENAME: &str = "sessions.json";

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "text";
