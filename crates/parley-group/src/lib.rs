//! # parley-group
//!
//! Pure activity functions (vitality, mentions, reply intensity) and the
//! per-group `GroupBuffer` state machine. The buffer never touches a clock
//! or a timer: it returns `GateAction`s for the runtime to execute.

pub mod buffer;
pub mod intensity;
pub mod mention;
pub mod vitality;

pub use buffer::{Batch, GateAction, GroupBuffer, GroupSnapshot};
pub use intensity::{post_process, resolve_intensity, ReplyIntensity};
pub use mention::MentionMatcher;
pub use vitality::{classify, compute_vitality, VitalityWindow};
