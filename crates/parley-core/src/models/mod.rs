//! Shared data model.

pub mod aid;
pub mod connectivity;
pub mod contact;
pub mod group;
pub mod message;
pub mod session;

pub use aid::Aid;
pub use connectivity::{ConnectionStatus, Connectivity, StatusEvent};
pub use contact::{AiRating, Contact, SessionOutcome, SessionScore, SessionSummary};
pub use group::{GroupMessage, GroupVitalityState, VitalityLevel};
pub use message::DirectMessage;
pub use session::{ClosedSession, CloseReason, SessionSnapshot, SessionStatus, TranscriptEntry};
