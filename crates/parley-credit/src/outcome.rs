//! Session outcome scoring.
//!
//! Rule score (0–100) = completion (0–40, by close reason) + engagement
//! (0–30, linear in turns up to a cap) + efficiency (0–30, banded by average
//! seconds per turn). Optionally refined by a dispatcher rating; any rating
//! failure falls back to the rule score.

use std::time::Duration;

use parley_core::config::{CreditConfig, ScoringConfig};
use parley_core::models::{ClosedSession, CloseReason, SessionOutcome, SessionScore};
use parley_core::traits::{AgentDispatcher, DispatchKind, DispatchRequest};
use tracing::{debug, instrument};

use crate::formula::merge_session_score;
use crate::rating::{parse_rating, rating_prompt};

const ENGAGEMENT_MAX: u32 = 30;
const EFFICIENCY_MAX: f64 = 30.0;
const EFFICIENCY_FLOOR: f64 = 5.0;

/// Completion points for a close reason.
pub fn completion_points(reason: CloseReason) -> u8 {
    match reason {
        CloseReason::EndMarker | CloseReason::PeerEnded => 40,
        CloseReason::MaxTurns => 30,
        CloseReason::MaxDuration => 25,
        CloseReason::EmptyReplies => 20,
        CloseReason::Superseded => 15,
        CloseReason::IdleTimeout | CloseReason::LruEvicted | CloseReason::Forced => 10,
    }
}

/// Engagement points: linear in turns, saturating at `turn_cap`.
pub fn engagement_points(turns: u32, turn_cap: u32) -> u8 {
    let cap = turn_cap.max(1);
    (turns.min(cap) * ENGAGEMENT_MAX / cap) as u8
}

/// Efficiency points by average seconds per turn.
///
/// Sub-second turns look like spam; 5–60 s is the ideal band; slower
/// sessions decay by one point per 10 s down to a floor.
pub fn efficiency_points(turns: u32, duration_ms: u64) -> u8 {
    if turns == 0 {
        return 0;
    }
    let avg_secs = duration_ms as f64 / 1000.0 / turns as f64;
    let points = if avg_secs < 1.0 {
        5.0
    } else if avg_secs < 5.0 {
        15.0
    } else if avg_secs <= 60.0 {
        EFFICIENCY_MAX
    } else {
        (EFFICIENCY_MAX - (avg_secs - 60.0) / 10.0).max(EFFICIENCY_FLOOR)
    };
    points.round() as u8
}

/// Scores finished sessions and turns them into ledger observations.
#[derive(Debug, Clone)]
pub struct SessionScorer {
    scoring: ScoringConfig,
    success_threshold: u8,
}

impl SessionScorer {
    pub fn new(scoring: &ScoringConfig, credit: &CreditConfig) -> Self {
        Self {
            scoring: scoring.clone(),
            success_threshold: credit.success_threshold,
        }
    }

    pub fn rule_score(&self, closed: &ClosedSession) -> u8 {
        let turns = closed.session.turns;
        let total = completion_points(closed.reason) as u32
            + engagement_points(turns, self.scoring.engagement_turn_cap) as u32
            + efficiency_points(turns, closed.duration_ms()) as u32;
        total.min(100) as u8
    }

    /// Score `closed`, asking `dispatcher` for a rating when refinement is on.
    /// Never fails: a timed-out, failed, or malformed rating is skipped.
    #[instrument(skip_all, fields(identity = %identity_id, session_id = %closed.session.session_id))]
    pub async fn score(
        &self,
        identity_id: &str,
        closed: &ClosedSession,
        dispatcher: Option<&dyn AgentDispatcher>,
    ) -> SessionScore {
        let rule_score = self.rule_score(closed);
        let ai_rating = match dispatcher {
            Some(d) if self.scoring.ai_refinement && closed.session.turns > 0 => {
                self.request_rating(identity_id, closed, d).await
            }
            _ => None,
        };
        let final_score =
            merge_session_score(rule_score, ai_rating.as_ref(), self.scoring.rule_weight);
        SessionScore {
            rule_score,
            ai_rating,
            final_score,
        }
    }

    async fn request_rating(
        &self,
        identity_id: &str,
        closed: &ClosedSession,
        dispatcher: &dyn AgentDispatcher,
    ) -> Option<parley_core::models::AiRating> {
        let deadline = Duration::from_millis(self.scoring.ai_timeout_ms);
        let request = DispatchRequest {
            identity_id: identity_id.to_string(),
            kind: DispatchKind::Rating {
                peer: closed.session.target.clone(),
                session_id: closed.session.session_id.clone(),
            },
            prompt: rating_prompt(closed),
            deadline,
        };
        let response = match tokio::time::timeout(deadline, dispatcher.dispatch(request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                debug!(error = %e, "rating unavailable, using rule score");
                return None;
            }
            Err(_) => {
                debug!(timeout_ms = self.scoring.ai_timeout_ms, "rating timed out, using rule score");
                return None;
            }
        };
        match parse_rating(&response) {
            Ok(rating) => Some(rating),
            Err(e) => {
                debug!(error = %e, "rating malformed, using rule score");
                None
            }
        }
    }

    pub fn is_success(&self, final_score: u8) -> bool {
        final_score >= self.success_threshold
    }

    pub fn outcome(&self, closed: &ClosedSession, score: SessionScore) -> SessionOutcome {
        SessionOutcome {
            session_id: closed.session.session_id.clone(),
            peer: closed.session.target.clone(),
            turns: closed.session.turns,
            duration_ms: closed.duration_ms(),
            close_reason: closed.reason,
            score,
        }
    }
}
