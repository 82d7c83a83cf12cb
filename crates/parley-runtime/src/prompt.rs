//! Prompts handed to the agent dispatcher.
//!
//! Each prompt carries a situational context block ahead of the
//! conversation content so the agent can calibrate its reply.

use std::fmt::Write;

use parley_core::config::{AccountConfig, SessionConfig};
use parley_core::models::{GroupVitalityState, SessionSnapshot};
use parley_group::{Batch, ReplyIntensity};

fn identity_line(account: &AccountConfig) -> String {
    if account.name.is_empty() {
        format!("you: {}", account.aid)
    } else {
        format!("you: {} ({})", account.name, account.aid)
    }
}

pub fn direct_prompt(
    account: &AccountConfig,
    session: &SessionSnapshot,
    config: &SessionConfig,
    peer_credit: u8,
    content: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[context]");
    let _ = writeln!(out, "{}", identity_line(account));
    let _ = writeln!(out, "peer: {} (credit {peer_credit}/100)", session.target);
    let _ = writeln!(
        out,
        "session: {} turn {}/{}",
        session.session_id, session.turns, config.max_turns
    );
    let _ = writeln!(
        out,
        "include {} in your reply when the conversation is complete",
        config.end_marker
    );
    let _ = writeln!(out, "[/context]");
    out.push('\n');
    out.push_str(content);
    out
}

fn intensity_hint(intensity: ReplyIntensity, mentioned: bool) -> &'static str {
    match (intensity, mentioned) {
        (ReplyIntensity::Reaction, _) => "the room is busy: react in a few words at most",
        (ReplyIntensity::Short, true) => "you were addressed: answer in one or two sentences",
        (ReplyIntensity::Short, false) => "keep it to one or two sentences",
        (ReplyIntensity::Normal, _) => "reply normally",
    }
}

pub fn group_prompt(
    account: &AccountConfig,
    batch: &Batch,
    vitality: &GroupVitalityState,
    intensity: ReplyIntensity,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[context]");
    let _ = writeln!(out, "{}", identity_line(account));
    let _ = writeln!(out, "group: {}", batch.group_id);
    let _ = writeln!(
        out,
        "vitality: {:?} ({} messages from {} speakers recently)",
        vitality.level, vitality.message_count, vitality.speaker_count
    );
    let _ = writeln!(out, "mentioned: {}", if batch.mentioned { "yes" } else { "no" });
    let _ = writeln!(out, "style: {}", intensity_hint(intensity, batch.mentioned));
    let _ = writeln!(out, "[/context]");
    out.push('\n');
    for message in &batch.messages {
        let _ = writeln!(out, "{}: {}", message.sender, message.content);
    }
    out
}
