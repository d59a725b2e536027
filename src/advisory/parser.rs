//! Strict parser for advisory replies
//!
//! The oracle is asked to answer in a fixed two-line format:
//!
//! ```text
//! Action: <paginate|extract|stop>
//! Reasoning: <free text>
//! ```
//!
//! Anything that does not name a known action is a [`ParseError`], which the
//! decision policy maps deterministically to its local fallback heuristic.
//! There is no duck-typed guessing: a reply either parses or it does not.

use crate::advisory::{Action, Decision};
use thiserror::Error;

/// Errors produced while parsing an advisory reply
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("reply contains no 'Action:' line")]
    MissingAction,

    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

/// Parses a plain-text advisory reply into a [`Decision`]
///
/// Accepted action spellings are the canonical names (case-insensitive) and
/// the numeric aliases "1"/"2"/"3" the oracle has historically used when
/// prompted with numbered options. A missing `Reasoning:` line is tolerated;
/// a missing or unknown action is not.
///
/// # Arguments
///
/// * `reply` - The raw message content returned by the oracle
///
/// # Returns
///
/// * `Ok(Decision)` - The reply named a known action
/// * `Err(ParseError)` - The reply is structurally unusable
pub fn parse_reply(reply: &str) -> Result<Decision, ParseError> {
    let action_text = find_field(reply, "Action:").ok_or(ParseError::MissingAction)?;
    let action = parse_action(&action_text)?;

    let reasoning = find_field(reply, "Reasoning:")
        .unwrap_or_else(|| "no reasoning provided".to_string());

    Ok(Decision::new(action, reasoning))
}

/// Finds a `Label: value` field, returning the trimmed remainder of its line
fn find_field(reply: &str, label: &str) -> Option<String> {
    for line in reply.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(label) {
            let value = rest.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Maps an action token onto [`Action`]
fn parse_action(token: &str) -> Result<Action, ParseError> {
    // Tolerate trailing punctuation ("stop.") but nothing fuzzier
    let token = token.trim().trim_end_matches(['.', '!']).to_lowercase();

    match token.as_str() {
        "paginate" | "1" => Ok(Action::Paginate),
        "extract" | "2" => Ok(Action::Extract),
        "stop" | "3" => Ok(Action::Stop),
        _ => Err(ParseError::UnknownAction(token)),
    }
}
