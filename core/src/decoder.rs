//! Frame payload → SimulationSnapshot.
//!
//! Stateless. A bad frame yields a DecodeError; the caller logs it and moves
//! on to the next frame.

use crate::{error::DecodeError, snapshot::SimulationSnapshot};

/// Longest payload excerpt written to logs for a rejected frame.
pub const PREVIEW_LEN: usize = 120;

pub fn decode(payload: &[u8]) -> Result<SimulationSnapshot, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|e| DecodeError::InvalidUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;
    decode_str(text)
}

pub fn decode_str(text: &str) -> Result<SimulationSnapshot, DecodeError> {
    let snapshot: SimulationSnapshot = serde_json::from_str(text.trim())?;

    if let Some(index) = snapshot.agents.iter().position(|a| a.id.is_empty()) {
        return Err(DecodeError::EmptyId { index });
    }

    Ok(snapshot)
}

/// Lossy, length-capped rendering of a payload for diagnostics.
pub fn preview(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    match text.char_indices().nth(PREVIEW_LEN) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_payloads() {
        let long = "x".repeat(PREVIEW_LEN + 50);
        let p = preview(long.as_bytes());
        assert_eq!(p.chars().count(), PREVIEW_LEN + 1);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn preview_keeps_short_payloads() {
        assert_eq!(preview(b"{\"agents\":"), "{\"agents\":");
    }
}
