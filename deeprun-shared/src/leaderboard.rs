//! Leaderboard ordering and opaque pagination cursors.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One leaderboard entry from the `character_levels` read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub character_id: u64,
    pub owner: String,
    pub best_level: u32,
    pub last_level_up_epoch: u64,
}

/// Keyset-pagination position: the last row the client has seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardCursor {
    pub best_level: u32,
    pub character_id: u64,
}

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("invalid cursor encoding: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("invalid cursor payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Sorts rows into display order: best level descending, character id
/// ascending as the stable tiebreak.
pub fn sort_rows(rows: &mut [LeaderboardRow]) {
    rows.sort_by(|a, b| {
        b.best_level
            .cmp(&a.best_level)
            .then(a.character_id.cmp(&b.character_id))
    });
}

/// Encodes a cursor as URL-safe unpadded base64 over canonical JSON.
pub fn encode_cursor(cursor: &LeaderboardCursor) -> String {
    let json = serde_json::json!({
        "bestLevel": cursor.best_level,
        "characterId": cursor.character_id,
    });
    general_purpose::URL_SAFE_NO_PAD.encode(json.to_string())
}

/// Decodes a client-supplied cursor token, rejecting malformed input.
pub fn decode_cursor(token: &str) -> Result<LeaderboardCursor, CursorError> {
    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(token)?;
    Ok(serde_json::from_slice(&bytes)?)
}
