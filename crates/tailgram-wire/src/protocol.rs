//! HTTP payload shapes shared by the relay server and its clients.
//! Field names are part of the wire contract and mirror what existing
//! counterpart tooling expects (`fromMe`, `meSize`, `stampDate`, ...).

use serde::{Deserialize, Deserializer, Serialize};

use crate::role::Role;

/// One rendered message in a history response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub stamp: String,
}

/// Incremental read of a single log: the bytes in `[from, to)` plus a
/// `reset` flag raised when the requested offset was past the end of
/// the log (truncation/rotation underneath the cursor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResponse {
    pub from: u64,
    pub to: u64,
    pub chunk: String,
    pub reset: bool,
}

/// `GET /poll` response covering both logs in one round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResponse {
    pub ok: bool,
    pub me: ChunkResponse,
    pub them: ChunkResponse,
}

/// `GET /history` response: the merged timeline plus the log sizes a
/// consumer seeds its cursors from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub ok: bool,
    pub me_size: u64,
    pub them_size: u64,
    pub messages: Vec<Message>,
}

/// `POST /send` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub message: String,
}

/// `POST /send` success response. `line` is the exact stored line and
/// the stamp fields let the sender render its own message with the
/// authoritative timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub ok: bool,
    pub line: String,
    pub stamp_date: String,
    pub stamp_time: String,
}

/// Error body shared by all endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

/// Query parameters for `GET /poll`. Offsets are lenient on purpose:
/// missing, negative, or unparseable values clamp to zero, which at
/// worst replays a log from the start and is caught by the dedup gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollQuery {
    #[serde(default, deserialize_with = "lenient_offset")]
    pub from_me: u64,
    #[serde(default, deserialize_with = "lenient_offset")]
    pub from_them: u64,
}

fn lenient_offset<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .trim()
        .parse::<i64>()
        .ok()
        .map_or(0, |offset| offset.max(0)) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_response_uses_camel_case_sizes() {
        let response = HistoryResponse {
            ok: true,
            me_size: 3,
            them_size: 0,
            messages: vec![Message {
                role: Role::Mine,
                text: "hi".into(),
                stamp: "[25.01.01] [10.00.00]".into(),
            }],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["meSize"], 3);
        assert_eq!(json["themSize"], 0);
        assert_eq!(json["messages"][0]["role"], "me");
    }

    #[test]
    fn send_response_exposes_stamp_fields() {
        let json = serde_json::to_value(SendResponse {
            ok: true,
            line: "x".into(),
            stamp_date: "25.01.01".into(),
            stamp_time: "10.00.00".into(),
        })
        .unwrap();
        assert_eq!(json["stampDate"], "25.01.01");
        assert_eq!(json["stampTime"], "10.00.00");
    }

    #[test]
    fn poll_query_clamps_bad_offsets_to_zero() {
        let query: PollQuery =
            serde_urlencoded_like("fromMe=-5&fromThem=junk");
        assert_eq!(query.from_me, 0);
        assert_eq!(query.from_them, 0);

        let query: PollQuery = serde_urlencoded_like("fromMe=12");
        assert_eq!(query.from_me, 12);
        assert_eq!(query.from_them, 0);
    }

    fn serde_urlencoded_like(query: &str) -> PollQuery {
        // Build the same shape axum's Query extractor produces.
        let mut from_me = None;
        let mut from_them = None;
        for pair in query.split('&') {
            let (key, value) = pair.split_once('=').unwrap();
            match key {
                "fromMe" => from_me = Some(value.to_string()),
                "fromThem" => from_them = Some(value.to_string()),
                _ => {}
            }
        }
        let mut map = serde_json::Map::new();
        if let Some(value) = from_me {
            map.insert("fromMe".into(), value.into());
        }
        if let Some(value) = from_them {
            map.insert("fromThem".into(), value.into());
        }
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }
}
