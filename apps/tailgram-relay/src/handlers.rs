//! HTTP handlers for the relay endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde_json::json;
use tracing::{error, warn};

use tailgram_wire::{
    merge_history, ChunkResponse, ErrorResponse, HistoryResponse, PollQuery, PollResponse, Role,
    SendRequest, SendResponse,
};

use crate::store::{LogStore, StoreError};

pub type SharedStore = Arc<LogStore>;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `POST /send`: validate, stamp, and append one outbound message to
/// the `me` log. The response carries the stored line and its stamp so
/// the sender can render locally without waiting for the next poll.
pub async fn send_message(
    State(store): State<SharedStore>,
    Json(request): Json<SendRequest>,
) -> Response {
    if request.message.trim().is_empty() {
        warn!("rejecting empty outbound message");
        return error_response(StatusCode::BAD_REQUEST, "Empty message");
    }
    match store.append(Role::Mine, &request.message).await {
        Ok(stamped) => Json(SendResponse {
            ok: true,
            line: stamped.line.clone(),
            stamp_date: stamped.date,
            stamp_time: stamped.time,
        })
        .into_response(),
        Err(err) => internal_error(err),
    }
}

/// `GET /history`: read both logs fully, merge into one timeline, and
/// report the sizes a consumer seeds its poll cursors from. Idempotent;
/// reissued by consumers to resynchronize after a disconnect.
pub async fn get_history(State(store): State<SharedStore>) -> Response {
    let mine = match store.read_all(Role::Mine).await {
        Ok(content) => content,
        Err(err) => return internal_error(err),
    };
    let theirs = match store.read_all(Role::Theirs).await {
        Ok(content) => content,
        Err(err) => return internal_error(err),
    };
    // Sizes come from the content just read, so cursors seeded from
    // them match this snapshot even if an append lands concurrently.
    let response = HistoryResponse {
        ok: true,
        me_size: mine.len() as u64,
        them_size: theirs.len() as u64,
        messages: merge_history(&mine, &theirs, Utc::now().timestamp_millis()),
    };
    Json(response).into_response()
}

/// `GET /poll?fromMe=N&fromThem=M`: incremental read of both logs.
pub async fn poll_logs(
    State(store): State<SharedStore>,
    Query(query): Query<PollQuery>,
) -> Response {
    let me = match read_chunk(&store, Role::Mine, query.from_me).await {
        Ok(chunk) => chunk,
        Err(err) => return internal_error(err),
    };
    let them = match read_chunk(&store, Role::Theirs, query.from_them).await {
        Ok(chunk) => chunk,
        Err(err) => return internal_error(err),
    };
    Json(PollResponse {
        ok: true,
        me,
        them,
    })
    .into_response()
}

/// Read everything past `requested` in one log.
///
/// A requested offset beyond the current size means the log was
/// truncated or rotated underneath the consumer's cursor: the read
/// restarts from zero with `reset` raised and replays the entire
/// current content. `from == to` with an empty chunk is the steady
/// state, not an error. Never blocks waiting for new data.
async fn read_chunk(
    store: &LogStore,
    role: Role,
    requested: u64,
) -> Result<ChunkResponse, StoreError> {
    let size = store.size(role).await?;
    let (from, reset) = if requested > size {
        warn!(role = %role, requested, size, "cursor past end of log, signaling reset");
        (0, true)
    } else {
        (requested, false)
    };
    if from >= size {
        return Ok(ChunkResponse {
            from,
            to: size,
            chunk: String::new(),
            reset,
        });
    }
    let bytes = store.read_range(role, from, size).await?;
    Ok(ChunkResponse {
        from,
        to: size,
        chunk: String::from_utf8_lossy(&bytes).into_owned(),
        reset,
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            ok: false,
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn internal_error(err: StoreError) -> Response {
    error!(error = %err, "log store failure");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
}
