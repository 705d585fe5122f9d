//! Shared contract between the tailgram relay server and its clients:
//! the two log roles, the stamped line codec, the HTTP payload shapes,
//! and the history merge. No I/O lives here so both sides (and their
//! tests) can exercise the protocol without a network or a filesystem.

mod history;
mod line;
mod protocol;
mod role;

pub use history::merge_history;
pub use line::{
    format_line, format_line_at, parse_line, parse_line_at, sanitize, LineRecord, StampedLine,
    SENTINEL_STAMP,
};
pub use protocol::{
    ChunkResponse, ErrorResponse, HistoryResponse, Message, PollQuery, PollResponse, SendRequest,
    SendResponse,
};
pub use role::Role;
