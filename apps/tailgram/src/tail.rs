//! Consumer-side core: turn successive poll chunks into a rendered
//! timeline exactly once per message.
//!
//! All session state (cursors, partial-line buffers, the dedup gate)
//! lives in one owned [`TailSession`] threaded through the client
//! loop; nothing here is shared or global.

use std::collections::HashSet;

use tailgram_wire::{parse_line, ChunkResponse, HistoryResponse, Message, PollResponse, Role};

/// Accumulates raw poll bytes for one log and yields complete lines.
///
/// Only fully terminated lines are emitted; a trailing segment without
/// its newline stays buffered until a later chunk completes it. The
/// relay's own appends always land as whole lines, but the counterpart
/// process writing the remote log makes no such promise, so a line may
/// straddle two polls.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    /// Feed one chunk and drain every line it completes.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let mut line: String = self.pending.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }
}

/// Admits each `(role, stamp, text)` tuple once per session.
///
/// Two messages with identical role, stamp, and text collapse to one
/// rendered message; the tuple is the identity, so this is accepted
/// rather than worked around.
#[derive(Debug, Default)]
pub struct RenderGate {
    seen: HashSet<(Role, String, String)>,
}

impl RenderGate {
    /// True when the message has not been rendered before.
    pub fn admit(&mut self, role: Role, stamp: &str, text: &str) -> bool {
        self.seen
            .insert((role, stamp.to_string(), text.to_string()))
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

#[derive(Debug, Default)]
struct LogCursor {
    offset: u64,
    buffer: LineBuffer,
}

/// Per-session consumer state: one cursor and reassembly buffer per
/// log, plus the render gate.
#[derive(Debug, Default)]
pub struct TailSession {
    me: LogCursor,
    them: LogCursor,
    gate: RenderGate,
}

impl TailSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offsets to poll from next, in (`me`, `them`) order.
    pub fn cursors(&self) -> (u64, u64) {
        (self.me.offset, self.them.offset)
    }

    /// Rebuild the timeline from a full history snapshot.
    ///
    /// Clears the gate and both buffers, restarts the cursors at the
    /// snapshot sizes (so the next poll returns only what arrived
    /// after it), and returns the messages to render, in merge order.
    pub fn reload(&mut self, history: &HistoryResponse) -> Vec<Message> {
        self.gate.clear();
        self.me = LogCursor {
            offset: history.me_size,
            buffer: LineBuffer::default(),
        };
        self.them = LogCursor {
            offset: history.them_size,
            buffer: LineBuffer::default(),
        };
        let mut rendered = Vec::new();
        for message in &history.messages {
            if message.text.is_empty() {
                continue;
            }
            if self.gate.admit(message.role, &message.stamp, &message.text) {
                rendered.push(message.clone());
            }
        }
        rendered
    }

    /// Apply a full poll response; returns the newly visible messages
    /// across both logs, in arrival order (`me` chunk first).
    pub fn apply_poll(&mut self, poll: &PollResponse) -> Vec<Message> {
        let mut rendered = self.apply_chunk(Role::Mine, &poll.me);
        rendered.extend(self.apply_chunk(Role::Theirs, &poll.them));
        rendered
    }

    /// Apply one per-log poll result.
    ///
    /// A raised `reset` means the log shrank underneath the cursor:
    /// the buffered partial line is dropped and the replayed chunk is
    /// consumed as a fresh read from offset zero. Either way the
    /// cursor advances to `to`, never backwards otherwise.
    pub fn apply_chunk(&mut self, log_role: Role, chunk: &ChunkResponse) -> Vec<Message> {
        let cursor = match log_role {
            Role::Mine => &mut self.me,
            Role::Theirs => &mut self.them,
        };
        if chunk.reset {
            cursor.buffer.clear();
        }
        cursor.offset = chunk.to;
        let lines = cursor.buffer.push(&chunk.chunk);

        let mut rendered = Vec::new();
        for line in lines {
            let record = parse_line(&line);
            if record.text.is_empty() {
                continue;
            }
            let role = record.role.unwrap_or(log_role);
            if self.gate.admit(role, &record.stamp, &record.text) {
                rendered.push(Message {
                    role,
                    text: record.text,
                    stamp: record.stamp,
                });
            }
        }
        rendered
    }

    /// Record a locally sent message (the `/send` echo) so the poll
    /// path does not render it a second time. True when it should be
    /// printed now.
    pub fn note_sent(&mut self, stamp: &str, text: &str) -> bool {
        self.gate.admit(Role::Mine, stamp, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(from: u64, to: u64, chunk: &str, reset: bool) -> ChunkResponse {
        ChunkResponse {
            from,
            to,
            chunk: chunk.to_string(),
            reset,
        }
    }

    #[test]
    fn buffer_emits_only_terminated_lines() {
        let mut buffer = LineBuffer::default();
        assert_eq!(buffer.push("lineA\nlineB"), vec!["lineA"]);
        assert_eq!(buffer.pending(), "lineB");
        assert_eq!(buffer.push("-end\n"), vec!["lineB-end"]);
        assert_eq!(buffer.pending(), "");
    }

    #[test]
    fn buffer_handles_crlf_and_multi_line_chunks() {
        let mut buffer = LineBuffer::default();
        assert_eq!(buffer.push("a\r\nb\nc"), vec!["a", "b"]);
        assert_eq!(buffer.pending(), "c");
    }

    #[test]
    fn gate_admits_each_tuple_once() {
        let mut gate = RenderGate::default();
        assert!(gate.admit(Role::Mine, "[25.01.01] [10.00.00]", "hi"));
        assert!(!gate.admit(Role::Mine, "[25.01.01] [10.00.00]", "hi"));
        assert!(gate.admit(Role::Theirs, "[25.01.01] [10.00.00]", "hi"));
        gate.clear();
        assert!(gate.admit(Role::Mine, "[25.01.01] [10.00.00]", "hi"));
    }

    #[test]
    fn two_lines_in_one_chunk_render_in_order() {
        let mut session = TailSession::new();
        let payload =
            "[25.01.01] [10.00.00] {THEM} -> {lineA}\n[25.01.01] [10.00.01] {THEM} -> {lineB}\n";
        let rendered = session.apply_chunk(Role::Theirs, &chunk(0, payload.len() as u64, payload, false));
        let texts: Vec<&str> = rendered.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["lineA", "lineB"]);
        assert_eq!(session.cursors().1, payload.len() as u64);
    }

    #[test]
    fn partial_line_waits_for_the_next_chunk() {
        let mut session = TailSession::new();
        let first = "[25.01.01] [10.00.00] {THEM} -> {sp";
        let rendered = session.apply_chunk(Role::Theirs, &chunk(0, first.len() as u64, first, false));
        assert!(rendered.is_empty());

        let second = "lit}\n";
        let rendered = session.apply_chunk(
            Role::Theirs,
            &chunk(first.len() as u64, (first.len() + second.len()) as u64, second, false),
        );
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].text, "split");
    }

    #[test]
    fn replayed_content_is_not_rendered_twice() {
        let mut session = TailSession::new();
        let payload = "[25.01.01] [10.00.00] {THEM} -> {hi}\n";
        let full = chunk(0, payload.len() as u64, payload, false);
        assert_eq!(session.apply_chunk(Role::Theirs, &full).len(), 1);
        // Same bytes replayed, e.g. after a lost cursor.
        let replay = chunk(0, payload.len() as u64, payload, true);
        assert!(session.apply_chunk(Role::Theirs, &replay).is_empty());
    }

    #[test]
    fn reset_discards_the_pending_partial() {
        let mut session = TailSession::new();
        session.apply_chunk(Role::Theirs, &chunk(0, 8, "[25.01.0", false));

        let replacement = "[25.01.01] [10.00.00] {THEM} -> {fresh}\n";
        let rendered = session.apply_chunk(
            Role::Theirs,
            &chunk(0, replacement.len() as u64, replacement, true),
        );
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].text, "fresh");
        assert_eq!(session.cursors().1, replacement.len() as u64);
    }

    #[test]
    fn malformed_lines_still_render_with_sentinel_stamp() {
        let mut session = TailSession::new();
        let rendered = session.apply_chunk(Role::Theirs, &chunk(0, 8, "garbage\n", false));
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].stamp, "[..] [..]");
        assert_eq!(rendered[0].text, "garbage");
        assert_eq!(rendered[0].role, Role::Theirs);
    }

    #[test]
    fn reload_seeds_cursors_and_resets_the_gate() {
        let mut session = TailSession::new();
        let payload = "[25.01.01] [10.00.00] {THEM} -> {hi}\n";
        session.apply_chunk(Role::Theirs, &chunk(0, payload.len() as u64, payload, false));

        let history = HistoryResponse {
            ok: true,
            me_size: 40,
            them_size: payload.len() as u64,
            messages: vec![Message {
                role: Role::Theirs,
                text: "hi".into(),
                stamp: "[25.01.01] [10.00.00]".into(),
            }],
        };
        let rendered = session.reload(&history);
        assert_eq!(rendered.len(), 1, "gate cleared, so history renders again");
        assert_eq!(session.cursors(), (40, payload.len() as u64));
    }

    #[test]
    fn local_send_echo_wins_over_the_poll_copy() {
        let mut session = TailSession::new();
        assert!(session.note_sent("[25.01.01] [10.00.00]", "hi"));

        let payload = "[25.01.01] [10.00.00] {ME} -> {hi}\n";
        let rendered = session.apply_chunk(Role::Mine, &chunk(0, payload.len() as u64, payload, false));
        assert!(rendered.is_empty(), "poll copy of own message is deduplicated");
    }
}
