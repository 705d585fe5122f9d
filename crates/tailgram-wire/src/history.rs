//! Full-history reconciliation: parse both logs and merge them into a
//! single timeline ordered by each record's derived instant.

use crate::line::parse_line_at;
use crate::protocol::Message;
use crate::role::Role;

struct Entry {
    message: Message,
    instant_ms: i64,
}

/// Merge the full contents of both logs into one timeline.
///
/// Lines that carry no role tag inherit the role of the log they were
/// read from. The sort is stable and `mine` entries are concatenated
/// first, so records with equal instants keep their per-log order with
/// `mine` ahead of `theirs`. `now_ms` is handed to the parser as the
/// instant for malformed lines, which therefore sort as newest.
pub fn merge_history(mine: &str, theirs: &str, now_ms: i64) -> Vec<Message> {
    let mut entries = parse_log(mine, Role::Mine, now_ms);
    entries.extend(parse_log(theirs, Role::Theirs, now_ms));
    entries.sort_by_key(|entry| entry.instant_ms);
    entries.into_iter().map(|entry| entry.message).collect()
}

fn parse_log(content: &str, log_role: Role, now_ms: i64) -> Vec<Entry> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(|line| {
            let record = parse_line_at(line, now_ms);
            Entry {
                message: Message {
                    role: record.role.unwrap_or(log_role),
                    text: record.text,
                    stamp: record.stamp,
                },
                instant_ms: record.instant_ms,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::SENTINEL_STAMP;

    #[test]
    fn merges_by_derived_instant_across_logs() {
        let mine = "[25.01.01] [10.00.02] {ME} -> {second}\n";
        let theirs =
            "[25.01.01] [10.00.01] {THEM} -> {first}\n[25.01.01] [10.00.03] {THEM} -> {third}\n";
        let merged = merge_history(mine, theirs, 0);
        let texts: Vec<&str> = merged.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert_eq!(merged[1].role, Role::Mine);
    }

    #[test]
    fn equal_instants_keep_mine_before_theirs() {
        let mine = "[25.01.01] [10.00.00] {ME} -> {a}\n";
        let theirs = "[25.01.01] [10.00.00] {THEM} -> {b}\n";
        let merged = merge_history(mine, theirs, 0);
        assert_eq!(merged[0].role, Role::Mine);
        assert_eq!(merged[1].role, Role::Theirs);
    }

    #[test]
    fn untagged_lines_inherit_the_log_role() {
        let theirs = "[25.01.01] [10.00.00] {hello}\n";
        let merged = merge_history("", theirs, 0);
        assert_eq!(merged[0].role, Role::Theirs);
        assert_eq!(merged[0].text, "hello");
    }

    #[test]
    fn malformed_lines_sort_as_newest() {
        let mine = "garbage line\n[25.01.01] [10.00.00] {ME} -> {old}\n";
        let now_ms = i64::MAX;
        let merged = merge_history(mine, "", now_ms);
        assert_eq!(merged[0].text, "old");
        assert_eq!(merged[1].text, "garbage line");
        assert_eq!(merged[1].stamp, SENTINEL_STAMP);
    }

    #[test]
    fn blank_lines_and_crlf_terminators_are_tolerated() {
        let mine = "[25.01.01] [10.00.00] {ME} -> {a}\r\n\r\n\n[25.01.01] [10.00.01] {ME} -> {b}\n";
        let merged = merge_history(mine, "", 0);
        let texts: Vec<&str> = merged.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["a", "b"]);
    }
}
