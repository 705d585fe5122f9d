use std::fmt;

use serde::{Deserialize, Serialize};

/// Which party authored a log.
///
/// On the wire (JSON fields, query params, log file names) a role is
/// `"me"` or `"them"`; inside a stored line it appears as the tag
/// `{ME}` or `{THEM}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "me")]
    Mine,
    #[serde(rename = "them")]
    Theirs,
}

impl Role {
    /// Tag embedded in a stored line, without braces.
    pub fn tag(self) -> &'static str {
        match self {
            Role::Mine => "ME",
            Role::Theirs => "THEM",
        }
    }

    /// Wire name used in JSON payloads and for log file names.
    pub fn wire_name(self) -> &'static str {
        match self {
            Role::Mine => "me",
            Role::Theirs => "them",
        }
    }

    /// Resolve a role tag or wire name, case-insensitively.
    pub fn from_tag(tag: &str) -> Option<Role> {
        if tag.eq_ignore_ascii_case("me") {
            Some(Role::Mine)
        } else if tag.eq_ignore_ascii_case("them") {
            Some(Role::Theirs)
        } else {
            None
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip_through_serde() {
        assert_eq!(serde_json::to_string(&Role::Mine).unwrap(), "\"me\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"them\"").unwrap(),
            Role::Theirs
        );
    }

    #[test]
    fn tags_resolve_case_insensitively() {
        assert_eq!(Role::from_tag("ME"), Some(Role::Mine));
        assert_eq!(Role::from_tag("them"), Some(Role::Theirs));
        assert_eq!(Role::from_tag("Me"), Some(Role::Mine));
        assert_eq!(Role::from_tag("you"), None);
    }
}
