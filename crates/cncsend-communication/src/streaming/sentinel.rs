//! Completion token detection

use cncsend_core::SentinelMatch;

/// Token the firmware sends when a command has finished
pub const DEFAULT_SENTINEL: &str = "DONE";

/// Completion token and how it is matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    token: String,
    mode: SentinelMatch,
}

impl Sentinel {
    /// Create a sentinel
    pub fn new(token: impl Into<String>, mode: SentinelMatch) -> Self {
        Self {
            token: token.into(),
            mode,
        }
    }

    /// The token text
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The match mode
    pub fn mode(&self) -> SentinelMatch {
        self.mode
    }

    /// Whether `buffer` contains a completion
    pub fn matches(&self, buffer: &str) -> bool {
        if self.token.is_empty() {
            return false;
        }
        match self.mode {
            SentinelMatch::Substring => buffer.contains(self.token.as_str()),
            SentinelMatch::Line => buffer.match_indices(self.token.as_str()).any(|(start, _)| {
                let at_line_start = start == 0 || buffer[..start].ends_with('\n');
                let rest = &buffer[start + self.token.len()..];
                at_line_start && (rest.starts_with('\r') || rest.starts_with('\n'))
            }),
        }
    }
}

impl Default for Sentinel {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINEL, SentinelMatch::Substring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_anywhere() {
        let sentinel = Sentinel::default();
        assert!(sentinel.matches("...xDONEy..."));
        assert!(sentinel.matches("OKDONE"));
        assert!(!sentinel.matches("DON"));
        assert!(!sentinel.matches("done"));
    }

    #[test]
    fn test_line_anchored() {
        let sentinel = Sentinel::new("DONE", SentinelMatch::Line);
        assert!(sentinel.matches("DONE\r\n"));
        assert!(sentinel.matches("ok\r\nDONE\n"));
        assert!(!sentinel.matches("(CUTTING DONE)\r\n"));
        assert!(!sentinel.matches("DONEZO\n"));
        // terminator not yet received
        assert!(!sentinel.matches("ok\nDONE"));
        assert!(sentinel.matches("xDONE\nDONE\r"));
    }

    #[test]
    fn test_empty_token_never_matches() {
        assert!(!Sentinel::new("", SentinelMatch::Substring).matches("anything"));
    }
}
