//! Port direction and MIME compatibility rules.
//!
//! Each node kind declares its ports (inputs/outputs) in its `NodeSpec`.
//! The connection validator uses these rules to admit or reject edges.
//!
//! Matching is deliberately loose: two MIME strings match when they are
//! equal, when either one is the universal wildcard `*/*`, or when their
//! major types (the part before `/`) are equal. A minor wildcard such as
//! `image/*` gets no special treatment beyond the major-type rule.

use serde::{Deserialize, Serialize};

/// The universal wildcard accepted by file-input style ports.
pub const ANY_MIME: &str = "*/*";

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// Major type of a MIME string (`image` for `image/png`). Strings without a
/// slash are their own major type.
#[inline]
pub fn major_type(mime: &str) -> &str {
    mime.split('/').next().unwrap_or(mime)
}

/// Compare a single pair of MIME strings.
pub fn mime_matches(a: &str, b: &str) -> bool {
    a == b || a == ANY_MIME || b == ANY_MIME || major_type(a) == major_type(b)
}

/// True if any source type matches any target type.
pub fn mime_sets_intersect<S, T>(source: &[S], target: &[T]) -> bool
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    source
        .iter()
        .any(|s| target.iter().any(|t| mime_matches(s.as_ref(), t.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(mime_matches("application/pdf", "application/pdf"));
    }

    #[test]
    fn test_universal_wildcard() {
        assert!(mime_matches("*/*", "image/png"));
        assert!(mime_matches("audio/wav", "*/*"));
    }

    #[test]
    fn test_major_type_match() {
        assert!(mime_matches("image/png", "image/jpeg"));
        assert!(mime_matches("image/*", "image/webp"));
        assert!(!mime_matches("image/png", "audio/png"));
    }

    #[test]
    fn test_application_types_share_major() {
        // Major-type matching lets every application/* type connect.
        assert!(mime_matches(
            "application/pdf",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        ));
    }

    #[test]
    fn test_set_intersection() {
        let source = ["text/plain"];
        let target = ["application/pdf", "text/plain"];
        assert!(mime_sets_intersect(&source, &target));
        assert!(!mime_sets_intersect(&["video/mp4"], &["audio/mpeg"]));
        assert!(!mime_sets_intersect::<&str, &str>(&[], &["*/*"]));
    }

    #[test]
    fn test_major_type_without_slash() {
        assert_eq!(major_type("text"), "text");
        assert!(mime_matches("text", "text/plain"));
    }
}
