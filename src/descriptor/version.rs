//! Module versions.
//!
//! A version string is a dot-separated sequence of tokens, optionally
//! followed by a `-` pre-release part and a `+` build part:
//!
//! ```text
//! 1.2.3
//! 1.2.3-SNAPSHOT
//! 9-ea+181
//! ```
//!
//! Tokens are runs of digits (compared numerically) or runs of other
//! characters (compared lexically). A string that does not start with a
//! digit is not a version.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid version '{version}': {reason}")]
pub struct VersionError {
    pub version: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Token {
    /// Digit run with leading zeros removed.
    Number(String),
    Text(String),
}

impl Token {
    fn as_str(&self) -> &str {
        match self {
            Token::Number(s) | Token::Text(s) => s,
        }
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Token::Number(a), Token::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            _ => self.as_str().cmp(other.as_str()),
        }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed, totally ordered module version.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    sequence: Vec<Token>,
    pre: Vec<Token>,
    build: Vec<Token>,
}

impl Version {
    pub fn parse(v: &str) -> Result<Self, VersionError> {
        let invalid = |reason| VersionError {
            version: v.to_string(),
            reason,
        };

        if v.is_empty() {
            return Err(invalid("empty version string"));
        }
        if !v.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid("version does not start with a digit"));
        }

        let (main, build) = match v.split_once('+') {
            Some((main, build)) => (main, Some(build)),
            None => (v, None),
        };
        let (sequence, pre) = match main.split_once('-') {
            Some((sequence, pre)) => (sequence, Some(pre)),
            None => (main, None),
        };

        let sequence = tokenize(sequence, &['.']).ok_or_else(|| invalid("empty version token"))?;

        let pre = match pre {
            Some("") => return Err(invalid("empty pre-release")),
            Some(pre) => {
                tokenize(pre, &['.', '-']).ok_or_else(|| invalid("empty pre-release token"))?
            }
            None => Vec::new(),
        };

        let build = match build {
            Some("") => return Err(invalid("empty build")),
            Some(build) if build.contains('+') => return Err(invalid("unexpected '+' in build")),
            Some(build) => {
                tokenize(build, &['.', '-']).ok_or_else(|| invalid("empty build token"))?
            }
            None => Vec::new(),
        };

        Ok(Version {
            raw: v.to_string(),
            sequence,
            pre,
            build,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_pre_release(&self) -> bool {
        !self.pre.is_empty()
    }
}

/// Split `part` on `separators` and break each piece into digit and
/// non-digit runs. Returns `None` if any piece is empty.
fn tokenize(part: &str, separators: &[char]) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    for piece in part.split(separators) {
        if piece.is_empty() {
            return None;
        }
        let mut rest = piece;
        while !rest.is_empty() {
            let digits = rest.starts_with(|c: char| c.is_ascii_digit());
            let end = rest
                .find(|c: char| c.is_ascii_digit() != digits)
                .unwrap_or(rest.len());
            let (run, tail) = rest.split_at(end);
            tokens.push(if digits {
                let trimmed = run.trim_start_matches('0');
                Token::Number(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
            } else {
                Token::Text(run.to_string())
            });
            rest = tail;
        }
    }
    Some(tokens)
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sequence
            .cmp(&other.sequence)
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => self.pre.cmp(&other.pre),
            })
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sequence.hash(state);
        self.pre.hash(state);
        self.build.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let version = v("1.2.3");
        assert_eq!(version.as_str(), "1.2.3");
        assert!(!version.is_pre_release());
    }

    #[test]
    fn test_parse_pre_release_and_build() {
        assert!(v("1.2.3-SNAPSHOT").is_pre_release());
        assert!(v("9-ea+181").is_pre_release());
        assert!(!v("9+181").is_pre_release());
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("v1.0").is_err());
        assert!(Version::parse("SNAPSHOT").is_err());
        assert!(Version::parse("1..2").is_err());
        assert!(Version::parse("1.").is_err());
        assert!(Version::parse("1-").is_err());
        assert!(Version::parse("1+").is_err());
        assert!(Version::parse("1+2+3").is_err());
    }

    #[test]
    fn test_parse_error_message() {
        let err = Version::parse("beta").unwrap_err();
        assert_eq!(err.version, "beta");
        assert!(err.to_string().contains("does not start with a digit"));
    }

    #[test]
    fn test_numeric_ordering() {
        assert!(v("1.2") < v("1.10"));
        assert!(v("2") > v("1.99.99"));
        assert!(v("1.0") < v("1.0.1"));
        assert!(v("100000000000000000000") > v("99999999999999999999"));
    }

    #[test]
    fn test_pre_release_sorts_before_release() {
        assert!(v("1.0-SNAPSHOT") < v("1.0"));
        assert!(v("1.0-alpha") < v("1.0-beta"));
        assert!(v("9-ea") < v("9"));
    }

    #[test]
    fn test_build_ordering() {
        assert!(v("9+100") < v("9+181"));
        assert!(v("9") < v("9+1"));
    }

    #[test]
    fn test_leading_zeros_are_equal() {
        assert_eq!(v("1.01"), v("1.1"));
        assert_eq!(v("1.01").to_string(), "1.01");
    }

    #[test]
    fn test_mixed_token_split() {
        // "1a" splits into [1, "a"]
        assert!(v("1a") > v("1"));
        assert!(v("1a") < v("1b"));
    }

    #[test]
    fn test_serialize_as_string() {
        let json = serde_json::to_string(&v("1.2.3-SNAPSHOT")).unwrap();
        assert_eq!(json, "\"1.2.3-SNAPSHOT\"");
    }
}
