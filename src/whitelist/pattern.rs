//! Hostname glob patterns.
//!
//! A pattern is a sequence of literal segments separated by `*`
//! wildcards. Every character other than `*` is literal, and a pattern
//! always has to cover the whole hostname.

use std::fmt;
use std::str::FromStr;

use crate::common::{ProxyError, Result};

/// One piece of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Characters that must appear verbatim.
    Literal(String),
    /// Zero or more arbitrary characters.
    Wildcard,
}

/// A compiled hostname pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a pattern string.
    ///
    /// Consecutive wildcards collapse into one. Blank patterns and
    /// patterns containing whitespace are rejected.
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(ProxyError::Pattern {
                pattern: pattern.to_string(),
                reason: "empty pattern".to_string(),
            });
        }

        if pattern.chars().any(char::is_whitespace) {
            return Err(ProxyError::Pattern {
                pattern: pattern.to_string(),
                reason: "pattern contains whitespace".to_string(),
            });
        }

        let mut segments = Vec::new();
        for (idx, literal) in pattern.split('*').enumerate() {
            if idx > 0 && segments.last() != Some(&Segment::Wildcard) {
                segments.push(Segment::Wildcard);
            }
            if !literal.is_empty() {
                segments.push(Segment::Literal(literal.to_string()));
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as it was written in the configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Compiled segments, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Check whether the pattern covers the entire `host`.
    pub fn matches(&self, host: &str) -> bool {
        let mut rest = host;
        // Whether the next literal has to start exactly at `rest`
        let mut anchored = true;
        let last = self.segments.len().saturating_sub(1);

        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => anchored = false,
                Segment::Literal(literal) => {
                    if anchored {
                        match rest.strip_prefix(literal.as_str()) {
                            Some(tail) => rest = tail,
                            None => return false,
                        }
                    } else if idx == last {
                        // Final literal after a wildcard pins the suffix
                        if !rest.ends_with(literal.as_str()) {
                            return false;
                        }
                        rest = "";
                    } else {
                        match rest.find(literal.as_str()) {
                            Some(pos) => rest = &rest[pos + literal.len()..],
                            None => return false,
                        }
                    }
                    anchored = true;
                }
            }
        }

        !anchored || rest.is_empty()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Pattern {
    type Err = ProxyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::compile(s)
    }
}
