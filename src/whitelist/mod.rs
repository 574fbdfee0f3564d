//! Destination whitelist
//!
//! Compiles the configured hostname patterns once at startup and answers
//! whether a proxy target may be reached. The rule set is immutable after
//! construction and can be shared between any number of handlers.

mod pattern;

pub use pattern::{Pattern, Segment};

use log::debug;

use crate::common::{strip_port, Result};

/// A compiled whitelist entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistRule {
    pattern: Pattern,
}

impl WhitelistRule {
    /// Compile a single configuration entry
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: pattern.parse()?,
        })
    }

    /// Pattern as written in the configuration
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Check a bare hostname against this rule
    pub fn matches(&self, host: &str) -> bool {
        self.pattern.matches(host)
    }
}

/// Ordered set of whitelist rules
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    rules: Vec<WhitelistRule>,
}

impl Whitelist {
    /// Compile every configured pattern, in configuration order
    ///
    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let rules = patterns
            .iter()
            .map(|p| WhitelistRule::new(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        debug!("Compiled {} whitelist rules", rules.len());
        Ok(Self { rules })
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the whitelist has no rules (and so rejects everything)
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule covering `target`, if any
    ///
    /// `target` may be `host` or `host:port`; the port never takes part in
    /// the decision.
    pub fn matching_rule(&self, target: &str) -> Option<&WhitelistRule> {
        let host = strip_port(target);
        if host.is_empty() || host.starts_with('.') {
            return None;
        }

        self.rules.iter().find(|rule| rule.matches(host))
    }

    /// Whether `target` may be proxied
    pub fn is_allowed(&self, target: &str) -> bool {
        self.matching_rule(target).is_some()
    }
}
