//! String pattern matching for schema values.

use super::MatcherError;
use crate::config::{PatternConfig, PatternType};
use glob::Pattern as GlobPattern;
use regex::Regex;

/// Compiled string pattern.
#[derive(Debug, Clone)]
pub enum PatternMatcher {
    /// Exact string match
    Exact(String),
    /// Glob pattern match
    Glob(GlobPattern),
    /// Regex pattern match
    Regex(Regex),
}

impl PatternMatcher {
    /// Compile a pattern from configuration.
    pub fn compile(config: &PatternConfig) -> Result<Self, MatcherError> {
        match config.pattern_type {
            PatternType::Exact => Ok(Self::Exact(config.pattern.clone())),
            PatternType::Glob => Self::glob(&config.pattern),
            PatternType::Regex => Self::regex(&config.pattern),
        }
    }

    pub fn exact(text: impl Into<String>) -> Self {
        Self::Exact(text.into())
    }

    pub fn glob(pattern: &str) -> Result<Self, MatcherError> {
        Ok(Self::Glob(GlobPattern::new(pattern)?))
    }

    pub fn regex(pattern: &str) -> Result<Self, MatcherError> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Exact(expected) => text == expected,
            Self::Glob(pattern) => pattern.matches(text),
            Self::Regex(regex) => regex.is_match(text),
        }
    }

    /// Source text of the pattern, for failure reasons.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(expected) => expected,
            Self::Glob(pattern) => pattern.as_str(),
            Self::Regex(regex) => regex.as_str(),
        }
    }
}
