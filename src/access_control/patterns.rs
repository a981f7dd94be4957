//! Ant-style path patterns
//!
//! Patterns and request paths are both split on `/` into segments (empty
//! segments are ignored, so `//a` and `/a` are the same path). Pattern
//! segments are matched as follows:
//!
//! | Segment        | Matches                                                    |
//! |----------------|------------------------------------------------------------|
//! | `users`        | exactly the segment `users`                                |
//! | `*`            | exactly one segment, any content                           |
//! | `**`           | zero or more segments, anywhere in the pattern             |
//! | `*.html`, `v?` | one segment; `*` is any run of characters, `?` is one      |
//! | `{id}`         | one segment (or the text between literals), any content    |
//! | `{id:\d+}`     | as above, constrained by the regular expression            |
//!
//! Two structural rules apply on top of the segments:
//! - an absolute pattern (leading `/`) only matches absolute paths, and the
//!   other way round;
//! - unless the pattern ends in `**`, a trailing `/` on the path must be
//!   mirrored by the pattern, so `/user` does not match `/user/`.
//!
//! `**` is resolved by trying the shortest consumption first and backtracking,
//! so interior wildcards such as `/user/**/edit` work as well as trailing ones.
//!
//! ```
//! use pathguard::access_control::PathPattern;
//!
//! let pattern = PathPattern::parse("/user/**").unwrap();
//! assert!(pattern.matches("/user"));
//! assert!(pattern.matches("/user/a/b/c"));
//! assert!(!pattern.matches("/users"));
//! ```

use crate::error::ConfigError;
use regex::Regex;
use std::fmt;

/// A single parsed Ant-style pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    absolute: bool,
    trailing_slash: bool,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    /// `*`
    Wildcard,
    /// `**`
    DoubleWildcard,
    /// Segment with embedded `*`, `?` or `{var}`
    Glob(Regex),
}

impl Segment {
    fn parse(raw: &str, pattern: &str) -> Result<Self, ConfigError> {
        match raw {
            "**" => Ok(Segment::DoubleWildcard),
            "*" => Ok(Segment::Wildcard),
            _ if raw.contains(['*', '?', '{']) => compile_glob(raw, pattern).map(Segment::Glob),
            _ => Ok(Segment::Literal(raw.to_string())),
        }
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == segment,
            Segment::Wildcard | Segment::DoubleWildcard => true,
            Segment::Glob(regex) => regex.is_match(segment),
        }
    }
}

impl PathPattern {
    /// Parse a pattern string
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        if pattern.is_empty() {
            return Err(ConfigError::InvalidPattern {
                pattern: String::new(),
                reason: "pattern must not be empty".to_string(),
            });
        }

        let mut segments: Vec<Segment> = Vec::new();
        for raw in pattern.split('/').filter(|s| !s.is_empty()) {
            let segment = Segment::parse(raw, pattern)?;
            // `**/**` is the same as `**`
            if matches!(segment, Segment::DoubleWildcard)
                && matches!(segments.last(), Some(Segment::DoubleWildcard))
            {
                continue;
            }
            segments.push(segment);
        }

        Ok(Self {
            source: pattern.to_string(),
            absolute: pattern.starts_with('/'),
            trailing_slash: pattern.ends_with('/'),
            segments,
        })
    }

    /// Check whether `path` is matched by this pattern
    pub fn matches(&self, path: &str) -> bool {
        if path.starts_with('/') != self.absolute {
            return false;
        }

        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if !match_segments(&self.segments, &parts) {
            return false;
        }

        self.ends_with_double_wildcard() || self.trailing_slash == path.ends_with('/')
    }

    /// The pattern as it was written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern contains any wildcard or placeholder
    pub fn has_wildcards(&self) -> bool {
        self.segments
            .iter()
            .any(|s| !matches!(s, Segment::Literal(_)))
    }

    fn ends_with_double_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::DoubleWildcard))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Segment-wise match where `**` spans any number of path segments
///
/// Results are memoized per (pattern index, path index), bounding the work
/// at O(pattern x path x path) however many `**` the pattern holds.
fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    let mut memo: Vec<Option<bool>> = vec![None; (pattern.len() + 1) * (path.len() + 1)];
    match_from(pattern, path, 0, 0, &mut memo)
}

fn match_from(
    pattern: &[Segment],
    path: &[&str],
    p: usize,
    s: usize,
    memo: &mut [Option<bool>],
) -> bool {
    let key = p * (path.len() + 1) + s;
    if let Some(known) = memo[key] {
        return known;
    }

    let matched = match pattern.get(p) {
        None => s == path.len(),
        Some(Segment::DoubleWildcard) => {
            p + 1 == pattern.len()
                || (s..=path.len()).any(|next| match_from(pattern, path, p + 1, next, memo))
        }
        Some(segment) => {
            s < path.len() && segment.matches(path[s]) && match_from(pattern, path, p + 1, s + 1, memo)
        }
    };

    memo[key] = Some(matched);
    matched
}

/// Compile an in-segment glob (`*.html`, `v?`, `{id:\d+}`) into an anchored regex
fn compile_glob(raw: &str, pattern: &str) -> Result<Regex, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    let mut out = String::from("^");
    let mut literal = String::new();
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match c {
            '*' | '?' | '{' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
            }
            _ => {
                literal.push(c);
                continue;
            }
        }

        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => {
                let mut depth = 1;
                let mut body = String::new();
                for inner in chars.by_ref() {
                    match inner {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    body.push(inner);
                }
                if depth != 0 {
                    return Err(invalid(format!("unterminated '{{' in segment '{}'", raw)));
                }

                let (name, constraint) = match body.split_once(':') {
                    Some((name, constraint)) => (name, Some(constraint)),
                    None => (body.as_str(), None),
                };
                if name.is_empty() {
                    return Err(invalid(format!("empty variable name in segment '{}'", raw)));
                }
                match constraint {
                    Some(re) => {
                        out.push_str("(?:");
                        out.push_str(re);
                        out.push(')');
                    }
                    None => out.push_str(".*"),
                }
            }
        }
    }

    out.push_str(&regex::escape(&literal));
    out.push('$');

    Regex::new(&out).map_err(|e| invalid(e.to_string()))
}

/// Compiled set of patterns
///
/// Answers whether a path is matched by any of the patterns it holds.
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    patterns: Vec<PathPattern>,
}

impl PatternMatcher {
    /// Create a new pattern matcher from a list of Ant-style patterns
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let compiled = patterns
            .iter()
            .map(|p| PathPattern::parse(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns: compiled })
    }

    /// Create an empty pattern matcher (matches nothing)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if a path matches any pattern
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    /// Check if a path matches any pattern, returning the matching pattern
    pub fn find_match(&self, path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.matches(path))
            .map(PathPattern::as_str)
    }

    /// Check if this matcher has any patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Get the number of patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Iterate over the compiled patterns in registration order
    pub fn iter(&self) -> impl Iterator<Item = &PathPattern> {
        self.patterns.iter()
    }
}

impl FromIterator<PathPattern> for PatternMatcher {
    fn from_iter<I: IntoIterator<Item = PathPattern>>(iter: I) -> Self {
        Self {
            patterns: iter.into_iter().collect(),
        }
    }
}
