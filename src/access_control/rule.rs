//! Authorization rules
//!
//! A rule pairs a path selector (include/exclude patterns plus an optional
//! method filter) with a [`Check`]. Exclude patterns always win over include
//! patterns, and an empty include list selects every path.

use crate::access_control::checks::{Check, SharedCheck};
use crate::access_control::patterns::PatternMatcher;
use crate::error::ConfigError;
use std::fmt;
use std::sync::Arc;

pub struct Rule {
    name: String,
    include: PatternMatcher,
    exclude: PatternMatcher,
    methods: Vec<String>,
    stop: bool,
    check: SharedCheck,
}

impl Rule {
    /// Start building a rule around `check`
    pub fn builder(check: impl Check + 'static) -> RuleBuilder {
        RuleBuilder::new(Arc::new(check))
    }

    /// Start building a rule around an already shared check
    pub fn builder_shared(check: SharedCheck) -> RuleBuilder {
        RuleBuilder::new(check)
    }

    /// Whether this rule applies to `path`
    pub fn selects(&self, path: &str) -> bool {
        (self.include.is_empty() || self.include.matches(path)) && !self.exclude.matches(path)
    }

    /// Whether this rule applies to a request
    ///
    /// An unknown method never narrows the selection, so method-restricted
    /// rules still run for callers that only supply a path.
    pub fn selects_request(&self, method: Option<&str>, path: &str) -> bool {
        let method_selected = match method {
            Some(method) if !self.methods.is_empty() => {
                self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
            }
            _ => true,
        };
        method_selected && self.selects(path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self) -> &SharedCheck {
        &self.check
    }

    /// Whether an allow from this rule ends evaluation
    pub fn is_stop(&self) -> bool {
        self.stop
    }

    pub fn include(&self) -> &PatternMatcher {
        &self.include
    }

    pub fn exclude(&self) -> &PatternMatcher {
        &self.exclude
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field(
                "include",
                &self.include.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            )
            .field(
                "exclude",
                &self.exclude.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            )
            .field("methods", &self.methods)
            .field("stop", &self.stop)
            .field("check", &self.check.describe())
            .finish()
    }
}

/// Builder for [`Rule`]
///
/// Patterns are kept as strings until [`build`](Self::build), which parses
/// them and reports the first invalid one.
pub struct RuleBuilder {
    name: Option<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    methods: Vec<String>,
    stop: bool,
    check: SharedCheck,
}

impl RuleBuilder {
    fn new(check: SharedCheck) -> Self {
        Self {
            name: None,
            include: Vec::new(),
            exclude: Vec::new(),
            methods: Vec::new(),
            stop: false,
            check,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    pub fn include_all<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn exclude_all<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.methods.push(method.into().to_ascii_uppercase());
        self
    }

    /// End evaluation with Allow when this rule's check passes
    pub fn stop(mut self) -> Self {
        self.stop = true;
        self
    }

    pub fn build(self) -> Result<Rule, ConfigError> {
        let name = self
            .name
            .unwrap_or_else(|| format!("{}@{}", self.check.describe(), self.include.join(",")));

        Ok(Rule {
            name,
            include: PatternMatcher::new(&self.include)?,
            exclude: PatternMatcher::new(&self.exclude)?,
            methods: self.methods,
            stop: self.stop,
            check: self.check,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::checks::LoginCheck;

    #[test]
    fn test_exclude_beats_include() {
        let rule = Rule::builder(LoginCheck)
            .include("/admin/**")
            .exclude("/admin/public/**")
            .build()
            .unwrap();

        assert!(rule.selects("/admin/x"));
        assert!(rule.selects("/admin"));
        assert!(!rule.selects("/admin/public/x"));
        assert!(!rule.selects("/other"));
    }

    #[test]
    fn test_overlapping_include_and_exclude() {
        let rule = Rule::builder(LoginCheck)
            .include("/auth/doLogin")
            .exclude("/auth/doLogin")
            .build()
            .unwrap();
        assert!(!rule.selects("/auth/doLogin"));
    }

    #[test]
    fn test_empty_include_selects_everything() {
        let rule = Rule::builder(LoginCheck)
            .exclude("/health")
            .build()
            .unwrap();

        assert!(rule.selects("/"));
        assert!(rule.selects("/anything/else"));
        assert!(!rule.selects("/health"));
    }

    #[test]
    fn test_method_filter() {
        let rule = Rule::builder(LoginCheck)
            .include("/goods/**")
            .method("post")
            .method("DELETE")
            .build()
            .unwrap();

        assert!(rule.selects_request(Some("POST"), "/goods/1"));
        assert!(rule.selects_request(Some("delete"), "/goods/1"));
        assert!(!rule.selects_request(Some("GET"), "/goods/1"));
        // unknown method keeps the rule in play
        assert!(rule.selects_request(None, "/goods/1"));
        assert_eq!(rule.methods(), ["POST", "DELETE"]);
    }

    #[test]
    fn test_default_name() {
        let rule = Rule::builder(LoginCheck)
            .include_all(["/a/**", "/b/**"])
            .build()
            .unwrap();
        assert_eq!(rule.name(), "login@/a/**,/b/**");

        let named = Rule::builder(LoginCheck).name("gate").build().unwrap();
        assert_eq!(named.name(), "gate");
        assert!(!named.is_stop());
    }

    #[test]
    fn test_invalid_pattern_fails_build() {
        let result = Rule::builder(LoginCheck).include("/orders/{id").build();
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }
}
