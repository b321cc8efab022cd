//! Paths that bypass the guard entirely.
//!
//! A path is excluded when the text after its leading `/` starts with one of
//! the configured prefixes. Matching is a plain prefix test with no segment
//! boundary, so `api` also excludes `/apidocs`.

pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &["api", "static", "favicon.ico", "public", "healthz"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionMatcher {
    prefixes: Vec<String>,
}

impl ExclusionMatcher {
    #[must_use]
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .map(|p: String| p.trim().trim_start_matches('/').to_owned())
            .filter(|p| !p.is_empty())
            .collect();
        Self { prefixes }
    }

    /// Parse a comma-separated prefix list, e.g. `api,static,favicon.ico`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };
        self.prefixes
            .iter()
            .any(|prefix| rest.starts_with(prefix.as_str()))
    }
}

impl Default for ExclusionMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_PREFIXES.iter().copied())
    }
}

#[cfg(test)]
#[path = "exclusion_test.rs"]
mod tests;
