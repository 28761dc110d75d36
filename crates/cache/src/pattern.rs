use regex::Regex;

/// Selects cache keys for invalidation.
#[derive(Debug, Clone)]
pub enum CachePattern {
    Exact(String),
    Prefix(String),
    Contains(String),
    /// Escape hatch for ad-hoc administrative purges.
    Regex(Regex),
}

impl CachePattern {
    pub fn exact(key: impl Into<String>) -> Self {
        Self::Exact(key.into())
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains(fragment.into())
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Exact(exact) => key == exact,
            Self::Prefix(prefix) => key.starts_with(prefix.as_str()),
            Self::Contains(fragment) => key.contains(fragment.as_str()),
            Self::Regex(regex) => regex.is_match(key),
        }
    }
}

impl std::fmt::Display for CachePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(exact) => write!(f, "={}", exact),
            Self::Prefix(prefix) => write!(f, "{}*", prefix),
            Self::Contains(fragment) => write!(f, "*{}*", fragment),
            Self::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}
