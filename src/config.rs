//! Adapter options, loadable from the Lambda environment.

use http::HeaderMap;
use http::header::CONTENT_TYPE;

/// Environment variable listing media types whose replies are always base64 encoded.
pub const BINARY_MEDIA_TYPES_ENV: &str = "ALB_BINARY_MEDIA_TYPES";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Media types (`image/png`, `image/*`, `*/*`) forced to base64 even when the
    /// body happens to be valid UTF-8.
    pub binary_media_types: Vec<String>,
}

impl AdapterOptions {
    /// Reads `ALB_BINARY_MEDIA_TYPES` as a comma-separated list.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(BINARY_MEDIA_TYPES_ENV)
            .map(|raw| Self {
                binary_media_types: parse_media_types(&raw),
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn with_binary_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.binary_media_types
            .push(media_type.into().trim().to_ascii_lowercase());
        self
    }

    /// Whether the response described by `headers` must be base64 encoded
    /// regardless of its content.
    #[must_use]
    pub fn forces_binary(&self, headers: &HeaderMap) -> bool {
        if self.binary_media_types.is_empty() {
            return false;
        }
        let Some(media_type) = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
        else {
            return false;
        };
        self.binary_media_types
            .iter()
            .any(|pattern| media_type_matches(pattern, &media_type))
    }
}

#[must_use]
pub fn parse_media_types(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn media_type_matches(pattern: &str, media_type: &str) -> bool {
    if pattern == "*/*" {
        return true;
    }
    match pattern.strip_suffix("/*") {
        Some(top_level) => media_type
            .split_once('/')
            .is_some_and(|(ty, _)| ty == top_level),
        None => pattern == media_type,
    }
}
