pub const DEFAULT_API_URL: &str = "https://api.track.toggl.com/api/v9";

#[derive(Debug, Clone)]
pub struct TogglURL(String);

impl AsRef<str> for TogglURL {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TogglURL {
    pub fn new(base: &str) -> Self {
        Self(base.trim_end_matches('/').to_string())
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }

    pub fn with_query(&self, key: &str, value: &str) -> Self {
        if self.0.contains('?') {
            Self(format!("{}&{}={}", self.0, key, value))
        } else {
            Self(format!("{}?{}={}", self.0, key, value))
        }
    }
}

impl Default for TogglURL {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_paths_and_queries() {
        let url = TogglURL::new("https://example.com/api/v9/")
            .append_path("/me")
            .with_query("with_related_data", "true")
            .with_query("since", "0");
        assert_eq!(
            url.as_ref(),
            "https://example.com/api/v9/me?with_related_data=true&since=0"
        );
    }
}
