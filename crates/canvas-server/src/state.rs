pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Shared by every worker; `reqwest::Client` pools connections internally.
#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub upstream_url: String,
    pub model: String,
}

impl AppState {
    pub fn new(upstream_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            upstream_url: upstream_url.into(),
            model: model.into(),
        }
    }

    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.upstream_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_tolerates_trailing_slash() {
        let state = AppState::new("http://upstream:8080/", DEFAULT_MODEL);
        assert_eq!(state.messages_url(), "http://upstream:8080/v1/messages");
    }
}
