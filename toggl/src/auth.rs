use base64::prelude::*;
use std::fmt;

/// API token credentials for Toggl Track.
///
/// Toggl accepts the token as the basic-auth username with the literal
/// password `api_token`.
#[derive(Clone)]
pub struct Credentials {
    api_token: String,
}

impl Credentials {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
        }
    }

    pub fn as_authorization_header(&self) -> String {
        let raw = format!("{}:api_token", self.api_token);
        format!("Basic {}", BASE64_STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"<redacted>")
            .finish()
    }
}
