//! Generative AI API status adapter.
//!
//! No upstream client is wired yet, so reachability is judged from
//! configuration alone: a configured API key means the API is usable.

use async_trait::async_trait;

use crate::domain::ports::{GenerativeApiProbe, GenerativeApiStatus};

/// Reports `ok` when an API key is configured and `error` otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ApiKeyPresenceProbe {
    configured: bool,
}

impl ApiKeyPresenceProbe {
    /// Probe for a key that is (or is not) present.
    pub const fn new(configured: bool) -> Self {
        Self { configured }
    }
}

#[async_trait]
impl GenerativeApiProbe for ApiKeyPresenceProbe {
    async fn status(&self) -> GenerativeApiStatus {
        if self.configured {
            GenerativeApiStatus::Ok
        } else {
            GenerativeApiStatus::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, GenerativeApiStatus::Ok)]
    #[case(false, GenerativeApiStatus::Error)]
    #[tokio::test]
    async fn status_follows_key_presence(
        #[case] configured: bool,
        #[case] expected: GenerativeApiStatus,
    ) {
        assert_eq!(ApiKeyPresenceProbe::new(configured).status().await, expected);
    }
}
