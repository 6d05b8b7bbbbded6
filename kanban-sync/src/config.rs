use std::time::Duration;

/// Connection settings shared by every board view of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base websocket URL of the board server
    pub server_url: String,
    /// Reconnection attempts after the first failure
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further attempt
    pub reconnect_delay: Duration,
    /// Time one connection attempt may take, handshake included
    pub connect_timeout: Duration,
    /// Delay between a terminal failure and the dashboard redirect
    pub redirect_delay: Duration,
    /// Time the session provider gets to resolve the local user
    pub identity_grace: Duration,
    /// Capacity of the client event channel
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8000".to_string(),
            max_retries: 2,
            reconnect_delay: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(10),
            redirect_delay: Duration::from_secs(4),
            identity_grace: Duration::from_secs(4),
            event_capacity: 256,
        }
    }
}

impl ClientConfig {
    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.reconnect_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Per-view handshake inputs.
///
/// The connection opens only once `slug` and `client_ip` are both known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub slug: Option<String>,
    pub client_ip: Option<String>,
    /// Session credential; absent means anonymous.
    pub auth_token: Option<String>,
    pub invite_token: Option<String>,
    /// Slug of the local user, if the session provider knows it.
    pub identity: Option<String>,
}

impl ConnectionParams {
    pub fn new(slug: impl Into<String>, client_ip: impl Into<String>) -> Self {
        Self {
            slug: Some(slug.into()),
            client_ip: Some(client_ip.into()),
            ..Self::default()
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_invite_token(mut self, token: impl Into<String>) -> Self {
        self.invite_token = Some(token.into());
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn is_ready(&self) -> bool {
        matches!(&self.slug, Some(s) if !s.is_empty())
            && matches!(&self.client_ip, Some(ip) if !ip.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.server_url, "ws://127.0.0.1:8000");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.redirect_delay, Duration::from_secs(4));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_doubles() {
        let config = ClientConfig {
            reconnect_delay: Duration::from_millis(100),
            ..ClientConfig::default()
        };
        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_params_ready() {
        assert!(!ConnectionParams::default().is_ready());
        assert!(ConnectionParams::new("board12345", "10.0.0.1").is_ready());

        let mut params = ConnectionParams::new("board12345", "");
        assert!(!params.is_ready());
        params.client_ip = Some("10.0.0.1".to_string());
        assert!(params.is_ready());
    }
}
