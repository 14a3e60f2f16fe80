//! Channel configuration.

use std::time::Duration;

use voxbar_core::DEFAULT_SAMPLE_RATE;

/// The AssemblyAI v2 realtime endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://api.assemblyai.com/v2/realtime/ws";

const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the realtime transcript connector.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// API key, sent as the Authorization header on the upgrade request
    pub api_key: String,

    /// Endpoint base URL without a query string
    pub endpoint: String,

    /// Sample rate of the audio that will be streamed (in Hz)
    pub sample_rate: u32,

    /// How long to wait for the WebSocket handshake to complete
    pub open_timeout: Duration,
}

impl ChannelConfig {
    /// Create a config for the default endpoint with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            open_timeout: DEFAULT_OPEN_TIMEOUT,
        }
    }

    /// Point the connector at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the advertised sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the handshake timeout.
    pub fn with_open_timeout(mut self, open_timeout: Duration) -> Self {
        self.open_timeout = open_timeout;
        self
    }

    /// Full URL to connect to, including the sample rate query parameter.
    pub fn url(&self) -> String {
        format!("{}?sample_rate={}", self.endpoint, self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url() {
        let config = ChannelConfig::new("key");
        assert_eq!(
            config.url(),
            "wss://api.assemblyai.com/v2/realtime/ws?sample_rate=16000"
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = ChannelConfig::new("key")
            .with_endpoint("ws://127.0.0.1:9090/v2/realtime/ws")
            .with_sample_rate(8_000)
            .with_open_timeout(Duration::from_secs(1));

        assert_eq!(config.url(), "ws://127.0.0.1:9090/v2/realtime/ws?sample_rate=8000");
        assert_eq!(config.open_timeout, Duration::from_secs(1));
    }
}
