use std::{future::Future, time::Duration};

use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use tokio::net::TcpStream;

/// Answers "is it worth trying an upload right now".
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> impl Future<Output = bool> + Send;
}

/// Probes reachability by opening a TCP connection to the backend.
#[derive(Debug, Clone)]
pub struct NetworkProbe {
    address: String,
    timeout: Duration,
}

impl NetworkProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    /// Derives `host:port` from a backend base URL.
    pub fn for_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(base_url).with_context(|| format!("invalid backend url {base_url}"))?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow!("backend url {base_url} has no host"))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| anyhow!("backend url {base_url} has no port"))?;
        Ok(Self::new(format!("{host}:{port}"), timeout))
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Connectivity for NetworkProbe {
    async fn is_online(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(&self.address)).await,
            Ok(Ok(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn derives_address_from_url() {
        let probe = NetworkProbe::for_url("http://localhost:8000/api", Duration::from_secs(1)).unwrap();
        assert_eq!(probe.address(), "localhost:8000");

        let probe = NetworkProbe::for_url("https://example.org", Duration::from_secs(1)).unwrap();
        assert_eq!(probe.address(), "example.org:443");

        assert!(NetworkProbe::for_url("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn reports_listening_and_closed_ports() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let probe = NetworkProbe::new(address.clone(), Duration::from_millis(500));
        assert!(probe.is_online().await);

        drop(listener);
        assert!(!probe.is_online().await);
    }
}
