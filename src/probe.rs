// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Connectivity check run against an upload server before any bytes are
//! forwarded to it.
//!
//! Upload pods are frequently still starting when the first request
//! arrives, so a refused or timed out connection is expected and retried.
//! The outbound request itself has a very long timeout to fit large
//! transfers, which is why reachability is settled here first.

use snafu::{OptionExt, ResultExt, Snafu};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
pub const CONNECT_TRIES: u32 = 5;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("error parsing URL {}: {}", url, source))]
    InvalidUrl { url: String, source: url::ParseError },

    #[snafu(display("URL {} has no host", url))]
    NoHost { url: String },

    #[snafu(display("no port given and no default port for scheme {}", scheme))]
    UnknownPort { scheme: String },

    #[snafu(display("failed {} times connecting to {}", attempts, url))]
    Unreachable { url: String, attempts: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct Prober {
    pub attempts: u32,
    pub timeout: Duration,
}

impl Default for Prober {
    fn default() -> Self {
        Self {
            attempts: CONNECT_TRIES,
            timeout: CONNECT_TIMEOUT,
        }
    }
}

impl Prober {
    /// Opens and immediately drops a TCP connection to the host behind `url`.
    ///
    /// Every failed attempt is retried, timeouts and other errors alike, and
    /// only once all attempts are used up is the backend reported unreachable.
    pub async fn probe(&self, url: &str) -> Result<(), Error> {
        let host_port = host_port(url)?;

        for attempt in 1..=self.attempts {
            match tokio::time::timeout(self.timeout, TcpStream::connect(&host_port)).await {
                Ok(Ok(_stream)) => {
                    debug!("successfully connected to {} on attempt {}", url, attempt);
                    return Ok(());
                }
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::TimedOut => {
                    debug!("timeout connecting to {} on attempt {}", host_port, attempt);
                }
                Ok(Err(e)) => {
                    debug!(
                        "unexpected error connecting to {} on attempt {}: {}",
                        host_port, attempt, e
                    );
                    // refused connections fail instantly, pace the next attempt
                    if attempt < self.attempts {
                        tokio::time::sleep(self.timeout / 4).await;
                    }
                }
                Err(_) => {
                    debug!("timeout connecting to {} on attempt {}", host_port, attempt);
                }
            }
        }

        UnreachableSnafu {
            url,
            attempts: self.attempts,
        }
        .fail()
    }
}

/// `host:port` for `url`, falling back to the scheme's well known port.
fn host_port(url: &str) -> Result<String, Error> {
    let parsed = Url::parse(url).context(InvalidUrlSnafu { url })?;
    let host = parsed.host_str().context(NoHostSnafu { url })?;
    let port = parsed.port_or_known_default().context(UnknownPortSnafu {
        scheme: parsed.scheme(),
    })?;

    Ok(format!("{host}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn fast_prober() -> Prober {
        Prober {
            attempts: 3,
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_host_port() {
        assert_eq!(
            host_port("https://cdi-upload-pvc1.ns1.svc/v1alpha1/upload").unwrap(),
            "cdi-upload-pvc1.ns1.svc:443"
        );
        assert_eq!(host_port("http://example.com/").unwrap(), "example.com:80");
        assert_eq!(
            host_port("http://127.0.0.1:8080/upload").unwrap(),
            "127.0.0.1:8080"
        );
        assert_eq!(host_port("http://[::1]:9000/").unwrap(), "[::1]:9000");
    }

    #[test]
    fn test_host_port_errors() {
        assert!(matches!(
            host_port("not a url"),
            Err(Error::InvalidUrl { .. })
        ));
        assert!(matches!(
            host_port("foo://example.com/"),
            Err(Error::UnknownPort { .. })
        ));
    }

    #[tokio::test]
    async fn test_probe_live_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let url = format!("http://{addr}/v1alpha1/upload");
        assert!(fast_prober().probe(&url).await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_exhausts_attempts() {
        // grab a free port, then close it so connections are refused
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{addr}/v1alpha1/upload");
        match fast_prober().probe(&url).await {
            Err(Error::Unreachable { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected unreachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_last_refusal_reports_without_pause() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober = Prober {
            attempts: 1,
            timeout: Duration::from_secs(8),
        };
        let started = std::time::Instant::now();
        let result = prober.probe(&format!("http://{addr}/")).await;

        assert!(matches!(result, Err(Error::Unreachable { attempts: 1, .. })));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_probe_succeeds_once_backend_starts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober = Prober {
            attempts: 10,
            timeout: Duration::from_millis(200),
        };
        let url = format!("http://{addr}/");

        let late_listener = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let listener = TcpListener::bind(addr).await.unwrap();
            // keep accepting until the probe connects
            let _ = listener.accept().await;
        });

        assert!(prober.probe(&url).await.is_ok());
        late_listener.abort();
    }
}
