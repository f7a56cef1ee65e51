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

use crate::utils::tls;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Certificate, Identity, Response};
use snafu::{ResultExt, Snafu};
use std::time::Duration;

/// Upper bound for a whole forwarded upload, transfer included.
pub const PROXY_REQUEST_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid upload client key pair: {}", source))]
    ClientKeyPair { source: tls::Error },

    #[snafu(display("invalid upload server CA bundle: {}", source))]
    CaBundle { source: tls::Error },

    #[snafu(display("failed to load TLS material into HTTP client: {}", source))]
    Tls { source: reqwest::Error },

    #[snafu(display("failed to build HTTP client: {}", source))]
    Build { source: reqwest::Error },
}

/// HTTP client used for every request to an upload server.
///
/// Presents the proxy's client certificate and trusts only the upload
/// server CA. Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct UploadClient {
    inner: reqwest::Client,
}

impl UploadClient {
    pub fn new(client_cert: &str, client_key: &str, server_ca: &str) -> Result<Self, Error> {
        tls::x509_key_pair(client_cert, client_key).context(ClientKeyPairSnafu)?;
        tls::load_certs(server_ca.as_bytes()).context(CaBundleSnafu)?;

        let identity = Identity::from_pem(format!("{client_cert}\n{client_key}").as_bytes())
            .context(TlsSnafu)?;
        let roots = Certificate::from_pem_bundle(server_ca.as_bytes()).context(TlsSnafu)?;

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .tls_built_in_root_certs(false)
            .identity(identity)
            .timeout(PROXY_REQUEST_TIMEOUT);
        for root in roots {
            builder = builder.add_root_certificate(root);
        }

        Ok(Self {
            inner: builder.build().context(BuildSnafu)?,
        })
    }

    /// Wraps an already configured client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// POSTs `body` to `url` and returns as soon as the response head arrives.
    pub async fn forward(
        &self,
        url: &str,
        body: Body,
        content_length: Option<u64>,
    ) -> Result<Response, reqwest::Error> {
        let mut request = self.inner.post(url).body(body);
        if let Some(len) = content_length {
            request = request.header(CONTENT_LENGTH, len);
        }
        request.send().await
    }
}
