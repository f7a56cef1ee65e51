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

use clap::Args;
use snafu::{ResultExt, Snafu};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::utils::tls;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("unable to read {}: {}", path.display(), source))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("invalid upload client certificate: {}", source))]
    ClientKeyPair { source: tls::Error },

    #[snafu(display("invalid upload server CA bundle: {}", source))]
    ServerCa { source: tls::Error },

    #[snafu(display("invalid serving certificate: {}", source))]
    ServingKeyPair { source: tls::Error },
}

/// Certificate and key the proxy presents to its clients.
#[derive(Debug, Clone)]
pub struct ServingCert {
    pub cert: String,
    pub key: String,
}

/// Startup configuration, immutable for the life of the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: IpAddr,
    pub bind_port: u16,
    /// PEM public key the API server signs upload tokens with.
    pub apiserver_public_key: String,
    pub upload_client_cert: String,
    pub upload_client_key: String,
    /// PEM bundle trusted when connecting to upload servers.
    pub upload_server_ca_cert: String,
    /// `None` serves plaintext.
    pub serving: Option<ServingCert>,
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.bind_port)
    }

    /// Rejects TLS material that would only fail once requests arrive.
    pub fn validate(&self) -> Result<(), Error> {
        tls::x509_key_pair(&self.upload_client_cert, &self.upload_client_key)
            .context(ClientKeyPairSnafu)?;
        tls::load_certs(self.upload_server_ca_cert.as_bytes()).context(ServerCaSnafu)?;

        if let Some(serving) = &self.serving {
            tls::x509_key_pair(&serving.cert, &serving.key).context(ServingKeyPairSnafu)?;
        }

        Ok(())
    }
}

/// Command line of the `server` subcommand. Every file can also be given
/// through the environment variable named in its help.
#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "UPLOAD_PROXY_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: IpAddr,

    /// Port to listen on
    #[arg(long, env = "UPLOAD_PROXY_BIND_PORT", default_value_t = 8443)]
    pub bind_port: u16,

    /// PEM public key used to verify upload tokens
    #[arg(long, env = "APISERVER_PUBLIC_KEY_FILE")]
    pub apiserver_public_key: PathBuf,

    /// PEM client certificate presented to upload servers
    #[arg(long, env = "UPLOAD_CLIENT_CERT_FILE")]
    pub upload_client_cert: PathBuf,

    /// PEM private key of the upload client certificate
    #[arg(long, env = "UPLOAD_CLIENT_KEY_FILE")]
    pub upload_client_key: PathBuf,

    /// PEM CA bundle used to verify upload servers
    #[arg(long, env = "UPLOAD_SERVER_CA_CERT_FILE")]
    pub upload_server_ca_cert: PathBuf,

    /// PEM serving certificate; plaintext is served when absent
    #[arg(long, env = "UPLOAD_PROXY_SERVICE_CERT_FILE")]
    pub service_cert: Option<PathBuf>,

    /// PEM private key of the serving certificate
    #[arg(long, env = "UPLOAD_PROXY_SERVICE_KEY_FILE")]
    pub service_key: Option<PathBuf>,
}

impl ServerArgs {
    /// Reads every referenced file and validates the result.
    pub async fn load(self) -> Result<Config, Error> {
        let service_cert = read_optional(self.service_cert.as_deref()).await?;
        let service_key = read_optional(self.service_key.as_deref()).await?;

        let serving = match (service_cert, service_key) {
            (Some(cert), Some(key)) if !cert.is_empty() && !key.is_empty() => {
                Some(ServingCert { cert, key })
            }
            (None, None) => None,
            _ => {
                warn!("serving certificate and key must both be set, falling back to plaintext");
                None
            }
        };

        let config = Config {
            bind_address: self.bind_address,
            bind_port: self.bind_port,
            apiserver_public_key: read(&self.apiserver_public_key).await?,
            upload_client_cert: read(&self.upload_client_cert).await?,
            upload_client_key: read(&self.upload_client_key).await?,
            upload_server_ca_cert: read(&self.upload_server_ca_cert).await?,
            serving,
        };
        config.validate()?;

        Ok(config)
    }
}

async fn read(path: &Path) -> Result<String, Error> {
    tokio::fs::read_to_string(path)
        .await
        .context(ReadFileSnafu { path })
}

async fn read_optional(path: Option<&Path>) -> Result<Option<String>, Error> {
    match path {
        Some(path) => read(path).await.map(Some),
        None => Ok(None),
    }
}
