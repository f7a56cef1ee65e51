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

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use snafu::{ResultExt, Snafu};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::config::ServingCert;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("unable to create certs temporary directory: {}", source))]
    CertsDir { source: io::Error },

    #[snafu(display("unable to write {}: {}", path.display(), source))]
    WriteCert { path: PathBuf, source: io::Error },

    #[snafu(display("unable to load serving certificate: {}", source))]
    TlsConfig { source: io::Error },

    #[snafu(display("unable to bind {}: {}", addr, source))]
    Bind { addr: SocketAddr, source: io::Error },

    #[snafu(display("server exited: {}", source))]
    Serve { source: io::Error },
}

/// Serves `app` on `addr` until the listener fails.
///
/// With a serving certificate the server speaks TLS only; the certificate
/// and key are written to a private temporary directory which is removed
/// when this function returns. Without one it serves plaintext, which is
/// only meant for local runs and tests.
pub async fn serve(addr: SocketAddr, app: Router, tls: Option<&ServingCert>) -> Result<(), Error> {
    match tls {
        Some(serving) => {
            let certs_dir = tempfile::Builder::new()
                .prefix("certsdir")
                .tempdir()
                .context(CertsDirSnafu)?;
            let (cert_file, key_file) = materialize(&certs_dir, serving).await?;

            let config = RustlsConfig::from_pem_file(&cert_file, &key_file)
                .await
                .context(TlsConfigSnafu)?;

            info!("upload proxy listening on https://{}", addr);
            axum_server::bind_rustls(addr, config)
                .serve(app.into_make_service())
                .await
                .context(ServeSnafu)
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .context(BindSnafu { addr })?;

            info!("upload proxy listening on http://{}", addr);
            axum::serve(listener, app).await.context(ServeSnafu)
        }
    }
}

/// Writes the serving pair into `dir` as `cert.pem` and `key.pem`.
async fn materialize(dir: &TempDir, serving: &ServingCert) -> Result<(PathBuf, PathBuf), Error> {
    let cert_file = dir.path().join("cert.pem");
    let key_file = dir.path().join("key.pem");

    write_private(&key_file, serving.key.as_bytes()).await?;
    write_private(&cert_file, serving.cert.as_bytes()).await?;

    Ok((cert_file, key_file))
}

async fn write_private(path: &Path, contents: &[u8]) -> Result<(), Error> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let write = async {
        let mut file = options.open(path).await?;
        file.write_all(contents).await?;
        file.flush().await
    };
    write.await.context(WriteCertSnafu { path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures;

    fn serving() -> ServingCert {
        ServingCert {
            cert: fixtures::SERVING_CERT.to_string(),
            key: fixtures::SERVING_KEY.to_string(),
        }
    }

    #[tokio::test]
    async fn test_materialize_writes_private_files() {
        let dir = tempfile::tempdir().unwrap();
        let (cert_file, key_file) = materialize(&dir, &serving()).await.unwrap();

        assert_eq!(
            tokio::fs::read_to_string(&cert_file).await.unwrap(),
            fixtures::SERVING_CERT
        );
        assert_eq!(
            tokio::fs::read_to_string(&key_file).await.unwrap(),
            fixtures::SERVING_KEY
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&key_file).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn test_materialized_files_removed_with_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let (cert_file, _) = materialize(&dir, &serving()).await.unwrap();
        assert!(cert_file.exists());

        drop(dir);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_materialized_pair_loads_as_rustls_config() {
        let _ = rustls::crypto::ring::default_provider().install_default();

        let dir = tempfile::tempdir().unwrap();
        let (cert_file, key_file) = materialize(&dir, &serving()).await.unwrap();

        assert!(RustlsConfig::from_pem_file(&cert_file, &key_file).await.is_ok());
    }

    #[tokio::test]
    async fn test_serve_reports_bind_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let result = serve(addr, Router::new(), None).await;
        assert!(matches!(result, Err(Error::Bind { .. })));
    }
}
