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

use crate::client::UploadClient;
use crate::config::Config;
use crate::context::Context;
use crate::proxy::state::ProxyState;
use crate::readiness::PodReadiness;
use crate::token::{TokenValidator, UPLOAD_TOKEN_ISSUER, UPLOAD_TOKEN_LEEWAY};
use kube::Client;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod client;
pub mod config;
pub mod context;
pub mod locator;
pub mod probe;
pub mod proxy;
pub mod readiness;
pub mod token;
pub mod utils;


shadow_rs::shadow!(build);

/// One-line description of this build.
pub fn version() -> String {
    format!(
        "{} (commit {}, built {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BUILD_TIME
    )
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("a rustls crypto provider was already installed");
    }

    info!("starting upload proxy {}", version());

    let validator = TokenValidator::new(
        UPLOAD_TOKEN_ISSUER,
        &config.apiserver_public_key,
        UPLOAD_TOKEN_LEEWAY,
    )?;
    let upload_client = UploadClient::new(
        &config.upload_client_cert,
        &config.upload_client_key,
        &config.upload_server_ca_cert,
    )?;

    let client = Client::try_default().await?;
    let readiness = PodReadiness::new(Context::new(client));

    let state = ProxyState::new(validator, Arc::new(readiness), upload_client);
    let app = proxy::routes::router(state);

    // only returns when the listener fails
    proxy::server::serve(config.bind_addr(), app, config.serving.as_ref()).await?;

    Ok(())
}
