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

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use snafu::ResultExt;
use tracing::{debug, info, warn};

use crate::proxy::{
    auth::BearerToken,
    error::{self, Error, Result},
    state::ProxyState,
};

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Authenticates an upload, checks that its PVC can still take data and
/// streams the body to the PVC's upload server.
pub async fn upload(
    State(state): State<ProxyState>,
    BearerToken(token): BearerToken,
    headers: HeaderMap,
    body: Body,
) -> Result<Response> {
    let claims = state
        .validator
        .validate(&token)
        .context(error::UnauthenticatedSnafu)?;

    if let Err(source) = claims.check_upload() {
        warn!("bad token {:?}", claims);
        return Err(Error::MalformedClaims { source });
    }

    info!(
        pvc = %claims.name,
        namespace = %claims.namespace,
        expires_at = ?claims.expires_at(),
        "received valid upload token"
    );

    state
        .readiness
        .check(&claims.name, &claims.namespace)
        .await
        .map_err(|source| {
            if source.is_unavailable() {
                Error::DestinationUnavailable { source }
            } else {
                Error::ReadinessLookup { source }
            }
        })?;

    proxy_upload(&state, &claims.namespace, &claims.name, &headers, body).await
}

async fn proxy_upload(
    state: &ProxyState,
    namespace: &str,
    pvc: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<Response> {
    let url = (state.resolver)(namespace, pvc);

    state
        .prober
        .probe(&url)
        .await
        .context(error::BackendUnreachableSnafu)?;

    let content_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    debug!("posting to {}", url);

    let outbound = reqwest::Body::wrap_stream(body.into_data_stream());
    let response = state
        .client
        .forward(&url, outbound, content_length)
        .await
        .context(error::ForwardSnafu { url: url.as_str() })?;

    let status = response.status();
    debug!("response status for url {}: {}", url, status);

    // the status is already committed once streaming starts, so failures are only logged
    let relayed = response
        .bytes_stream()
        .inspect_err(move |e| warn!("error proxying response from url {}: {}", url, e));

    Ok((status, Body::from_stream(relayed)).into_response())
}
