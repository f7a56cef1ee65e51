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
    http::StatusCode,
    response::{IntoResponse, Response},
};
use snafu::Snafu;
use tracing::{error, warn};

use crate::{probe, readiness, token};

/// Everything that can stop an upload request before or while it is forwarded.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("malformed request: {}", message))]
    MalformedRequest { message: String },

    #[snafu(display("unauthenticated: {}", source))]
    Unauthenticated { source: token::Error },

    #[snafu(display("bad token claims: {}", source))]
    MalformedClaims { source: token::ClaimsError },

    #[snafu(display("{}", source))]
    DestinationUnavailable { source: readiness::Error },

    #[snafu(display("checking upload readiness: {}", source))]
    ReadinessLookup { source: readiness::Error },

    #[snafu(display("error connecting to upload server: {}", source))]
    BackendUnreachable { source: probe::Error },

    #[snafu(display("error proxying to {}: {}", url, source))]
    Forward { url: String, source: reqwest::Error },
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::MalformedRequest { .. } | Error::MalformedClaims { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::DestinationUnavailable { .. } | Error::BackendUnreachable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::ReadinessLookup { .. } | Error::Forward { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Only the status code reaches the client; the details go to the log.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", self);
        } else {
            warn!(status = status.as_u16(), "{}", self);
        }
        status.into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let malformed = Error::MalformedRequest {
            message: "missing Authorization header".to_string(),
        };
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

        let claims = Error::MalformedClaims {
            source: token::ClaimsError::MissingName,
        };
        assert_eq!(claims.status(), StatusCode::BAD_REQUEST);

        let finished = Error::DestinationUnavailable {
            source: readiness::Error::AlreadyFinished {
                namespace: "ns1".to_string(),
                pod: "cdi-upload-pvc1".to_string(),
            },
        };
        assert_eq!(finished.status(), StatusCode::SERVICE_UNAVAILABLE);

        let unreachable = Error::BackendUnreachable {
            source: probe::Error::Unreachable {
                url: "https://cdi-upload-pvc1.ns1.svc/v1alpha1/upload".to_string(),
                attempts: 5,
            },
        };
        assert_eq!(unreachable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let lookup = Error::ReadinessLookup {
            source: readiness::Error::Lookup {
                source: crate::context::Error::Kube {
                    source: kube::Error::Service(std::io::Error::other("connection reset").into()),
                },
            },
        };
        assert_eq!(lookup.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_forward_failure_is_internal_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1alpha1/upload", listener.local_addr().unwrap());
        drop(listener);

        let source = reqwest::Client::new().post(&url).send().await.unwrap_err();
        let forward = Error::Forward { url, source };
        assert_eq!(forward.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            forward.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_has_no_body_detail() {
        let response = Error::MalformedRequest {
            message: "secret detail".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
