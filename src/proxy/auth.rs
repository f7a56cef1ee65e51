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
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use regex::Regex;
use std::sync::LazyLock;

use crate::proxy::error::Error;

// token68-like alphabet, case-insensitive scheme
#[allow(clippy::expect_used)]
static AUTH_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Bearer\s+([A-Za-z0-9._~+/-]+)$").expect("invalid authorization pattern")
});

/// Extracts the token from an `Authorization: Bearer <token>` value.
pub fn parse_bearer(value: &str) -> Option<&str> {
    AUTH_HEADER
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Bearer token taken from the `Authorization` header.
///
/// Rejects with [`Error::MalformedRequest`] before any cryptographic work
/// when the header is missing or not of the expected shape.
#[derive(Debug)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| Error::MalformedRequest {
                message: "missing Authorization header".to_string(),
            })?;

        value
            .to_str()
            .ok()
            .and_then(parse_bearer)
            .map(|token| BearerToken(token.to_string()))
            .ok_or_else(|| Error::MalformedRequest {
                message: "Authorization header is not a bearer token".to_string(),
            })
    }
}
