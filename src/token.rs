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

//! Upload token validation.
//!
//! Upload tokens are RS256 JWTs minted by the API server. The registered
//! claims (`iss`, `iat`, `nbf`, `exp`) sit next to the payload fields in a
//! single flat JSON object.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use std::collections::BTreeMap;
use std::time::Duration;
use strum::Display;

/// Issuer expected in every upload token.
pub const UPLOAD_TOKEN_ISSUER: &str = "cdi-apiserver";

/// Clock skew tolerated on `exp` and `nbf`.
pub const UPLOAD_TOKEN_LEEWAY: Duration = Duration::from_secs(10);

/// Resource kind an upload token must refer to.
pub const UPLOAD_RESOURCE: &str = "persistentvolumeclaims";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid token signing public key: {}", source))]
    InvalidPublicKey { source: jsonwebtoken::errors::Error },

    #[snafu(display("token rejected: {}", source))]
    InvalidToken { source: jsonwebtoken::errors::Error },
}

/// Reasons a correctly signed token still cannot authorize an upload.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum ClaimsError {
    #[snafu(display("token operation is {}, expected Upload", operation))]
    WrongOperation { operation: Operation },

    #[snafu(display("token has no resource name"))]
    MissingName,

    #[snafu(display("token has no resource namespace"))]
    MissingNamespace,

    #[snafu(display("token resource is '{}', expected '{}'", resource, UPLOAD_RESOURCE))]
    WrongResource { resource: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Operation {
    Upload,

    Clone,

    /// Any operation this proxy does not know about.
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersionResource {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub resource: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    pub exp: i64,

    #[serde(default)]
    pub operation: Operation,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub resource: GroupVersionResource,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl Claims {
    /// Checks that the claims authorize an upload into a named PVC.
    pub fn check_upload(&self) -> Result<(), ClaimsError> {
        if self.operation != Operation::Upload {
            return WrongOperationSnafu {
                operation: self.operation,
            }
            .fail();
        }
        if self.name.is_empty() {
            return MissingNameSnafu.fail();
        }
        if self.namespace.is_empty() {
            return MissingNamespaceSnafu.fail();
        }
        if self.resource.resource != UPLOAD_RESOURCE {
            return WrongResourceSnafu {
                resource: self.resource.resource.clone(),
            }
            .fail();
        }
        Ok(())
    }

    pub fn expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.exp, 0)
    }
}

/// Verifies upload tokens against the API server's public key.
///
/// Holds no mutable state; one instance is shared by every request.
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(issuer: &str, public_key_pem: &str, leeway: Duration) -> Result<Self, Error> {
        let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .context(InvalidPublicKeySnafu)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = leeway.as_secs();
        validation.validate_nbf = true;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Ok(Self { key, validation })
    }

    /// Checks signature, issuer and validity window, then returns the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, Error> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .context(InvalidTokenSnafu)
    }
}
