// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use rustls::crypto::ring::sign;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::sign::CertifiedKey;
use rustls_pemfile::Item;
use snafu::{ResultExt, Snafu};
use std::io::{self, Cursor};

#[derive(Snafu, Debug)]
pub enum Error {
    #[snafu(display("parse certificate error: {}", source))]
    InvalidCertificate { source: io::Error },

    #[snafu(display("no certificate found in PEM data"))]
    NonCertificate,

    #[snafu(display("parse private key error: {}", source))]
    InvalidPrivateKey { source: io::Error },

    #[snafu(display("no private key found in PEM data"))]
    NonPrivateKey,

    #[snafu(display("certificate/key pair rejected: {}", source))]
    MatchFailed { source: rustls::Error },

    #[snafu(display("unsupported private key type: {}", source))]
    NoSupportedSignType { source: rustls::Error },

    #[snafu(display("unsupported PEM section, expected a PKCS#8, PKCS#1 or SEC1 key"))]
    NoSupportedPEMType,
}

/// Parses every certificate in a PEM bundle. An empty bundle is an error.
pub fn load_certs(cert: &[u8]) -> Result<Vec<CertificateDer<'static>>, Error> {
    let certs = rustls_pemfile::certs(&mut Cursor::new(cert))
        .collect::<Result<Vec<CertificateDer<'static>>, _>>()
        .context(InvalidCertificateSnafu)?;

    if certs.is_empty() {
        return NonCertificateSnafu.fail();
    }

    Ok(certs)
}

pub fn load_private_key(private_key: &[u8]) -> Result<PrivateKeyDer<'static>, Error> {
    let item = rustls_pemfile::read_one(&mut Cursor::new(private_key))
        .context(InvalidPrivateKeySnafu)?
        .ok_or(Error::NonPrivateKey)?;

    // only pkcs8/pkcs1/sec1 supported
    Ok(match item {
        Item::Pkcs8Key(key) => key.into(),
        Item::Pkcs1Key(key) => key.into(),
        Item::Sec1Key(key) => key.into(),
        _ => return NoSupportedPEMTypeSnafu.fail(),
    })
}

/// Checks that `cert_pem` and `key_pem` form a usable key pair.
///
/// Both the serving pair and the upload client pair go through here at
/// startup so that bad material is rejected before the listener binds.
pub fn x509_key_pair<T: AsRef<[u8]>>(cert_pem: T, key_pem: T) -> Result<(), Error> {
    let certs = load_certs(cert_pem.as_ref())?;
    let private_key = load_private_key(key_pem.as_ref())?;

    let signing_key = sign::any_supported_type(&private_key).context(NoSupportedSignTypeSnafu)?;

    let certified_key = CertifiedKey::new(certs, signing_key);
    certified_key.keys_match().context(MatchFailedSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures;

    #[test]
    fn test_x509_key_pair_pkcs8() {
        assert!(matches!(
            load_private_key(fixtures::CLIENT_KEY.as_bytes()),
            Ok(PrivateKeyDer::Pkcs8(_))
        ));

        assert!(x509_key_pair(fixtures::CLIENT_CERT, fixtures::CLIENT_KEY).is_ok());
    }

    #[test]
    fn test_x509_key_pair_pkcs1() {
        assert!(matches!(
            load_private_key(fixtures::SERVING_KEY.as_bytes()),
            Ok(PrivateKeyDer::Pkcs1(_))
        ));

        assert!(x509_key_pair(fixtures::SERVING_CERT, fixtures::SERVING_KEY).is_ok());
    }

    #[test]
    fn test_x509_key_pair_sec1() {
        assert!(matches!(
            load_private_key(fixtures::CLIENT_KEY_SEC1.as_bytes()),
            Ok(PrivateKeyDer::Sec1(_))
        ));

        assert!(x509_key_pair(fixtures::CLIENT_CERT, fixtures::CLIENT_KEY_SEC1).is_ok());
    }

    #[test]
    fn test_x509_key_pair_issued_by_ca() {
        assert!(x509_key_pair(fixtures::BACKEND_CERT, fixtures::BACKEND_KEY).is_ok());
        assert_eq!(load_certs(fixtures::OTHER_CA_CERT.as_bytes()).map(|c| c.len()).ok(), Some(1));
    }

    #[test]
    fn test_x509_key_pair_mismatch() {
        let err = x509_key_pair(fixtures::SERVING_CERT, fixtures::CLIENT_KEY).unwrap_err();
        assert!(matches!(err, Error::MatchFailed { .. }));
        assert!(err.to_string().starts_with("certificate/key pair rejected"));
    }

    #[test]
    fn test_load_certs_bundle() {
        let bundle = format!("{}\n{}", fixtures::CA_CERT, fixtures::CLIENT_CERT);
        assert_eq!(load_certs(bundle.as_bytes()).map(|c| c.len()).ok(), Some(2));

        assert!(matches!(load_certs(b""), Err(Error::NonCertificate)));
    }

    #[test]
    fn test_public_key_is_not_a_private_key() {
        assert!(matches!(
            load_private_key(fixtures::SIGNING_PUBLIC_KEY.as_bytes()),
            Err(Error::NoSupportedPEMType)
        ));
        assert!(matches!(
            load_private_key(b"garbage"),
            Err(Error::NonPrivateKey)
        ));
    }
}
