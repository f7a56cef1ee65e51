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

//! Naming of the per-PVC upload server and its address.

use std::sync::Arc;

/// Prefix of the upload pod and service created for a PVC.
pub const UPLOAD_RESOURCE_PREFIX: &str = "cdi-upload-";

/// Path served by both this proxy and the upload servers behind it.
pub const UPLOAD_PATH: &str = "/v1alpha1/upload";

/// Maps `(namespace, pvc)` to the URL of that PVC's upload server.
///
/// Called once per request and never cached: the upload pod can be
/// recreated between attempts.
pub type UrlResolver = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Name of the upload pod and service backing `pvc`.
pub fn upload_resource_name(pvc: &str) -> String {
    format!("{UPLOAD_RESOURCE_PREFIX}{pvc}")
}

/// In-cluster URL of the upload server for `namespace/pvc`.
pub fn upload_server_url(namespace: &str, pvc: &str) -> String {
    format!(
        "https://{}.{}.svc{}",
        upload_resource_name(pvc),
        namespace,
        UPLOAD_PATH
    )
}

pub fn default_resolver() -> UrlResolver {
    Arc::new(upload_server_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_resource_name() {
        assert_eq!(upload_resource_name("pvc1"), "cdi-upload-pvc1");
    }

    #[test]
    fn test_upload_server_url() {
        assert_eq!(
            upload_server_url("ns1", "pvc1"),
            "https://cdi-upload-pvc1.ns1.svc/v1alpha1/upload"
        );
    }

    #[test]
    fn test_default_resolver_is_not_cached() {
        let resolve = default_resolver();
        assert_eq!(
            resolve("ns1", "pvc1"),
            "https://cdi-upload-pvc1.ns1.svc/v1alpha1/upload"
        );
        assert_eq!(
            resolve("ns2", "pvc2"),
            "https://cdi-upload-pvc2.ns2.svc/v1alpha1/upload"
        );
    }
}
