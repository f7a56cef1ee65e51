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

use crate::context::{self, Context};
use crate::locator::upload_resource_name;
use futures::FutureExt;
use futures::future::BoxFuture;
use k8s_openapi::api::core::v1::Pod;
use snafu::Snafu;

const POD_SUCCEEDED: &str = "Succeeded";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("rejecting upload request for pod {}/{} that doesn't exist", namespace, pod))]
    PodNotFound { namespace: String, pod: String },

    #[snafu(display(
        "rejecting upload request for pod {}/{} that already finished uploading",
        namespace,
        pod
    ))]
    AlreadyFinished { namespace: String, pod: String },

    #[snafu(transparent)]
    Lookup { source: context::Error },
}

impl Error {
    /// True when the destination can not take an upload, as opposed to the
    /// lookup itself failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Error::PodNotFound { .. } | Error::AlreadyFinished { .. }
        )
    }
}

/// Decides whether a PVC may still receive an upload.
pub trait UploadReadiness: Send + Sync {
    fn check<'a>(&'a self, name: &'a str, namespace: &'a str) -> BoxFuture<'a, Result<(), Error>>;
}

/// Readiness backed by the phase of the PVC's upload pod.
pub struct PodReadiness {
    ctx: Context,
}

impl PodReadiness {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

impl UploadReadiness for PodReadiness {
    fn check<'a>(&'a self, name: &'a str, namespace: &'a str) -> BoxFuture<'a, Result<(), Error>> {
        async move {
            let pod_name = upload_resource_name(name);
            let pod = self.ctx.get_opt::<Pod>(&pod_name, namespace).await?;
            evaluate_pod(&pod_name, namespace, pod.as_ref())
        }
        .boxed()
    }
}

fn evaluate_pod(pod_name: &str, namespace: &str, pod: Option<&Pod>) -> Result<(), Error> {
    let Some(pod) = pod else {
        return PodNotFoundSnafu {
            namespace,
            pod: pod_name,
        }
        .fail();
    };

    let phase = pod.status.as_ref().and_then(|s| s.phase.as_deref());
    if phase == Some(POD_SUCCEEDED) {
        return AlreadyFinishedSnafu {
            namespace,
            pod: pod_name,
        }
        .fail();
    }

    Ok(())
}
