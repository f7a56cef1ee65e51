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

use std::sync::Arc;

use crate::client::UploadClient;
use crate::locator::{UrlResolver, default_resolver};
use crate::probe::Prober;
use crate::readiness::UploadReadiness;
use crate::token::TokenValidator;

/// Built once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct ProxyState {
    pub validator: Arc<TokenValidator>,
    pub readiness: Arc<dyn UploadReadiness>,
    pub resolver: UrlResolver,
    pub prober: Prober,
    pub client: UploadClient,
}

impl ProxyState {
    pub fn new(
        validator: TokenValidator,
        readiness: Arc<dyn UploadReadiness>,
        client: UploadClient,
    ) -> Self {
        Self {
            validator: Arc::new(validator),
            readiness,
            resolver: default_resolver(),
            prober: Prober::default(),
            client,
        }
    }

    pub fn with_resolver(mut self, resolver: UrlResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_prober(mut self, prober: Prober) -> Self {
        self.prober = prober;
        self
    }
}
