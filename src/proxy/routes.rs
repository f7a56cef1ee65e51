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
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::locator::UPLOAD_PATH;
use crate::proxy::{handlers, state::ProxyState};

pub const HEALTHZ_PATH: &str = "/healthz";

/// Route table of the upload proxy.
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(HEALTHZ_PATH, get(handlers::healthz))
        // upload bodies are streamed through, never buffered
        .route(
            UPLOAD_PATH,
            post(handlers::upload).layer(DefaultBodyLimit::disable()),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
