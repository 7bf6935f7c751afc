// Copyright 2025 Fernando Borretti
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

use crate::auth::TokenStore;
use crate::config::Config;
use crate::db::Database;

#[derive(Clone)]
pub struct ServerState {
    pub db: Database,
    pub config: Arc<Config>,
    pub tokens: TokenStore,
}

impl ServerState {
    pub fn new(config: Config, db: Database) -> Self {
        Self {
            db,
            tokens: TokenStore::new(config.token_ttl_seconds),
            config: Arc::new(config),
        }
    }
}
