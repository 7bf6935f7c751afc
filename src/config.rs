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

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;

const DEFAULT_BIND: &str = "127.0.0.1:8000";
const DEFAULT_DATABASE: &str = "studytrack.sqlite3";

/// One week.
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Process configuration, loaded once at startup and passed down
/// explicitly. Credentials live here, not in ambient environment
/// variables read at call time.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: i64,
    /// username -> password.
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_token_ttl() -> i64 {
    DEFAULT_TOKEN_TTL_SECONDS
}

impl Config {
    pub fn load(path: &Path) -> Fallible<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn credential_for(&self, username: &str) -> Option<&str> {
        self.users.get(username).map(|p| p.as_str())
    }
}
