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

//! Bearer-token session store.
//!
//! Tokens live in memory, carry an expiry computed from the configured TTL,
//! and are checked against a caller-supplied clock at lookup. Nothing here
//! touches storage-engine timestamp semantics.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use rand::Rng;

use crate::types::timestamp::Timestamp;

const TOKEN_LEN: usize = 32;

struct TokenEntry {
    username: String,
    expires_at: Timestamp,
}

#[derive(Clone)]
pub struct TokenStore {
    ttl_seconds: i64,
    tokens: Arc<Mutex<HashMap<String, TokenEntry>>>,
}

impl TokenStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            ttl_seconds,
            tokens: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Issue a fresh token for `username`, expiring `ttl_seconds` after
    /// `now`.
    pub fn issue(&self, username: &str, now: Timestamp) -> String {
        let token = generate_token();
        let expires_at = Timestamp::new(
            now.into_inner() + chrono::Duration::seconds(self.ttl_seconds),
        );
        let entry = TokenEntry {
            username: username.to_string(),
            expires_at,
        };
        self.tokens.lock().unwrap().insert(token.clone(), entry);
        log::debug!("Issued token for {username}, expires {expires_at}");
        token
    }

    /// Resolve a token to its username. Expired entries are evicted on
    /// touch and treated as unknown.
    pub fn lookup(&self, token: &str, now: Timestamp) -> Option<String> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.get(token) {
            Some(entry) if entry.expires_at > now => Some(entry.username.clone()),
            Some(_) => {
                tokens.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.lock().unwrap().remove(token);
    }
}

fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| {
            let idx: u8 = rng.gen_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn test_issue_and_lookup() {
        let store = TokenStore::new(3600);
        let now = ts("2024-01-12T08:00:00Z");
        let token = store.issue("alice", now);
        assert_eq!(token.len(), TOKEN_LEN);
        assert_eq!(store.lookup(&token, now), Some("alice".to_string()));
    }

    #[test]
    fn test_expiry_uses_injected_clock() {
        let store = TokenStore::new(3600);
        let issued = ts("2024-01-12T08:00:00Z");
        let token = store.issue("alice", issued);
        let before = ts("2024-01-12T08:59:59Z");
        assert!(store.lookup(&token, before).is_some());
        let after = ts("2024-01-12T09:00:00Z");
        assert!(store.lookup(&token, after).is_none());
        // Evicted: rewinding the clock does not resurrect it.
        assert!(store.lookup(&token, before).is_none());
    }

    #[test]
    fn test_revoke() {
        let store = TokenStore::new(3600);
        let now = ts("2024-01-12T08:00:00Z");
        let token = store.issue("alice", now);
        store.revoke(&token);
        assert!(store.lookup(&token, now).is_none());
    }

    #[test]
    fn test_unknown_token() {
        let store = TokenStore::new(3600);
        assert!(store.lookup("nope", ts("2024-01-12T08:00:00Z")).is_none());
    }
}
