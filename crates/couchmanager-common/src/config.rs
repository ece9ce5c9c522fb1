// Copyright 2026 couchmanager contributors
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

//! Configuration loading with TOML + environment variables
//!
//! Priority (highest to lowest):
//! 1. Legacy variables (COUCHDB_URL, COUCHDB_DATABASE, COUCHDB_USER, COUCHDB_PASSWORD)
//! 2. Environment variables (e.g., COUCHMANAGER__COUCHDB__SERVER_URL=http://db:5984)
//! 3. config.toml
//! 4. Built-in defaults

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

// --- Constants for Default Configuration ---
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5984";
pub const DEFAULT_DATABASE: &str = "testing";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDbConfig {
    pub server_url: String,
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for CouchDbConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            database: DEFAULT_DATABASE.into(),
            username: None,
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub couchdb: CouchDbConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Self::defaults()?
            // File: config.toml
            .add_source(File::with_name("config").required(false))

            // Environment: COUCHMANAGER__COUCHDB__DATABASE=prod -> couchdb.database=prod
            .add_source(Environment::with_prefix("COUCHMANAGER").separator("__"))

            // Legacy ENV overrides
            .set_override_option("couchdb.server_url", env::var("COUCHDB_URL").ok())?
            .set_override_option("couchdb.database", env::var("COUCHDB_DATABASE").ok())?
            .set_override_option("couchdb.username", env::var("COUCHDB_USER").ok())?
            .set_override_option("couchdb.password", env::var("COUCHDB_PASSWORD").ok())?

            .build()?;

        s.try_deserialize()
    }

    /// Builder pre-populated with the built-in defaults, before any file or
    /// environment source is layered on.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("couchdb.server_url", DEFAULT_SERVER_URL)?
            .set_default("couchdb.database", DEFAULT_DATABASE)?
            .set_default("couchdb.timeout_secs", DEFAULT_TIMEOUT_SECS)
    }
}

impl CouchDbConfig {
    /// Basic-auth pair, present only when a username is configured.
    pub fn credentials(&self) -> Option<(&str, Option<&str>)> {
        self.username
            .as_deref()
            .map(|user| (user, self.password.as_deref()))
    }
}
