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

use std::path::Path;
use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;
use crate::error::fail;
use crate::server::serve;
use crate::stats::LocalZone;
use crate::stats::build_report;
use crate::types::timestamp::Timestamp;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Run the API server.
    Serve {
        /// Path to the configuration file.
        config: Option<String>,
    },
    /// Print study statistics as JSON and exit.
    Stats {
        /// Path to the configuration file.
        config: Option<String>,
        /// Timezone offset in minutes west of UTC.
        #[arg(long, default_value_t = 0)]
        timezone_offset: i32,
    },
}

const DEFAULT_CONFIG_PATH: &str = "studytrack.toml";

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve { config } => {
            let config = load_config(config)?;
            serve(config).await
        }
        Command::Stats {
            config,
            timezone_offset,
        } => {
            let config = load_config(config)?;
            let db = Database::new(&config.database)?;
            let zone = LocalZone::from_minutes_west(timezone_offset);
            let report = build_report(&db.all_sessions()?, Timestamp::now(), &zone);
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
            Ok(())
        }
    }
}

fn load_config(path: Option<String>) -> Fallible<Config> {
    let path: PathBuf = match path {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(DEFAULT_CONFIG_PATH),
    };
    if path.exists() {
        Config::load(&path)
    } else if path == Path::new(DEFAULT_CONFIG_PATH) {
        // No config anywhere: run on defaults.
        Config::parse("")
    } else {
        fail(format!("config file does not exist: {}", path.display()))
    }
}
