// Copyright 2025 itscheems
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

use serde::{Deserialize, Serialize};

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Component name, used as the log directory and file prefix
pub const LOG_COMPONENT_NAME: &str = "memclob";

/// Whether logs are mirrored to stderr when `LOG_TO_CONSOLE` is unset
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

/// Memclob configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemClobConfig {
	/// Produce offchain updates for downstream indexers
	pub generate_offchain_updates: bool,
	/// Log every match at debug level
	pub verbose_logging: bool,
	/// Longest operation list `clear_and_replay` accepts
	pub max_replay_operations: usize,
}

impl Default for MemClobConfig {
	fn default() -> Self {
		Self {
			generate_offchain_updates: true,
			verbose_logging: false,
			max_replay_operations: 1_000_000,
		}
	}
}

impl MemClobConfig {
	/// Load configuration from environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::Environment::with_prefix("MEMCLOB"))
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::File::with_name(path))
			.add_source(config::Environment::with_prefix("MEMCLOB"))
			.build()?;

		cfg.try_deserialize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_default_config() {
		let config = MemClobConfig::default();
		assert!(config.generate_offchain_updates);
		assert!(!config.verbose_logging);
		assert_eq!(config.max_replay_operations, 1_000_000);
	}

	#[test]
	fn test_from_file_fills_missing_fields_with_defaults() {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(file, "verbose_logging = true").unwrap();
		writeln!(file, "max_replay_operations = 10").unwrap();

		let path = file.path().to_str().unwrap();
		let config = MemClobConfig::from_file(path).unwrap();
		assert!(config.verbose_logging);
		assert!(config.generate_offchain_updates);
		assert_eq!(config.max_replay_operations, 10);
	}
}
