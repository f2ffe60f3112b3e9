// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Library configuration loaded from TOML.
//!
//! Every section and field is optional; missing values take the documented
//! defaults.
//!
//! ```toml
//! [loans]
//! grace_period_days = 14
//! daily_fine = "5"          # decimal, quoted
//!
//! [logging]
//! filter = "library_loans=info"
//! format = "compact"        # or "json"
//!
//! [journal]
//! capacity = 1024           # 0 disables the loan journal
//! ```

use crate::policy::LoanPolicy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Events kept by the loan journal before the oldest are dropped.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 1024;

/// Largest accepted daily fine.
pub const MAX_DAILY_FINE: Decimal = dec!(1000000);

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Grace period and fine rate.
    pub loans: LoanPolicy,
    pub logging: LoggingConfig,
    pub journal: JournalConfig,
}

/// Retention of undrained loan events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Maximum events held; the oldest are dropped first. `0` disables it.
    pub capacity: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_JOURNAL_CAPACITY,
        }
    }
}

/// Log output settings for binaries. `RUST_LOG` takes precedence over `filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "library_loans=info".to_owned(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LibraryConfig {
    /// Reads, parses, and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: LibraryConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks business parameters.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if the grace period is zero or the daily fine
    /// is negative or above [`MAX_DAILY_FINE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loans.grace_period_days == 0 {
            return Err(ConfigError::Invalid {
                field: "loans.grace_period_days",
                message: "must be at least 1 day".to_owned(),
            });
        }
        if self.loans.daily_fine < Decimal::ZERO {
            return Err(ConfigError::Invalid {
                field: "loans.daily_fine",
                message: format!("must not be negative, got {}", self.loans.daily_fine),
            });
        }
        if self.loans.daily_fine > MAX_DAILY_FINE {
            return Err(ConfigError::Invalid {
                field: "loans.daily_fine",
                message: format!(
                    "must not exceed {MAX_DAILY_FINE}, got {}",
                    self.loans.daily_fine
                ),
            });
        }
        Ok(())
    }
}
