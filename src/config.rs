use std::{fs::File, io::BufReader, path::Path, time::Duration};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, InternalResult};

/// Settings for a solving run. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Wall-clock budget for a whole batch.
    #[serde(default = "default_batch_time_limit", with = "duration_ms")]
    pub batch_time_limit: Duration,

    /// Budget for a single statement, parse included.
    #[serde(default = "default_statement_timeout", with = "duration_ms")]
    pub statement_timeout: Duration,

    /// Answer submitted for a statement that failed or timed out.
    #[serde(default)]
    pub default_answer: Decimal,

    /// Share entity lookups across statements through an [`crate::source::EntityCache`].
    #[serde(default = "default_true")]
    pub cache_lookups: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            batch_time_limit: default_batch_time_limit(),
            statement_timeout: default_statement_timeout(),
            default_answer: Decimal::ZERO,
            cache_lookups: default_true(),
        }
    }
}

impl SolverConfig {
    // JSONファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> InternalResult<Self> {
        let file = File::open(path)
            .map_err(|e| Error::Config(format!("Failed to open config file: {}", e)))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn from_json_str(s: &str) -> InternalResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }
}

// デフォルト値の定義
fn default_batch_time_limit() -> Duration {
    Duration::from_secs(175)
}
fn default_statement_timeout() -> Duration {
    Duration::from_secs(30)
}
fn default_true() -> bool {
    true
}

// Duration型のシリアライズ/デシリアライズヘルパー
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
