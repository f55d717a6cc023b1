//! Pairing configuration: the file named by the second command-line argument.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::{Error, Result};

pub const CURVE_NAME: &str = "bls12-381";
pub const DEFAULT_BLOCK_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the pairing-friendly curve. Only BLS12-381 is supported.
    pub curve: String,
    /// Size in bytes of one file block.
    pub block_size: usize,
    /// Directory that receives every file a command produces.
    pub output_dir: PathBuf,
    /// Maximum level emitted by the log subscriber.
    pub log_level: String,
    /// Print the verification outcome as a bare `1`/`0`.
    pub plain_result: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            curve: CURVE_NAME.to_owned(),
            block_size: DEFAULT_BLOCK_SIZE,
            output_dir: PathBuf::from("."),
            log_level: "info".to_owned(),
            plain_result: false,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.curve.eq_ignore_ascii_case(CURVE_NAME) {
            return Err(Error::Config(format!(
                "unsupported curve {:?}, expected {CURVE_NAME}",
                self.curve
            )));
        }
        if self.block_size == 0 {
            return Err(Error::Config("block_size must be positive".into()));
        }
        self.level()?;
        Ok(())
    }

    pub fn level(&self) -> Result<Level> {
        self.log_level
            .parse()
            .map_err(|_| Error::Config(format!("unknown log level {:?}", self.log_level)))
    }

    // Resolve a produced file name against the output directory.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_override() {
        let config = Config::from_json(r#"{"block_size": 4096, "plain_result": true}"#).unwrap();
        assert_eq!(config.block_size, 4096);
        assert!(config.plain_result);
        assert_eq!(config.curve, CURVE_NAME);
    }

    #[test]
    fn rejects_bad_values() {
        for raw in [
            r#"{"curve": "bn254"}"#,
            r#"{"block_size": 0}"#,
            r#"{"log_level": "loud"}"#,
            r#"{"blocksize": 10}"#,
            "not json",
        ] {
            assert!(matches!(Config::from_json(raw), Err(Error::Config(_))), "{raw}");
        }
    }
}
