//! Validator set read from a TOML file.
//!
//! The file is re-read on every query, so governance tooling can rewrite it
//! out of band and the next distribution call picks the change up.
//!
//! ```toml
//! [[validators]]
//! mining_key = "0x00000000000000000000000000000000000000a1"
//!
//! [[validators]]
//! mining_key = "0x00000000000000000000000000000000000000a2"
//! payout_key = "0x00000000000000000000000000000000000000b2"
//! ```

use std::path::{Path, PathBuf};

use poa_types::Address;
use serde::{Deserialize, Serialize};

use crate::{Result, ValidatorKeyRegistry};

/// One validator entry in the set file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorEntry {
    pub mining_key: Address,
    /// Rewards go to the mining key when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_key: Option<Address>,
}

impl ValidatorEntry {
    pub fn payout_address(&self) -> Address {
        self.payout_key.unwrap_or(self.mining_key)
    }
}

/// Contents of a validator set file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    #[serde(default)]
    pub validators: Vec<ValidatorEntry>,
}

impl ValidatorSet {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Registry backed by a TOML validator set file.
#[derive(Clone, Debug)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current validator set from disk.
    pub fn load(&self) -> Result<ValidatorSet> {
        let content = std::fs::read_to_string(&self.path)?;
        let set = ValidatorSet::parse(&content)?;
        tracing::debug!(
            path = %self.path.display(),
            validators = set.validators.len(),
            "validator set loaded"
        );
        Ok(set)
    }
}

impl ValidatorKeyRegistry for FileRegistry {
    fn active_payout_addresses(&self) -> Result<Vec<Address>> {
        Ok(self
            .load()?
            .validators
            .iter()
            .map(ValidatorEntry::payout_address)
            .collect())
    }
}
