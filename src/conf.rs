//! Settings controlling labelling and pruning of the ClinVar records.

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};

/// Labelling, filtering and pruning rules.
///
/// The defaults build the "conflicting interpretations" training set; any
/// subset of the fields can be overridden from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Attribute whose presence sets the label to 1.
    pub label_key: String,
    /// Attribute holding the review status.
    pub review_status_key: String,
    /// Review status values that are kept; all other records are dropped.
    pub accepted_review_statuses: Vec<String>,
    /// Numeric attributes that default to `0` when absent.
    pub zero_fill_keys: Vec<String>,
    /// Attributes removed after labelling.
    pub dropped_keys: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let strings = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            label_key: String::from("CLNSIGCONF"),
            review_status_key: String::from("CLNREVSTAT"),
            accepted_review_statuses: strings(&[
                "criteria_provided,_multiple_submitters,_no_conflicts",
                "criteria_provided,_conflicting_interpretations",
            ]),
            zero_fill_keys: strings(&["AF_ESP", "AF_EXAC", "AF_TGP"]),
            dropped_keys: strings(&[
                // size reduction
                "ALLELEID",
                "RS",
                "DBVARID",
                // reveal the label
                "CLNSIG",
                "CLNSIGCONF",
                "CLNREVSTAT",
                // redundant
                "CLNVCSO",
                "GENEINFO",
            ]),
        }
    }
}

impl Settings {
    /// Load settings from the TOML file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let toml_str = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("could not read {:?}: {}", path.as_ref(), e))?;
        toml::from_str(&toml_str)
            .map_err(|e| anyhow::anyhow!("could not parse {:?}: {}", path.as_ref(), e))
    }

    /// Attributes that must not appear in the output: the label attribute
    /// and everything in `dropped_keys`.
    pub fn removed_keys(&self) -> HashSet<&str> {
        std::iter::once(self.label_key.as_str())
            .chain(self.dropped_keys.iter().map(String::as_str))
            .collect()
    }

    /// Load from `path` if given, use the defaults otherwise.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, anyhow::Error> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }
}
