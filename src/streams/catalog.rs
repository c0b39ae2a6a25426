//! Ordered stream catalog

use super::pinterest;
use super::spec::StreamSpec;
use crate::error::{Error, Result};
use std::collections::HashSet;

/// The set of streams a run can extract, in declared order
#[derive(Debug, Clone)]
pub struct Catalog {
    streams: Vec<StreamSpec>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::pinterest()
    }
}

impl Catalog {
    /// Build a catalog, checking parent links
    ///
    /// Parents must be declared before their children, which also rules out
    /// cycles.
    pub fn new(streams: Vec<StreamSpec>) -> Result<Self> {
        let mut seen = HashSet::new();

        for stream in &streams {
            if let Some(parent) = &stream.parent {
                if !seen.contains(parent.as_str()) {
                    return Err(Error::config(format!(
                        "Stream '{}' references parent '{parent}' which is not declared before it",
                        stream.name
                    )));
                }
            }
            if !seen.insert(stream.name.as_str()) {
                return Err(Error::config(format!(
                    "Stream '{}' is declared twice",
                    stream.name
                )));
            }
        }

        Ok(Self { streams })
    }

    /// The Pinterest Ads catalog
    pub fn pinterest() -> Self {
        Self {
            streams: pinterest::all(),
        }
    }

    /// Look up a stream by name
    pub fn get(&self, name: &str) -> Result<&StreamSpec> {
        self.streams
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::StreamNotFound {
                stream: name.to_string(),
            })
    }

    /// All streams in declared order
    pub fn streams(&self) -> &[StreamSpec] {
        &self.streams
    }

    /// Stream names in declared order
    pub fn names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.name.as_str()).collect()
    }

    /// Ancestors of a stream, nearest first
    pub fn ancestors(&self, name: &str) -> Result<Vec<&StreamSpec>> {
        let mut chain = Vec::new();
        let mut current = self.get(name)?;

        while let Some(parent) = &current.parent {
            current = self.get(parent)?;
            chain.push(current);
        }

        Ok(chain)
    }

    /// Resolve a stream selection, keeping declared order
    ///
    /// An empty selection selects every stream.
    pub fn select(&self, names: &[String]) -> Result<Vec<&StreamSpec>> {
        if names.is_empty() {
            return Ok(self.streams.iter().collect());
        }

        for name in names {
            self.get(name)?;
        }

        Ok(self
            .streams
            .iter()
            .filter(|s| names.iter().any(|n| *n == s.name))
            .collect())
    }
}
