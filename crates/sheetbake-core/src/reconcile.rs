//! Table reconciliation across rebuilds
//!
//! A run snapshots everything the database tracked before, clears the
//! bookkeeping, and marks each kind it revisits. Whatever was not
//! revisited ends up redundant: flagged, kept on disk, left for an
//! external cleanup decision.

use crate::error::{Error, Result};
use crate::table::{DatabaseAsset, TableRef};
use std::collections::{BTreeMap, BTreeSet};

/// Tracks candidate-for-redundancy tables during one rebuild.
///
/// Owns its state exclusively for the run: begin with a database
/// snapshot, visit every table the run recreates, and finish to obtain
/// the new redundant set.
#[derive(Debug)]
pub struct Reconciler {
    candidates: BTreeMap<String, TableRef>,
    visited: BTreeSet<String>,
}

impl Reconciler {
    /// Snapshot the database's tracked references and clear its
    /// bookkeeping. Underlying table assets are not touched.
    pub fn begin(database: &mut DatabaseAsset) -> Self {
        let candidates = database
            .all_refs()
            .map(|r| (r.kind.clone(), r.clone()))
            .collect();
        database.clear();

        Self {
            candidates,
            visited: BTreeSet::new(),
        }
    }

    /// Mark a table kind as recreated in this run, removing it from the
    /// redundancy candidates.
    ///
    /// Visiting the same kind twice means two sheets resolved to one
    /// table identity; that is ambiguous and fails loudly.
    pub fn visit(&mut self, table: &TableRef) -> Result<()> {
        if !self.visited.insert(table.kind.clone()) {
            return Err(Error::InvariantViolation(format!(
                "table kind '{}' visited twice in one run",
                table.kind
            )));
        }
        self.candidates.remove(&table.kind);
        Ok(())
    }

    /// Finish the run: everything never visited becomes redundant
    pub fn finish(self) -> Vec<TableRef> {
        self.candidates.into_values().collect()
    }
}
