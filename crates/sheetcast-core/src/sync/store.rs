//! Per-(owner, sheet) version histories shared by every connection.

use super::{History, Version};
use crate::document::{Sheet, Snapshot};
use crate::error::{Result, SheetcastError};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sheetcast_engine::engine::GridSize;
use std::sync::Arc;

/// Which history of a sheet an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// Snapshots published by the owner.
    Published,
    /// Changes pushed back by subscribers.
    Subscribed,
}

/// Publication state of a sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetState {
    Draft,
    /// Number of snapshots published so far.
    Published(usize),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SheetKey {
    owner: String,
    sheet: String,
}

impl SheetKey {
    fn new(owner: &str, sheet: &str) -> Self {
        SheetKey {
            owner: owner.to_string(),
            sheet: sheet.to_string(),
        }
    }
}

/// Server-side record of one sheet.
#[derive(Debug)]
pub struct SheetRecord {
    pub owner: String,
    pub name: String,
    pub size: GridSize,
    published: History,
    subscribed: History,
}

impl SheetRecord {
    fn new(owner: &str, name: &str, size: GridSize) -> Self {
        SheetRecord {
            owner: owner.to_string(),
            name: name.to_string(),
            size,
            published: History::new(),
            subscribed: History::new(),
        }
    }

    pub fn history(&self, channel: Channel) -> &History {
        match channel {
            Channel::Published => &self.published,
            Channel::Subscribed => &self.subscribed,
        }
    }

    pub fn state(&self) -> SheetState {
        match self.published.len() {
            0 => SheetState::Draft,
            n => SheetState::Published(n),
        }
    }

    /// Evaluate a payload on a fresh grid of this sheet's size.
    fn snapshot_from_payload(&self, payload: &str) -> Result<Snapshot> {
        let mut sheet = Sheet::with_size(&self.name, self.size);
        sheet.replace_with_payload(payload)?;
        Ok(sheet.snapshot())
    }
}

/// Every sheet of every owner, each with independently locked histories.
#[derive(Debug, Default)]
pub struct VersionStore {
    sheets: DashMap<SheetKey, Arc<SheetRecord>>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_sheet(
        &self,
        owner: &str,
        name: &str,
        size: GridSize,
    ) -> Result<Arc<SheetRecord>> {
        if name.trim().is_empty() {
            return Err(SheetcastError::BlankSheetName);
        }
        match self.sheets.entry(SheetKey::new(owner, name)) {
            Entry::Occupied(_) => Err(SheetcastError::SheetExists(name.to_string())),
            Entry::Vacant(slot) => {
                let record = Arc::new(SheetRecord::new(owner, name, size));
                slot.insert(record.clone());
                tracing::info!(owner, sheet = name, "sheet created");
                Ok(record)
            }
        }
    }

    /// Drop a sheet and all of its versions.
    pub fn delete_sheet(&self, owner: &str, name: &str) -> Result<()> {
        if self.sheets.remove(&SheetKey::new(owner, name)).is_none() {
            return Err(SheetcastError::SheetNotFound(name.to_string()));
        }
        tracing::info!(owner, sheet = name, "sheet deleted");
        Ok(())
    }

    pub fn sheet(&self, owner: &str, name: &str) -> Result<Arc<SheetRecord>> {
        self.sheets
            .get(&SheetKey::new(owner, name))
            .map(|record| record.value().clone())
            .ok_or_else(|| SheetcastError::SheetNotFound(name.to_string()))
    }

    /// Names of an owner's sheets, sorted.
    pub fn sheet_names(&self, owner: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .sheets
            .iter()
            .filter(|entry| entry.key().owner == owner)
            .map(|entry| entry.key().sheet.clone())
            .collect();
        names.sort();
        names
    }

    /// Append an already-built snapshot to the published history.
    pub fn publish(&self, owner: &str, name: &str, snapshot: Snapshot) -> Result<Version> {
        let version = self.append(owner, name, None, Channel::Published, snapshot)?;
        tracing::info!(owner, sheet = name, id = version.id, "published");
        Ok(version)
    }

    /// Decode, evaluate and append a payload to one of a sheet's histories.
    pub fn append_payload(
        &self,
        owner: &str,
        name: &str,
        channel: Channel,
        payload: &str,
    ) -> Result<Version> {
        let record = self.sheet(owner, name)?;
        let snapshot = record.snapshot_from_payload(payload)?;
        let version = self.append(owner, name, Some(&record), channel, snapshot)?;
        tracing::info!(owner, sheet = name, ?channel, id = version.id, "version appended");
        tracing::trace!(payload, "appended payload");
        Ok(version)
    }

    /// Append while holding the map entry, so a concurrent `delete_sheet`
    /// either runs first (and the append fails) or waits for it.
    ///
    /// With `expected`, the entry must still be that record; a sheet deleted
    /// and re-created since the snapshot was built counts as not found.
    fn append(
        &self,
        owner: &str,
        name: &str,
        expected: Option<&Arc<SheetRecord>>,
        channel: Channel,
        snapshot: Snapshot,
    ) -> Result<Version> {
        let not_found = || SheetcastError::SheetNotFound(name.to_string());
        let entry = self.sheets.get(&SheetKey::new(owner, name)).ok_or_else(not_found)?;
        if expected.is_some_and(|record| !Arc::ptr_eq(record, entry.value())) {
            return Err(not_found());
        }
        Ok(entry.history(channel).append(snapshot))
    }

    /// Versions with `id >= from` from one of a sheet's histories.
    pub fn updates_since(
        &self,
        owner: &str,
        name: &str,
        channel: Channel,
        from: usize,
    ) -> Result<Vec<Version>> {
        Ok(self.sheet(owner, name)?.history(channel).since(from))
    }
}
