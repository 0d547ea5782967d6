//! Recently generated requests, most recent first.

use serde::{Deserialize, Serialize};

use super::DiariaRecord;

/// Maximum number of snapshots kept in the history.
pub const HISTORY_CAPACITY: usize = 10;

/// Label shown in the picker for entries without a servant name.
const UNNAMED_ENTRY: &str = "No name";

/// Bounded list of full record snapshots. Index 0 is the newest entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct History {
    entries: Vec<DiariaRecord>,
}

impl History {
    /// Build a history from stored entries, dropping anything past capacity.
    pub fn from_entries(mut entries: Vec<DiariaRecord>) -> Self {
        entries.truncate(HISTORY_CAPACITY);
        Self { entries }
    }

    /// Insert a snapshot at the front and evict the oldest past capacity.
    pub fn push(&mut self, record: DiariaRecord) {
        self.entries.insert(0, record);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    /// Keep a snapshot of a record whose document was just generated.
    ///
    /// Records without a servant name or departure date are skipped.
    /// Returns whether the snapshot was kept.
    pub fn record_generated(&mut self, record: &DiariaRecord) -> bool {
        if !record.is_history_worthy() {
            return false;
        }
        self.push(record.clone());
        true
    }

    pub fn get(&self, index: usize) -> Option<&DiariaRecord> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summaries(&self) -> Vec<HistoryEntrySummary> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, record)| HistoryEntrySummary::new(index, record))
            .collect()
    }
}

/// Picker row for a history entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntrySummary {
    pub index: usize,
    pub name: String,
    pub departure_date: String,
}

impl HistoryEntrySummary {
    fn new(index: usize, record: &DiariaRecord) -> Self {
        let name = if record.servant.name.is_empty() {
            UNNAMED_ENTRY.to_string()
        } else {
            record.servant.name.clone()
        };
        Self {
            index,
            name,
            departure_date: record.trip.departure_date.clone(),
        }
    }
}
