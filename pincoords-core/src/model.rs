use anyhow::{Context, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::HashMap, fs, path::Path};

/// A `[latitude, longitude]` pair. Serializes as a two-element JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateEntry(pub f64, pub f64);

impl CoordinateEntry {
    pub fn lat(&self) -> f64 {
        self.0
    }

    pub fn lon(&self) -> f64 {
        self.1
    }
}

/// One row of the checklist dataset. Only the pincode matters for
/// resolution; the remaining fields (name, post office, district, ...) are
/// left to the consumer of the checklist file.
#[derive(Debug, Clone, Deserialize)]
pub struct ChecklistItem {
    #[serde(deserialize_with = "pincode_as_string")]
    pub pincode: String,
}

/// Checklists store pincodes either as strings or as bare numbers. Numbers
/// are stringified as written, never truncated or reformatted.
fn pincode_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// One fallback substitution, as persisted to `not_found.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub pincode: String,
    pub reason: String,
    pub lat: f64,
    pub lon: f64,
}

/// Pincode -> coordinates, ordered by first appearance in the checklist.
///
/// Re-inserting an existing pincode overwrites its value in place without
/// moving the key.
#[derive(Debug, Clone, Default)]
pub struct CoordsMap {
    order: Vec<String>,
    entries: HashMap<String, CoordinateEntry>,
}

impl CoordsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pincode: String, coords: CoordinateEntry) {
        if !self.entries.contains_key(&pincode) {
            self.order.push(pincode.clone());
        }
        self.entries.insert(pincode, coords);
    }

    pub fn get(&self, pincode: &str) -> Option<CoordinateEntry> {
        self.entries.get(pincode).copied()
    }

    pub fn contains(&self, pincode: &str) -> bool {
        self.entries.contains_key(pincode)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, CoordinateEntry)> + '_ {
        self.order.iter().map(|pincode| (pincode.as_str(), self.entries[pincode]))
    }
}

impl Serialize for CoordsMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (pincode, coords) in self.iter() {
            map.serialize_entry(pincode, &coords)?;
        }
        map.end()
    }
}

/// Load the checklist JSON array. A missing or unparsable checklist file is
/// fatal.
pub fn load_checklist(path: &Path) -> Result<Vec<ChecklistItem>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read checklist file: {}", path.display()))?;

    let items: Vec<ChecklistItem> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse checklist JSON: {}", path.display()))?;

    Ok(items)
}
