use serde::{Deserialize, Serialize};

use super::codec::{format_offset, parse_offset};

/// Seed offset used when the target list is restored to defaults.
pub const DEFAULT_TARGET: u64 = 0x1d2_36e8;

/// Ordered list of hook targets, unique by value.
///
/// Insertion order is kept so the list reads back the way it was entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetList {
    offsets: Vec<u64>,
}

impl TargetList {
    pub fn new() -> Self {
        Self::default()
    }

    /// List holding only the given seed offset.
    pub fn seeded(seed: u64) -> Self {
        Self {
            offsets: vec![seed],
        }
    }

    /// Build a list from raw text rows, dropping invalid rows and repeats.
    pub fn from_texts<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for input in inputs {
            list.add_text(input.as_ref());
        }
        list
    }

    /// Add an offset. Returns `false` if it was already present.
    pub fn add(&mut self, offset: u64) -> bool {
        if self.contains(offset) {
            return false;
        }
        self.offsets.push(offset);
        true
    }

    /// Parse and add a text row. `None` if the text is not an offset.
    pub fn add_text(&mut self, text: &str) -> Option<bool> {
        parse_offset(text).map(|offset| self.add(offset))
    }

    pub fn remove(&mut self, offset: u64) -> bool {
        match self.offsets.iter().position(|&o| o == offset) {
            Some(index) => {
                self.offsets.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace the row at `index` with the parsed text.
    ///
    /// Rejected when the index is out of range, the text does not parse,
    /// or the value already sits in another row.
    pub fn edit(&mut self, index: usize, text: &str) -> bool {
        let Some(offset) = parse_offset(text) else {
            return false;
        };
        if index >= self.offsets.len() {
            return false;
        }
        if self
            .offsets
            .iter()
            .enumerate()
            .any(|(i, &o)| i != index && o == offset)
        {
            return false;
        }
        self.offsets[index] = offset;
        true
    }

    /// Replace the whole list, keeping first occurrences only.
    pub fn replace_all<I: IntoIterator<Item = u64>>(&mut self, offsets: I) {
        self.offsets.clear();
        for offset in offsets {
            self.add(offset);
        }
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
    }

    pub fn contains(&self, offset: u64) -> bool {
        self.offsets.contains(&offset)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.offsets.iter().copied()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.offsets
    }

    /// Canonical text of every row, in order.
    pub fn formatted(&self) -> Vec<String> {
        self.offsets.iter().map(|&o| format_offset(o)).collect()
    }
}

impl FromIterator<u64> for TargetList {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut list = Self::new();
        list.replace_all(iter);
        list
    }
}
