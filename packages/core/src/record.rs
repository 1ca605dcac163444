//! The Record type - bins plus bookkeeping metadata.

use crate::{Bins, Value};

/// Generation and expiration bookkeeping for one record.
///
/// `generation` starts at 1 on first write and is incremented by every
/// mutation (including `touch`). `expiration` is the store's expiry
/// timestamp in seconds; 0 means the record never expires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RecordMetadata {
    pub generation: u32,
    pub expiration: u32,
}

/// A stored record as returned by a store client.
///
/// User code never builds these directly; the codec layer turns them into
/// domain values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    pub bins: Bins,
    pub metadata: RecordMetadata,
}

impl Record {
    // === Construction ===

    pub fn new(bins: Bins, metadata: RecordMetadata) -> Self {
        Self { bins, metadata }
    }

    // === Inspection ===

    /// Look up a single bin.
    pub fn bin(&self, name: &str) -> Option<&Value> {
        self.bins.get(name)
    }

    pub fn generation(&self) -> u32 {
        self.metadata.generation
    }

    // === Conversion ===

    /// Take the bins, dropping metadata.
    pub fn into_bins(self) -> Bins {
        self.bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    #[test]
    fn bin_lookup() {
        let record = Record::new(
            btree! { "id".to_string() => Value::from("a") },
            RecordMetadata {
                generation: 3,
                expiration: 0,
            },
        );
        assert_eq!(record.bin("id"), Some(&Value::from("a")));
        assert_eq!(record.bin("missing"), None);
        assert_eq!(record.generation(), 3);
        assert_eq!(record.into_bins().len(), 1);
    }
}
