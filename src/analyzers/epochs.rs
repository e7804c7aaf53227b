//! Epoch downsampling for bounded-cost analysis of long training runs.

use serde::Serialize;

use crate::analyzers::types::Record;

/// Default cap on the number of stepped epochs in a selection.
pub const DEFAULT_EPOCH_CAP: usize = 100;

/// An ordered, downsampled subset of the epochs present in a table.
///
/// The maximum epoch is always a member, regardless of the stepping, so the
/// most recent snapshot is never dropped by downsampling.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EpochSelection {
    /// Selected epochs, ascending, deduplicated.
    pub selected: Vec<u32>,
    /// Maximum epoch present in the table; 0 for an empty table.
    pub max_epoch: u32,
}

impl EpochSelection {
    pub fn contains(&self, epoch: u32) -> bool {
        self.selected.binary_search(&epoch).is_ok()
    }
}

/// Selects every `step`-th distinct epoch, where
/// `step = max(1, floor(distinct / cap))`, plus the maximum epoch
/// unconditionally.
///
/// When the number of distinct epochs is at most `cap`, the selection is the
/// full distinct set: no information is lost below the cap.
pub fn select_epochs(records: &[Record], cap: usize) -> EpochSelection {
    let mut epochs: Vec<u32> = records.iter().map(|r| r.epoch).collect();
    epochs.sort_unstable();
    epochs.dedup();

    let Some(&max_epoch) = epochs.last() else {
        return EpochSelection::default();
    };

    let step = (epochs.len() / cap.max(1)).max(1);

    let mut selected: Vec<u32> = epochs.iter().copied().step_by(step).collect();
    if selected.last() != Some(&max_epoch) {
        selected.push(max_epoch);
    }

    EpochSelection { selected, max_epoch }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_at(epoch: u32) -> Record {
        Record {
            area: "E14000530".to_string(),
            metric: "household_count".to_string(),
            estimate: 1.0,
            target: 1.0,
            error: 0.0,
            abs_error: 0.0,
            rel_abs_error: 0.0,
            validated: true,
            epoch,
        }
    }

    #[test]
    fn test_empty_table() {
        let sel = select_epochs(&[], DEFAULT_EPOCH_CAP);
        assert_eq!(sel.max_epoch, 0);
        assert!(sel.selected.is_empty());
    }

    #[test]
    fn test_below_cap_keeps_everything() {
        let records: Vec<Record> = (0..50).map(record_at).collect();
        let sel = select_epochs(&records, DEFAULT_EPOCH_CAP);

        assert_eq!(sel.selected, (0..50).collect::<Vec<u32>>());
        assert_eq!(sel.max_epoch, 49);
    }

    #[test]
    fn test_duplicate_epochs_collapse() {
        let records = vec![record_at(3), record_at(3), record_at(7), record_at(7)];
        let sel = select_epochs(&records, DEFAULT_EPOCH_CAP);

        assert_eq!(sel.selected, vec![3, 7]);
        assert_eq!(sel.max_epoch, 7);
    }

    #[test]
    fn test_250_epochs_cap_100() {
        // 250 distinct epochs, cap 100: step 2 picks 1, 3, ..., 249 and the
        // maximum 250 is forced in, for 126 total.
        let records: Vec<Record> = (1..=250).map(record_at).collect();
        let sel = select_epochs(&records, 100);

        assert_eq!(sel.selected.len(), 126);
        assert_eq!(sel.selected[0], 1);
        assert_eq!(sel.selected[1], 3);
        assert_eq!(sel.selected[124], 249);
        assert_eq!(*sel.selected.last().unwrap(), 250);
        assert!(sel.contains(250));
    }

    #[test]
    fn test_max_epoch_always_selected() {
        for n in [1u32, 17, 99, 100, 101, 250, 1000] {
            let records: Vec<Record> = (0..n).map(record_at).collect();
            let sel = select_epochs(&records, DEFAULT_EPOCH_CAP);
            assert!(sel.contains(n - 1), "max epoch missing for n={n}");
        }
    }

    #[test]
    fn test_selection_is_sorted_and_unique() {
        let records: Vec<Record> = (0..731).map(record_at).collect();
        let sel = select_epochs(&records, DEFAULT_EPOCH_CAP);
        assert!(sel.selected.windows(2).all(|w| w[0] < w[1]));
    }
}
