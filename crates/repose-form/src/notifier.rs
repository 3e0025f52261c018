use smallvec::SmallVec;

use crate::value::{FieldChange, FieldValue, FormValues};

/// One `set_value` call, paired with the value bag as it stood right after it.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeRecord {
    pub change: FieldChange,
    pub values: FormValues,
}

pub type PendingChanges = SmallVec<[ChangeRecord; 4]>;

/// A closed batch: the staged values after the last call, and every call in
/// order.
#[derive(Debug)]
pub struct Batch {
    pub values: FormValues,
    pub records: PendingChanges,
}

impl Batch {
    /// Names written by the batch, first write first, without repeats.
    pub fn touched_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let name = record.change.name.as_str();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Keeps per-call granularity for synchronous `set_value` bursts.
///
/// The notifier stages its own copy of the values from the first call of a
/// batch, so each record's snapshot is correct even when the underlying store
/// coalesces or delays writes.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    staged: Option<FormValues>,
    pending: PendingChanges,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one write. `base` is read only when the call opens a batch.
    /// Returns `true` in that case, so the caller can schedule the flush.
    pub fn record(
        &mut self,
        base: impl FnOnce() -> FormValues,
        name: &str,
        value: FieldValue,
    ) -> bool {
        let opened = self.staged.is_none();
        let staged = self.staged.get_or_insert_with(base);
        staged.set(name, value.clone());
        self.pending.push(ChangeRecord {
            change: FieldChange::new(name, value),
            values: staged.clone(),
        });
        opened
    }

    pub fn is_pending(&self) -> bool {
        self.staged.is_some()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The values including every write of the open batch, if any.
    pub fn staged(&self) -> Option<&FormValues> {
        self.staged.as_ref()
    }

    pub fn take_batch(&mut self) -> Option<Batch> {
        let values = self.staged.take()?;
        Some(Batch {
            values,
            records: std::mem::take(&mut self.pending),
        })
    }
}
