// File: rusty-constraints-core/src/fields_store.rs
// Purpose: Form-wide registry of fields, keyed by input name

use rusty_constraints_events::{EmitterError, SyncEmitter, SyncListener};
use std::sync::{Arc, Mutex};

use crate::field::{Field, FieldValidation};
use crate::input::InputSnapshot;
use crate::key::FeedbackKey;
use crate::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldsStoreEvent {
    Added,
    Removed,
}

/// Listener receiving the name of the added or removed field
pub type FieldsStoreListener = SyncListener<String, ()>;

#[derive(Debug)]
struct Entry {
    field: Field,
    registrations: usize,
}

/// Insertion-ordered map from input name to [`Field`]
///
/// Several rule groups may target the same input; they share one entry, which
/// lives until the last of them releases it.
#[derive(Debug, Default)]
pub struct FieldsStore {
    entries: Mutex<Vec<Entry>>,
    events: SyncEmitter<FieldsStoreEvent, String>,
}

impl FieldsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a field, creating it on first registration
    pub fn add_field(&self, name: &str) {
        let added = {
            let mut entries = lock(&self.entries);
            match entries.iter_mut().find(|e| e.field.name() == name) {
                Some(entry) => {
                    entry.registrations += 1;
                    false
                }
                None => {
                    entries.push(Entry {
                        field: Field::new(name),
                        registrations: 1,
                    });
                    true
                }
            }
        };

        if added {
            tracing::debug!("Field '{}' added", name);
            self.events.emit_sync(&FieldsStoreEvent::Added, &name.to_string());
        }
    }

    /// Release one registration; the field goes away with the last one
    ///
    /// Unknown names are ignored.
    pub fn remove_field(&self, name: &str) {
        let removed = {
            let mut entries = lock(&self.entries);
            match entries.iter().position(|e| e.field.name() == name) {
                Some(index) if entries[index].registrations > 1 => {
                    entries[index].registrations -= 1;
                    false
                }
                Some(index) => {
                    entries.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            tracing::debug!("Field '{}' removed", name);
            self.events.emit_sync(&FieldsStoreEvent::Removed, &name.to_string());
        }
    }

    /// Snapshot of a field; `None` means no rule group targets that input
    pub fn get_field(&self, name: &str) -> Option<Field> {
        self.read(name, Field::clone)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read(name, |_| ()).is_some()
    }

    /// Snapshots of every field, first registered first
    pub fn fields(&self) -> Vec<Field> {
        lock(&self.entries).iter().map(|e| e.field.clone()).collect()
    }

    pub fn field_names(&self) -> Vec<String> {
        lock(&self.entries)
            .iter()
            .map(|e| e.field.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn read<R>(&self, name: &str, f: impl FnOnce(&Field) -> R) -> Option<R> {
        lock(&self.entries)
            .iter()
            .find(|e| e.field.name() == name)
            .map(|e| f(&e.field))
    }

    fn update<R>(&self, name: &str, f: impl FnOnce(&mut Field) -> R) -> Option<R> {
        lock(&self.entries)
            .iter_mut()
            .find(|e| e.field.name() == name)
            .map(|e| f(&mut e.field))
    }

    /// Record an outcome; returns false when the field is unknown
    pub fn add_or_replace_validation(&self, name: &str, validation: FieldValidation) -> bool {
        self.update(name, |field| field.add_or_replace_validation(validation))
            .is_some()
    }

    pub fn clear_validations(&self, name: &str) -> Option<Field> {
        self.update(name, |field| {
            field.clear_validations();
            field.clone()
        })
    }

    /// Drop the outcomes recorded under `keys`; returns false when the field is unknown
    pub(crate) fn remove_validations(&self, name: &str, keys: &[FeedbackKey]) -> bool {
        self.update(name, |field| {
            for key in keys {
                field.remove_validation(key);
            }
        })
        .is_some()
    }

    /// Clear outcomes ahead of a validation pass and remember the input it runs on
    pub(crate) fn begin_validation(&self, input: &InputSnapshot) -> Option<Field> {
        self.update(&input.name, |field| {
            field.clear_validations();
            field.set_element(input.clone());
            field.clone()
        })
    }

    /// All fields valid; fields never validated count as valid
    pub fn is_valid(&self) -> bool {
        lock(&self.entries).iter().all(|e| e.field.is_valid())
    }

    pub fn has_feedbacks(&self) -> bool {
        lock(&self.entries)
            .iter()
            .any(|e| e.field.has_feedbacks(None))
    }

    pub fn on(
        &self,
        event: FieldsStoreEvent,
        listener: Arc<FieldsStoreListener>,
    ) -> Result<(), EmitterError> {
        self.events.add_listener(event, listener)
    }

    pub fn off(
        &self,
        event: FieldsStoreEvent,
        listener: &Arc<FieldsStoreListener>,
    ) -> Result<(), EmitterError> {
        self.events.remove_listener(&event, listener)
    }
}
