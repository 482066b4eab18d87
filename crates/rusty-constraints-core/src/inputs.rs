// File: rusty-constraints-core/src/inputs.rs
// Purpose: Where the form's inputs come from, and how callers point at them

use std::sync::Mutex;

use crate::html5::Html5Constraints;
use crate::input::{InputSnapshot, InputType};
use crate::lock;

/// The form's element tree, as seen by the coordinator
///
/// Every call returns fresh snapshots in document order.
pub trait InputSource: Send + Sync {
    fn inputs(&self) -> Vec<InputSnapshot>;
}

/// A fixed set of inputs
impl InputSource for Vec<InputSnapshot> {
    fn inputs(&self) -> Vec<InputSnapshot> {
        self.clone()
    }
}

/// What a validation or reset targets: an input by name, or a given snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Name(String),
    Input(InputSnapshot),
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::Name(name.to_string())
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::Name(name)
    }
}

impl From<InputSnapshot> for Selector {
    fn from(input: InputSnapshot) -> Self {
        Selector::Input(input)
    }
}

#[derive(Debug, Clone)]
struct InputElement {
    snapshot: InputSnapshot,
    constraints: Option<Html5Constraints>,
}

impl InputElement {
    fn refresh_validity(&mut self) {
        if let Some(constraints) = &self.constraints {
            let (validity, message) = constraints.check(self.snapshot.input_type, &self.snapshot.value);
            self.snapshot.validity = validity;
            self.snapshot.validation_message = message;
        }
    }
}

/// Mutable in-memory inputs, standing in for a live form
///
/// Inputs inserted with [`Html5Constraints`] get their validity recomputed on
/// every [`set_value`](Self::set_value).
#[derive(Debug, Default)]
pub struct FormInputs {
    elements: Mutex<Vec<InputElement>>,
}

impl FormInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input whose validity is managed by the caller
    pub fn insert(&self, snapshot: InputSnapshot) {
        lock(&self.elements).push(InputElement {
            snapshot,
            constraints: None,
        });
    }

    /// Add an empty input whose validity follows HTML5 constraint attributes
    pub fn insert_with_constraints(
        &self,
        name: impl Into<String>,
        input_type: InputType,
        constraints: Html5Constraints,
    ) {
        let mut element = InputElement {
            snapshot: InputSnapshot::new(name, "").with_type(input_type),
            constraints: Some(constraints),
        };
        element.refresh_validity();
        lock(&self.elements).push(element);
    }

    /// Change the value of every input named `name`
    ///
    /// Returns the updated snapshot of the first one, `None` when no input has
    /// that name.
    pub fn set_value(&self, name: &str, value: impl Into<String>) -> Option<InputSnapshot> {
        let value = value.into();
        let mut elements = lock(&self.elements);
        let mut first = None;

        for element in elements.iter_mut().filter(|e| e.snapshot.name == name) {
            element.snapshot.value = value.clone();
            element.refresh_validity();
            first.get_or_insert_with(|| element.snapshot.clone());
        }

        first
    }

    /// Current snapshot of the first input named `name`
    pub fn get(&self, name: &str) -> Option<InputSnapshot> {
        lock(&self.elements)
            .iter()
            .find(|e| e.snapshot.name == name)
            .map(|e| e.snapshot.clone())
    }

    /// Remove every input named `name`, returning how many were removed
    pub fn remove(&self, name: &str) -> usize {
        let mut elements = lock(&self.elements);
        let before = elements.len();
        elements.retain(|e| e.snapshot.name != name);
        before - elements.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.elements).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InputSource for FormInputs {
    fn inputs(&self) -> Vec<InputSnapshot> {
        lock(&self.elements)
            .iter()
            .map(|e| e.snapshot.clone())
            .collect()
    }
}
