// File: rusty-constraints-core/src/form.rs
// Purpose: Form coordinator, the only component that starts validation passes

use rusty_constraints_events::{AsyncEmitter, AsyncListener, EmitterError, SyncEmitter, SyncListener};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::config::FormConfig;
use crate::error::FormError;
use crate::field::{FeedbackKind, Field, FieldValidation};
use crate::fields_store::FieldsStore;
use crate::input::InputSnapshot;
use crate::inputs::{InputSource, Selector};
use crate::key::KeyRegistry;
use crate::lock;

/// Listener run for one input during a validation pass; returns the outcomes
/// it recorded
pub type ValidateListener = AsyncListener<InputSnapshot, Vec<FieldValidation>>;

/// Validation fan-out keyed by input name
pub type ValidateEmitter = AsyncEmitter<String, InputSnapshot, Vec<FieldValidation>>;

/// Listener for field lifecycle notifications
pub type FieldListener = SyncListener<Field, ()>;

type FieldEmitter = SyncEmitter<String, Field>;

/// Points in a field's lifecycle that can be observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldLifecycle {
    /// Outcomes were just cleared, rules are about to run
    WillValidate,
    /// Every rule ran (or an async rule settled)
    DidValidate,
    /// Outcomes were cleared without re-evaluation
    DidReset,
}

/// Coordinates validation passes over a set of inputs
///
/// Rule groups register on the form; the form decides which inputs get
/// validated and in which order, and owns the shared [`FieldsStore`].
pub struct FormWithConstraints {
    inputs: Arc<dyn InputSource>,
    config: FormConfig,
    fields_store: FieldsStore,
    keys: KeyRegistry,
    validate_emitter: Arc<ValidateEmitter>,
    will_validate: FieldEmitter,
    did_validate: FieldEmitter,
    did_reset: FieldEmitter,
    async_checks: Mutex<Vec<JoinHandle<()>>>,
    /// Held by each field pass and each async settlement
    passes: tokio::sync::Mutex<()>,
}

impl FormWithConstraints {
    pub fn new(inputs: Arc<dyn InputSource>) -> Arc<Self> {
        Self::with_config(inputs, FormConfig::default())
    }

    pub fn with_config(inputs: Arc<dyn InputSource>, config: FormConfig) -> Arc<Self> {
        Arc::new(Self {
            inputs,
            config,
            fields_store: FieldsStore::new(),
            keys: KeyRegistry::new(),
            validate_emitter: Arc::new(ValidateEmitter::new()),
            will_validate: FieldEmitter::new(),
            did_validate: FieldEmitter::new(),
            did_reset: FieldEmitter::new(),
            async_checks: Mutex::new(Vec::new()),
            passes: tokio::sync::Mutex::new(()),
        })
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn fields_store(&self) -> &FieldsStore {
        &self.fields_store
    }

    pub(crate) fn keys(&self) -> &KeyRegistry {
        &self.keys
    }

    pub(crate) fn validate_emitter(&self) -> &Arc<ValidateEmitter> {
        &self.validate_emitter
    }

    pub(crate) fn lifecycle(&self, stage: FieldLifecycle) -> &FieldEmitter {
        match stage {
            FieldLifecycle::WillValidate => &self.will_validate,
            FieldLifecycle::DidValidate => &self.did_validate,
            FieldLifecycle::DidReset => &self.did_reset,
        }
    }

    /// Observe a lifecycle stage of one field
    pub fn subscribe(
        &self,
        stage: FieldLifecycle,
        field: impl Into<String>,
        listener: Arc<FieldListener>,
    ) -> Result<(), EmitterError> {
        self.lifecycle(stage).add_listener(field.into(), listener)
    }

    pub fn unsubscribe(
        &self,
        stage: FieldLifecycle,
        field: &str,
        listener: &Arc<FieldListener>,
    ) -> Result<(), EmitterError> {
        self.lifecycle(stage)
            .remove_listener(&field.to_string(), listener)
    }

    pub fn on_field_will_validate(
        &self,
        field: impl Into<String>,
        listener: Arc<FieldListener>,
    ) -> Result<(), EmitterError> {
        self.subscribe(FieldLifecycle::WillValidate, field, listener)
    }

    pub fn on_field_did_validate(
        &self,
        field: impl Into<String>,
        listener: Arc<FieldListener>,
    ) -> Result<(), EmitterError> {
        self.subscribe(FieldLifecycle::DidValidate, field, listener)
    }

    pub fn on_field_did_reset(
        &self,
        field: impl Into<String>,
        listener: Arc<FieldListener>,
    ) -> Result<(), EmitterError> {
        self.subscribe(FieldLifecycle::DidReset, field, listener)
    }

    /// Re-validate the given inputs (every named input when empty), even those
    /// that already have feedback
    ///
    /// Returns the resulting fields; inputs no rule group targets are skipped.
    pub async fn validate_fields(&self, selectors: &[Selector]) -> Result<Vec<Field>, FormError> {
        self.validate(selectors, true).await
    }

    /// Like [`validate_fields`](Self::validate_fields), but leaves alone the
    /// fields that already show feedback
    pub async fn validate_fields_without_feedback(
        &self,
        selectors: &[Selector],
    ) -> Result<Vec<Field>, FormError> {
        self.validate(selectors, false).await
    }

    /// Validate the whole form, typically on submit
    pub async fn validate_form(&self) -> Result<Vec<Field>, FormError> {
        self.validate_fields_without_feedback(&[]).await
    }

    async fn validate(&self, selectors: &[Selector], force: bool) -> Result<Vec<Field>, FormError> {
        let inputs = self.normalize_inputs(selectors)?;
        let mut fields = Vec::with_capacity(inputs.len());

        for input in inputs {
            let Some(has_feedbacks) = self
                .fields_store
                .read(&input.name, |field| field.has_feedbacks(None))
            else {
                // No rule group for this input
                continue;
            };

            if !force && has_feedbacks {
                tracing::debug!("Skipping field '{}': already has feedback", input.name);
                continue;
            }

            if let Some(field) = self.validate_field(input).await {
                fields.push(field);
            }
        }

        Ok(fields)
    }

    async fn validate_field(&self, input: InputSnapshot) -> Option<Field> {
        let _pass = self.lock_passes().await;
        let name = input.name.clone();
        let field = self.fields_store.begin_validation(&input)?;
        tracing::debug!("Validating field '{}' with value {:?}", name, input.value);

        self.will_validate.emit_sync(&name, &field);

        let outcomes: Vec<FieldValidation> = self
            .validate_emitter
            .emit_async(&name, input)
            .await
            .into_iter()
            .flatten()
            .collect();

        if self.config.check_consistency {
            self.check_consistency(&name, &outcomes);
        }

        self.emit_field_did_validate(&name);
        self.fields_store.get_field(&name)
    }

    /// Soft check: an async rule settling mid-pass can legitimately race the
    /// store, so a mismatch is only logged
    fn check_consistency(&self, name: &str, outcomes: &[FieldValidation]) {
        let Some(field) = self.fields_store.get_field(name) else {
            return;
        };

        let stored: Vec<&FieldValidation> = field
            .validations()
            .iter()
            .filter(|v| v.kind != FeedbackKind::WhenValid)
            .collect();

        let consistent = stored.len() == outcomes.len()
            && outcomes
                .iter()
                .all(|outcome| field.validation(&outcome.key) == Some(outcome));

        if !consistent {
            tracing::warn!(
                "Outcomes of field '{}' differ from the store: emitted {:?}, stored {:?}",
                name,
                outcomes,
                stored
            );
        }
    }

    pub(crate) fn emit_field_did_validate(&self, name: &str) {
        if let Some(field) = self.fields_store.get_field(name) {
            self.did_validate.emit_sync(&name.to_string(), &field);
        }
    }

    /// Resolve selectors to input snapshots
    ///
    /// Names must match exactly one input, unless all matches are radio or
    /// checkbox inputs of one group; a group is validated once.
    fn normalize_inputs(&self, selectors: &[Selector]) -> Result<Vec<InputSnapshot>, FormError> {
        let all = self.inputs.inputs();

        if selectors.is_empty() {
            let mut inputs: Vec<InputSnapshot> = Vec::new();
            for input in all.into_iter().filter(|i| !i.name.is_empty()) {
                let existing = inputs
                    .iter()
                    .find(|i| i.name == input.name)
                    .map(|i| i.input_type.is_group());

                match existing {
                    None => inputs.push(input),
                    Some(true) if input.input_type.is_group() => {}
                    Some(_) => return Err(FormError::MultipleInputs { name: input.name }),
                }
            }
            return Ok(inputs);
        }

        let mut inputs = Vec::with_capacity(selectors.len());
        for selector in selectors {
            match selector {
                Selector::Input(input) => inputs.push(input.clone()),
                Selector::Name(name) => {
                    let matches: Vec<&InputSnapshot> = all.iter().filter(|i| &i.name == name).collect();

                    match matches.as_slice() {
                        [] => return Err(FormError::InputNotFound { name: name.clone() }),
                        [input] => inputs.push((*input).clone()),
                        [first, ..] if matches.iter().all(|i| i.input_type.is_group()) => {
                            inputs.push((*first).clone())
                        }
                        _ => return Err(FormError::MultipleInputs { name: name.clone() }),
                    }
                }
            }
        }
        Ok(inputs)
    }

    /// Seems valid so far: fields never validated have no errors
    pub fn is_valid(&self) -> bool {
        self.fields_store.is_valid()
    }

    pub fn has_feedbacks(&self) -> bool {
        self.fields_store.has_feedbacks()
    }

    /// Clear every field without re-running any rule
    pub fn reset(&self) -> Vec<Field> {
        self.fields_store
            .field_names()
            .iter()
            .filter_map(|name| self.reset_field(name))
            .collect()
    }

    /// Clear the given fields (every named input when empty)
    pub fn reset_fields(&self, selectors: &[Selector]) -> Result<Vec<Field>, FormError> {
        let inputs = self.normalize_inputs(selectors)?;
        Ok(inputs
            .iter()
            .filter_map(|input| self.reset_field(&input.name))
            .collect())
    }

    fn reset_field(&self, name: &str) -> Option<Field> {
        let field = self.fields_store.clear_validations(name)?;
        tracing::debug!("Field '{}' reset", name);
        self.did_reset.emit_sync(&name.to_string(), &field);
        Some(field)
    }

    pub fn field(&self, name: &str) -> Option<Field> {
        self.fields_store.get_field(name)
    }

    pub fn fields(&self) -> Vec<Field> {
        self.fields_store.fields()
    }

    /// Serializes field passes with async settlements, which may run on other
    /// runtime threads
    pub(crate) async fn lock_passes(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.passes.lock().await
    }

    pub(crate) fn track_async_check(&self, handle: JoinHandle<()>) {
        let mut checks = lock(&self.async_checks);
        checks.retain(|h| !h.is_finished());
        checks.push(handle);
    }

    /// Wait until every async check started so far has settled
    pub async fn wait_for_async_checks(&self) {
        loop {
            let pending = std::mem::take(&mut *lock(&self.async_checks));
            if pending.is_empty() {
                return;
            }

            for handle in pending {
                if let Err(e) = handle.await {
                    tracing::warn!("Async check task failed: {}", e);
                }
            }
        }
    }
}

impl fmt::Debug for FormWithConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormWithConstraints")
            .field("config", &self.config)
            .field("fields_store", &self.fields_store)
            .finish_non_exhaustive()
    }
}
