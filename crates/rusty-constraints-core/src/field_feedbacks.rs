// File: rusty-constraints-core/src/field_feedbacks.rs
// Purpose: Ordered, nestable groups of feedback rules with a stop policy

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use crate::error::ConfigError;
use crate::field::{Field, FieldValidation};
use crate::form::{FormWithConstraints, ValidateEmitter, ValidateListener};
use crate::input::InputSnapshot;
use crate::key::FeedbackKey;

/// When a group stops evaluating its remaining children
///
/// Once a child of the watched kind fired, every later child of the group
/// (whatever its kind) is left not evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopPolicy {
    /// After any error, warning or info
    First,
    #[default]
    FirstError,
    FirstWarning,
    FirstInfo,
    /// Evaluate everything
    No,
}

impl StopPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopPolicy::First => "first",
            StopPolicy::FirstError => "first-error",
            StopPolicy::FirstWarning => "first-warning",
            StopPolicy::FirstInfo => "first-info",
            StopPolicy::No => "no",
        }
    }

    /// Whether the outcomes already recorded under `group` end evaluation
    pub fn is_reached(&self, field: &Field, group: &FeedbackKey) -> bool {
        match self {
            StopPolicy::First => field.has_feedbacks(Some(group)),
            StopPolicy::FirstError => field.has_errors(Some(group)),
            StopPolicy::FirstWarning => field.has_warnings(Some(group)),
            StopPolicy::FirstInfo => field.has_infos(Some(group)),
            StopPolicy::No => false,
        }
    }
}

impl fmt::Display for StopPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StopPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(StopPolicy::First),
            "first-error" => Ok(StopPolicy::FirstError),
            "first-warning" => Ok(StopPolicy::FirstWarning),
            "first-info" => Ok(StopPolicy::FirstInfo),
            "no" => Ok(StopPolicy::No),
            _ => Err(ConfigError::UnknownStopPolicy {
                value: s.to_string(),
            }),
        }
    }
}

/// Declaration of a rule group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFeedbacksProps {
    /// Target input; must be set for top-level groups and unset for nested ones
    pub for_field: Option<String>,
    /// `None` uses the form's configured default
    pub stop: Option<StopPolicy>,
}

impl FieldFeedbacksProps {
    pub fn for_field(name: impl Into<String>) -> Self {
        Self {
            for_field: Some(name.into()),
            stop: None,
        }
    }

    pub fn nested() -> Self {
        Self::default()
    }

    pub fn stop(mut self, stop: StopPolicy) -> Self {
        self.stop = Some(stop);
        self
    }
}

/// A mounted rule group
///
/// Top-level groups listen to the form; nested groups listen to their parent.
/// Dropping the last handle unmounts the group.
pub struct FieldFeedbacks {
    key: FeedbackKey,
    field_name: String,
    stop: StopPolicy,
    form: Arc<FormWithConstraints>,
    parent: Option<Arc<FieldFeedbacks>>,
    host: Arc<ValidateEmitter>,
    emitter: Arc<ValidateEmitter>,
    listener: Arc<ValidateListener>,
}

impl FieldFeedbacks {
    pub fn mount(
        form: &Arc<FormWithConstraints>,
        parent: Option<&Arc<FieldFeedbacks>>,
        props: FieldFeedbacksProps,
    ) -> Result<Arc<Self>, ConfigError> {
        let (key, field_name, host) = match (parent, props.for_field) {
            // Nested groups always target their parent's input
            (Some(_), Some(field)) => return Err(ConfigError::NestedGroupWithTarget { field }),
            (None, None) => return Err(ConfigError::GroupWithoutTarget),
            (Some(parent), None) => {
                if !Arc::ptr_eq(&parent.form, form) {
                    return Err(ConfigError::ForeignParent);
                }
                (
                    parent.next_child_key(),
                    parent.field_name.clone(),
                    parent.emitter.clone(),
                )
            }
            (None, Some(field)) => {
                form.fields_store().add_field(&field);
                (
                    form.keys().next_root(),
                    field,
                    form.validate_emitter().clone(),
                )
            }
        };

        let stop = props.stop.unwrap_or(form.config().default_stop);
        tracing::debug!("Mounting feedback group {} for '{}' (stop: {})", key, field_name, stop);

        let group = Arc::new_cyclic(|weak: &Weak<FieldFeedbacks>| {
            let weak = weak.clone();
            let listener: Arc<ValidateListener> =
                Arc::new(move |input: InputSnapshot| -> BoxFuture<'static, Vec<FieldValidation>> {
                    let group = weak.upgrade();
                    async move {
                        match group {
                            Some(group) => group.validate(input).await,
                            None => Vec::new(),
                        }
                    }
                    .boxed()
                });

            FieldFeedbacks {
                key,
                field_name,
                stop,
                form: form.clone(),
                parent: parent.cloned(),
                host,
                emitter: Arc::new(ValidateEmitter::new()),
                listener,
            }
        });

        // On failure the drop of `group` releases the store registration
        group
            .host
            .add_listener(group.field_name.clone(), group.listener.clone())?;

        Ok(group)
    }

    /// Top-level group for one input
    pub fn for_field(
        form: &Arc<FormWithConstraints>,
        name: impl Into<String>,
        stop: StopPolicy,
    ) -> Result<Arc<Self>, ConfigError> {
        Self::mount(form, None, FieldFeedbacksProps::for_field(name).stop(stop))
    }

    /// Group nested in `parent`, targeting the parent's input
    pub fn nested(parent: &Arc<FieldFeedbacks>, stop: StopPolicy) -> Result<Arc<Self>, ConfigError> {
        Self::mount(&parent.form, Some(parent), FieldFeedbacksProps::nested().stop(stop))
    }

    async fn validate(self: Arc<Self>, input: InputSnapshot) -> Vec<FieldValidation> {
        if input.name != self.field_name {
            return Vec::new();
        }

        // A nested group is one child of its parent and obeys the parent's policy
        if self.parent.as_ref().map_or(false, |parent| parent.stop_reached()) {
            tracing::debug!("Feedback group {} skipped by its parent's stop policy", self.key);
            return Vec::new();
        }

        self.emitter
            .emit_async(&self.field_name, input)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Whether the outcomes recorded so far end evaluation of later children
    pub fn stop_reached(&self) -> bool {
        self.form
            .fields_store()
            .read(&self.field_name, |field| self.stop.is_reached(field, &self.key))
            .unwrap_or(false)
    }

    pub(crate) fn next_child_key(&self) -> FeedbackKey {
        self.form.keys().next_child(&self.key)
    }

    pub fn key(&self) -> &FeedbackKey {
        &self.key
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn stop(&self) -> StopPolicy {
        self.stop
    }

    pub fn form(&self) -> &Arc<FormWithConstraints> {
        &self.form
    }

    pub fn parent(&self) -> Option<&Arc<FieldFeedbacks>> {
        self.parent.as_ref()
    }

    /// Emitter the children of this group listen on
    pub(crate) fn emitter(&self) -> &Arc<ValidateEmitter> {
        &self.emitter
    }

    fn query(&self, f: impl FnOnce(&Field, &FeedbackKey) -> bool) -> bool {
        self.form
            .fields_store()
            .read(&self.field_name, |field| f(field, &self.key))
            .unwrap_or(false)
    }

    /// Fired errors among this group's descendants
    pub fn has_errors(&self) -> bool {
        self.query(|field, key| field.has_errors(Some(key)))
    }

    pub fn has_warnings(&self) -> bool {
        self.query(|field, key| field.has_warnings(Some(key)))
    }

    pub fn has_infos(&self) -> bool {
        self.query(|field, key| field.has_infos(Some(key)))
    }

    pub fn has_feedbacks(&self) -> bool {
        self.query(|field, key| field.has_feedbacks(Some(key)))
    }
}

impl Drop for FieldFeedbacks {
    fn drop(&mut self) {
        if let Err(e) = self.host.remove_listener(&self.field_name, &self.listener) {
            tracing::debug!("Feedback group {} was not listening: {}", self.key, e);
        }

        if self.parent.is_none() {
            self.form.fields_store().remove_field(&self.field_name);
        }
        tracing::debug!("Unmounted feedback group {} for '{}'", self.key, self.field_name);
    }
}

impl fmt::Debug for FieldFeedbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldFeedbacks")
            .field("key", &self.key)
            .field("field_name", &self.field_name)
            .field("stop", &self.stop)
            .field("parent", &self.parent.as_ref().map(|p| p.key.clone()))
            .finish()
    }
}
