// File: rusty-constraints-core/src/field_feedback.rs
// Purpose: A single feedback rule: when it fires, how severe it is, what it says

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, Weak};

use crate::error::ConfigError;
use crate::field::{FeedbackKind, Field, FieldValidation, Fired};
use crate::field_feedbacks::FieldFeedbacks;
use crate::form::{FieldLifecycle, FieldListener, ValidateEmitter, ValidateListener};
use crate::input::{Constraint, InputSnapshot};
use crate::key::FeedbackKey;
use crate::lock;

/// Predicate over the input's current value
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Condition under which a rule fires
#[derive(Clone)]
pub enum When {
    /// Fires when the predicate returns true
    Predicate(Predicate),
    /// Fires when the input is invalid because of this constraint
    Constraint(Constraint),
    /// Fires on any constraint violation (`"*"`)
    AnyViolation,
    /// Fires when the whole field ended up valid (`"valid"`)
    Valid,
}

impl When {
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        When::Predicate(Arc::new(f))
    }
}

impl From<Constraint> for When {
    fn from(constraint: Constraint) -> Self {
        When::Constraint(constraint)
    }
}

impl fmt::Debug for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            When::Predicate(_) => f.write_str("Predicate(..)"),
            When::Constraint(constraint) => write!(f, "Constraint({})", constraint),
            When::AnyViolation => f.write_str("AnyViolation"),
            When::Valid => f.write_str("Valid"),
        }
    }
}

/// Parses `*`, `valid` and constraint names, either DOM-spelled
/// (`valueMissing`) or kebab-cased (`value-missing`)
impl FromStr for When {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "*" => return Ok(When::AnyViolation),
            "valid" => return Ok(When::Valid),
            _ => {}
        }

        let camel = kebab_to_camel(s);
        camel
            .parse::<Constraint>()
            .map(When::Constraint)
            .map_err(|_| ConfigError::UnrecognizedWhen {
                when: s.to_string(),
            })
    }
}

fn kebab_to_camel(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper = false;
    for c in s.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Explicit severity of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

impl From<Severity> for FeedbackKind {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => FeedbackKind::Error,
            Severity::Warning => FeedbackKind::Warning,
            Severity::Info => FeedbackKind::Info,
        }
    }
}

/// Declaration of a rule
#[derive(Debug, Clone)]
pub struct FieldFeedbackProps {
    pub when: When,
    /// `None` means error, or "when valid" for [`When::Valid`]
    pub severity: Option<Severity>,
    /// Shown when the rule fires; defaults to the input's validation message
    pub message: Option<String>,
}

impl FieldFeedbackProps {
    pub fn new(when: impl Into<When>) -> Self {
        Self {
            when: when.into(),
            severity: None,
            message: None,
        }
    }

    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::new(When::predicate(f))
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn error(self) -> Self {
        self.severity(Severity::Error)
    }

    pub fn warning(self) -> Self {
        self.severity(Severity::Warning)
    }

    pub fn info(self) -> Self {
        self.severity(Severity::Info)
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Kind of the outcomes this rule records
    pub fn kind(&self) -> Result<FeedbackKind, ConfigError> {
        match (&self.when, self.severity) {
            (When::Valid, Some(severity)) => Err(ConfigError::WhenValidWithSeverity { severity }),
            (When::Valid, None) => Ok(FeedbackKind::WhenValid),
            (_, severity) => Ok(severity.unwrap_or_default().into()),
        }
    }
}

#[derive(Debug)]
struct RuleState {
    validation: FieldValidation,
    validation_message: String,
}

enum Subscription {
    Validate(Arc<ValidateListener>),
    Lifecycle(FieldLifecycle, Arc<FieldListener>),
}

/// A mounted rule
///
/// Every pass of its field unchecks it; it is checked again only if the pass
/// reaches it. A form reset unchecks it too. Dropping the last handle
/// unmounts it.
pub struct FieldFeedback {
    key: FeedbackKey,
    kind: FeedbackKind,
    when: When,
    message: Option<String>,
    group: Arc<FieldFeedbacks>,
    host: Arc<ValidateEmitter>,
    state: Mutex<RuleState>,
    subscriptions: Vec<Subscription>,
}

impl FieldFeedback {
    pub fn mount(group: &Arc<FieldFeedbacks>, props: FieldFeedbackProps) -> Result<Arc<Self>, ConfigError> {
        Self::mount_on(group, group.emitter(), props)
    }

    /// Mount a rule of `group` that listens for validation on `host`
    ///
    /// Async rules host the rules they render on their own emitter.
    pub(crate) fn mount_on(
        group: &Arc<FieldFeedbacks>,
        host: &Arc<ValidateEmitter>,
        props: FieldFeedbackProps,
    ) -> Result<Arc<Self>, ConfigError> {
        let kind = props.kind()?;
        let key = group.next_child_key();

        let rule = Arc::new_cyclic(|weak: &Weak<FieldFeedback>| {
            let subscriptions = if kind == FeedbackKind::WhenValid {
                vec![
                    Self::lifecycle_subscription(weak, FieldLifecycle::WillValidate, |rule, _| {
                        rule.uncheck()
                    }),
                    Self::lifecycle_subscription(weak, FieldLifecycle::DidValidate, |rule, field| {
                        rule.field_did_validate(field)
                    }),
                    Self::lifecycle_subscription(weak, FieldLifecycle::DidReset, |rule, _| rule.uncheck()),
                ]
            } else {
                let rule = weak.clone();
                let validate: Arc<ValidateListener> =
                    Arc::new(move |input: InputSnapshot| -> BoxFuture<'static, Vec<FieldValidation>> {
                        let outcomes = match rule.upgrade() {
                            Some(rule) => rule.validate(&input),
                            None => Vec::new(),
                        };
                        futures::future::ready(outcomes).boxed()
                    });
                // Rules a pass never reaches (skipped nested groups) end up unchecked
                vec![
                    Self::lifecycle_subscription(weak, FieldLifecycle::WillValidate, |rule, _| {
                        rule.uncheck()
                    }),
                    Subscription::Validate(validate),
                    Self::lifecycle_subscription(weak, FieldLifecycle::DidReset, |rule, _| rule.uncheck()),
                ]
            };

            FieldFeedback {
                key: key.clone(),
                kind,
                when: props.when,
                message: props.message,
                group: group.clone(),
                host: host.clone(),
                state: Mutex::new(RuleState {
                    validation: FieldValidation::new(key, kind, Fired::NotEvaluated),
                    validation_message: String::new(),
                }),
                subscriptions,
            }
        });

        let field_name = rule.group.field_name().to_string();
        for subscription in &rule.subscriptions {
            match subscription {
                Subscription::Validate(listener) => {
                    rule.host.add_listener(field_name.clone(), listener.clone())?
                }
                Subscription::Lifecycle(stage, listener) => {
                    rule.group.form().subscribe(*stage, field_name.clone(), listener.clone())?
                }
            }
        }

        tracing::debug!("Mounted {:?} feedback {} for '{}'", rule.kind, rule.key, field_name);
        Ok(rule)
    }

    fn lifecycle_subscription(
        weak: &Weak<FieldFeedback>,
        stage: FieldLifecycle,
        on_event: fn(&FieldFeedback, &Field),
    ) -> Subscription {
        let weak = weak.clone();
        let listener: Arc<FieldListener> = Arc::new(move |field: &Field| {
            if let Some(rule) = weak.upgrade() {
                on_event(&rule, field);
            }
        });
        Subscription::Lifecycle(stage, listener)
    }

    /// Evaluate against one input and record the outcome
    ///
    /// Rules left behind by the group's stop policy record `NotEvaluated`.
    fn validate(&self, input: &InputSnapshot) -> Vec<FieldValidation> {
        if input.name != self.group.field_name() {
            return Vec::new();
        }

        let fired = if self.group.stop_reached() {
            Fired::NotEvaluated
        } else {
            self.evaluate(input).into()
        };

        let validation = FieldValidation::new(self.key.clone(), self.kind, fired);
        {
            let mut state = lock(&self.state);
            state.validation = validation.clone();
            state.validation_message = input.validation_message.clone();
        }

        self.group
            .form()
            .fields_store()
            .add_or_replace_validation(&input.name, validation.clone());
        tracing::trace!("Feedback {} on '{}': {:?}", self.key, input.name, fired);

        vec![validation]
    }

    fn evaluate(&self, input: &InputSnapshot) -> bool {
        match &self.when {
            When::Predicate(predicate) => predicate(&input.value),
            When::AnyViolation => !input.validity.valid,
            When::Constraint(constraint) => !input.validity.valid && input.validity.is_set(*constraint),
            When::Valid => false,
        }
    }

    fn field_did_validate(&self, field: &Field) {
        let validation = FieldValidation::new(self.key.clone(), self.kind, field.is_valid().into());
        lock(&self.state).validation = validation.clone();

        self.group
            .form()
            .fields_store()
            .add_or_replace_validation(field.name(), validation);
    }

    fn uncheck(&self) {
        let mut state = lock(&self.state);
        state.validation.fired = Fired::NotEvaluated;
        state.validation_message.clear();
    }

    pub fn key(&self) -> &FeedbackKey {
        &self.key
    }

    pub fn kind(&self) -> FeedbackKind {
        self.kind
    }

    pub fn when(&self) -> &When {
        &self.when
    }

    pub fn group(&self) -> &Arc<FieldFeedbacks> {
        &self.group
    }

    /// Outcome of the last evaluation
    pub fn validation(&self) -> FieldValidation {
        lock(&self.state).validation.clone()
    }

    pub fn fired(&self) -> Fired {
        lock(&self.state).validation.fired
    }

    /// Copy of the input's validation message from the last evaluation
    pub fn validation_message(&self) -> String {
        lock(&self.state).validation_message.clone()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Text to show, if the rule fired: its message, else the input's own
    /// validation message when there is one
    pub fn display_text(&self) -> Option<String> {
        let state = lock(&self.state);
        if !state.validation.fired.is_fired() {
            return None;
        }

        self.message.clone().or_else(|| {
            Some(state.validation_message.clone()).filter(|message| !message.is_empty())
        })
    }
}

impl Drop for FieldFeedback {
    fn drop(&mut self) {
        let field_name = self.group.field_name().to_string();
        for subscription in &self.subscriptions {
            let result = match subscription {
                Subscription::Validate(listener) => self.host.remove_listener(&field_name, listener),
                Subscription::Lifecycle(stage, listener) => {
                    self.group.form().unsubscribe(*stage, &field_name, listener)
                }
            };
            if let Err(e) = result {
                tracing::debug!("Feedback {} was not subscribed: {}", self.key, e);
            }
        }
    }
}

impl fmt::Debug for FieldFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldFeedback")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("when", &self.when)
            .field("message", &self.message)
            .field("state", &*lock(&self.state))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_feedbacks::StopPolicy;
    use crate::form::FormWithConstraints;
    use crate::input::ValidityState;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("*", "AnyViolation")]
    #[case("valid", "Valid")]
    #[case("valueMissing", "Constraint(valueMissing)")]
    #[case("pattern-mismatch", "Constraint(patternMismatch)")]
    #[case("too-short", "Constraint(tooShort)")]
    fn test_parse_when(#[case] input: &str, #[case] expected: &str) {
        let when: When = input.parse().unwrap();
        assert_eq!(format!("{:?}", when), expected);
    }

    #[test]
    fn test_unrecognized_when() {
        let err = "required".parse::<When>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnrecognizedWhen {
                when: "required".to_string()
            }
        );
    }

    #[rstest]
    #[case(FieldFeedbackProps::new(Constraint::ValueMissing), Ok(FeedbackKind::Error))]
    #[case(FieldFeedbackProps::new(When::AnyViolation).warning(), Ok(FeedbackKind::Warning))]
    #[case(FieldFeedbackProps::predicate(|_| true).info(), Ok(FeedbackKind::Info))]
    #[case(FieldFeedbackProps::new(When::Valid), Ok(FeedbackKind::WhenValid))]
    #[case(
        FieldFeedbackProps::new(When::Valid).error(),
        Err(ConfigError::WhenValidWithSeverity { severity: Severity::Error })
    )]
    fn test_kind(#[case] props: FieldFeedbackProps, #[case] expected: Result<FeedbackKind, ConfigError>) {
        assert_eq!(props.kind(), expected);
    }

    fn group() -> Arc<FieldFeedbacks> {
        let form = FormWithConstraints::new(Arc::new(vec![InputSnapshot::new("username", "")]));
        FieldFeedbacks::for_field(&form, "username", StopPolicy::No).unwrap()
    }

    #[test]
    fn test_evaluate_constraints() {
        let group = group();
        let missing = FieldFeedback::mount(&group, FieldFeedbackProps::new(Constraint::ValueMissing)).unwrap();
        let any = FieldFeedback::mount(&group, FieldFeedbackProps::new(When::AnyViolation)).unwrap();

        let input = InputSnapshot::new("username", "")
            .with_validity(ValidityState::from_violations([Constraint::TooShort]), "Too short");
        assert!(!missing.evaluate(&input));
        assert!(any.evaluate(&input));

        let input = InputSnapshot::new("username", "")
            .with_validity(ValidityState::from_violations([Constraint::ValueMissing]), "Required");
        assert!(missing.evaluate(&input));
    }

    #[test]
    fn test_validate_records_outcome() {
        let group = group();
        let rule = FieldFeedback::mount(&group, FieldFeedbackProps::predicate(|value| value.len() < 3)).unwrap();
        assert_eq!(rule.key().to_string(), "0.0");
        assert_eq!(rule.fired(), Fired::NotEvaluated);

        let outcomes = rule.validate(&InputSnapshot::new("username", "jo"));
        assert_eq!(outcomes, vec![rule.validation()]);
        assert_eq!(rule.fired(), Fired::Fired);

        let field = group.form().field("username").unwrap();
        assert_eq!(field.validations(), &[rule.validation()]);

        // Other inputs are ignored
        assert!(rule.validate(&InputSnapshot::new("password", "jo")).is_empty());
    }

    #[test]
    fn test_display_text() {
        let group = group();
        let explicit = FieldFeedback::mount(
            &group,
            FieldFeedbackProps::new(When::AnyViolation).message("Pick a username"),
        )
        .unwrap();
        let fallback = FieldFeedback::mount(&group, FieldFeedbackProps::new(When::AnyViolation)).unwrap();

        let input = InputSnapshot::new("username", "")
            .with_validity(ValidityState::from_violations([Constraint::ValueMissing]), "Please fill out this field.");
        explicit.validate(&input);
        fallback.validate(&input);

        assert_eq!(explicit.display_text().as_deref(), Some("Pick a username"));
        assert_eq!(fallback.display_text().as_deref(), Some("Please fill out this field."));
        assert_eq!(fallback.validation_message(), "Please fill out this field.");

        fallback.validate(&InputSnapshot::new("username", "john"));
        assert_eq!(fallback.display_text(), None);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let group = group();
        let rule = FieldFeedback::mount(&group, FieldFeedbackProps::new(When::AnyViolation)).unwrap();
        let field = "username".to_string();
        assert_eq!(group.emitter().listener_count(&field), 1);

        drop(rule);
        assert_eq!(group.emitter().listener_count(&field), 0);
        for stage in [FieldLifecycle::WillValidate, FieldLifecycle::DidReset] {
            assert_eq!(group.form().lifecycle(stage).listener_count(&field), 0);
        }
    }

    #[test]
    fn test_rules_listen_to_will_validate() {
        let group = group();
        let _rule = FieldFeedback::mount(&group, FieldFeedbackProps::new(When::AnyViolation)).unwrap();
        let _when_valid = FieldFeedback::mount(&group, FieldFeedbackProps::new(When::Valid)).unwrap();

        let field = "username".to_string();
        assert_eq!(
            group
                .form()
                .lifecycle(FieldLifecycle::WillValidate)
                .listener_count(&field),
            2
        );
    }
}
