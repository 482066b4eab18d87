//! Integration tests for rusty-constraints-core
//!
//! End-to-end validation passes through the form coordinator:
//! - Password rules with and without a stop policy
//! - Stop-policy ordering and nested groups
//! - Async rules (pending state, settlement, superseded checks, reset)
//! - Reset, selectors and field registration

use pretty_assertions::assert_eq;
use rusty_constraints_core::*;
use rusty_constraints_validation::{contains_digit, contains_special, contains_uppercase};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("rusty_constraints_core=debug")
        .with_test_writer()
        .try_init();
}

struct PasswordForm {
    inputs: Arc<FormInputs>,
    form: Arc<FormWithConstraints>,
    rules: Vec<Arc<FieldFeedback>>,
    _group: Arc<FieldFeedbacks>,
}

fn password_form(stop: StopPolicy) -> PasswordForm {
    let inputs = Arc::new(FormInputs::new());
    inputs.insert_with_constraints(
        "password",
        InputType::Password,
        Html5Constraints::new().required().pattern(".{5,}"),
    );
    let form = FormWithConstraints::new(inputs.clone());
    let group = FieldFeedbacks::for_field(&form, "password", stop).unwrap();

    let declarations = vec![
        FieldFeedbackProps::new(Constraint::ValueMissing),
        FieldFeedbackProps::new(Constraint::PatternMismatch).message("Should be at least 5 characters long"),
        FieldFeedbackProps::predicate(|value| !contains_digit(value))
            .warning()
            .message("Should contain numbers"),
        FieldFeedbackProps::predicate(|value| !contains_uppercase(value))
            .warning()
            .message("Should contain capital letters"),
        FieldFeedbackProps::predicate(|value| !contains_special(value))
            .warning()
            .message("Should contain special characters"),
        FieldFeedbackProps::new(When::Valid).message("Looks good!"),
    ];
    let rules = declarations
        .into_iter()
        .map(|props| FieldFeedback::mount(&group, props).unwrap())
        .collect();

    PasswordForm {
        inputs,
        form,
        rules,
        _group: group,
    }
}

fn fired(field: &Field) -> Vec<Fired> {
    field.validations().iter().map(|v| v.fired).collect()
}

fn kinds(field: &Field) -> Vec<FeedbackKind> {
    field.validations().iter().map(|v| v.kind).collect()
}

#[tokio::test]
async fn test_password_valid_value_with_missing_characters() {
    init_tracing();
    let password = password_form(StopPolicy::No);
    password.inputs.set_value("password", "123456");

    let fields = password.form.validate_fields(&["password".into()]).await.unwrap();
    assert_eq!(fields.len(), 1);

    let field = password.form.field("password").unwrap();
    assert_eq!(
        fired(&field),
        vec![
            Fired::NotFired,
            Fired::NotFired,
            Fired::NotFired,
            Fired::Fired,
            Fired::Fired,
            Fired::Fired,
        ]
    );
    assert_eq!(
        kinds(&field),
        vec![
            FeedbackKind::Error,
            FeedbackKind::Error,
            FeedbackKind::Warning,
            FeedbackKind::Warning,
            FeedbackKind::Warning,
            FeedbackKind::WhenValid,
        ]
    );
    assert!(password.form.is_valid());
    assert!(password.form.has_feedbacks());

    let texts: Vec<Option<String>> = password.rules.iter().map(|r| r.display_text()).collect();
    assert_eq!(
        texts,
        vec![
            None,
            None,
            None,
            Some("Should contain capital letters".to_string()),
            Some("Should contain special characters".to_string()),
            Some("Looks good!".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_password_empty_value_stops_at_first_error() {
    let password = password_form(StopPolicy::FirstError);

    password.form.validate_fields(&["password".into()]).await.unwrap();

    let field = password.form.field("password").unwrap();
    assert_eq!(
        fired(&field),
        vec![
            Fired::Fired,
            Fired::NotEvaluated,
            Fired::NotEvaluated,
            Fired::NotEvaluated,
            Fired::NotEvaluated,
            Fired::NotFired,
        ]
    );
    assert!(!password.form.is_valid());
    assert_eq!(
        password.rules[0].display_text().as_deref(),
        Some("Please fill out this field.")
    );
    assert_eq!(field.element().map(|e| e.value.as_str()), Some(""));
}

#[tokio::test]
async fn test_revalidation_is_idempotent() {
    let password = password_form(StopPolicy::No);
    password.inputs.set_value("password", "abc");

    let first = password.form.validate_fields(&[]).await.unwrap();
    let second = password.form.validate_fields(&[]).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second[0].validations().len(), 6);
}

#[tokio::test]
async fn test_first_error_ordering() {
    let inputs: Arc<dyn InputSource> = Arc::new(vec![InputSnapshot::new("name", "x")]);
    let form = FormWithConstraints::new(inputs);
    let group = FieldFeedbacks::for_field(&form, "name", StopPolicy::FirstError).unwrap();

    let _no_match = FieldFeedback::mount(&group, FieldFeedbackProps::predicate(|_| false)).unwrap();
    let _first = FieldFeedback::mount(&group, FieldFeedbackProps::predicate(|_| true)).unwrap();
    let _second = FieldFeedback::mount(&group, FieldFeedbackProps::predicate(|_| true)).unwrap();

    let fields = form.validate_fields(&["name".into()]).await.unwrap();
    assert_eq!(
        fired(&fields[0]),
        vec![Fired::NotFired, Fired::Fired, Fired::NotEvaluated]
    );
}

#[tokio::test]
async fn test_stop_policies_track_one_kind() {
    let inputs: Arc<dyn InputSource> = Arc::new(vec![InputSnapshot::new("name", "x")]);
    let form = FormWithConstraints::new(inputs);
    let group = FieldFeedbacks::for_field(&form, "name", StopPolicy::FirstWarning).unwrap();

    let _error = FieldFeedback::mount(&group, FieldFeedbackProps::predicate(|_| true)).unwrap();
    let _warning = FieldFeedback::mount(&group, FieldFeedbackProps::predicate(|_| true).warning()).unwrap();
    let _info = FieldFeedback::mount(&group, FieldFeedbackProps::predicate(|_| true).info()).unwrap();

    let fields = form.validate_fields(&[]).await.unwrap();
    assert_eq!(
        fired(&fields[0]),
        vec![Fired::Fired, Fired::Fired, Fired::NotEvaluated]
    );
}

#[tokio::test]
async fn test_nested_groups() {
    let inputs: Arc<dyn InputSource> = Arc::new(vec![InputSnapshot::new("name", "x")]);
    let form = FormWithConstraints::new(inputs);
    let outer = FieldFeedbacks::for_field(&form, "name", StopPolicy::FirstError).unwrap();

    let nested = FieldFeedbacks::nested(&outer, StopPolicy::No).unwrap();
    let warning = FieldFeedback::mount(&nested, FieldFeedbackProps::predicate(|_| true).warning()).unwrap();
    let error = FieldFeedback::mount(&nested, FieldFeedbackProps::predicate(|_| true)).unwrap();
    let after = FieldFeedback::mount(&outer, FieldFeedbackProps::predicate(|_| true)).unwrap();

    assert_eq!(nested.key().to_string(), "0.0");
    assert_eq!(warning.key().to_string(), "0.0.0");
    assert_eq!(error.key().to_string(), "0.0.1");
    assert_eq!(after.key().to_string(), "0.1");

    form.validate_fields(&[]).await.unwrap();
    assert_eq!(warning.fired(), Fired::Fired);
    assert_eq!(error.fired(), Fired::Fired);
    assert_eq!(after.fired(), Fired::NotEvaluated);
    assert!(nested.has_errors());
    assert!(outer.has_warnings());
}

#[tokio::test]
async fn test_nested_group_skipped_after_parent_stops() {
    let inputs: Arc<dyn InputSource> = Arc::new(vec![InputSnapshot::new("name", "x")]);
    let form = FormWithConstraints::new(inputs);
    let outer = FieldFeedbacks::for_field(&form, "name", StopPolicy::FirstError).unwrap();

    let _error = FieldFeedback::mount(&outer, FieldFeedbackProps::predicate(|_| true)).unwrap();
    let nested = FieldFeedbacks::nested(&outer, StopPolicy::No).unwrap();
    let skipped = FieldFeedback::mount(&nested, FieldFeedbackProps::predicate(|_| true)).unwrap();

    let fields = form.validate_fields(&[]).await.unwrap();
    assert_eq!(fired(&fields[0]), vec![Fired::Fired]);
    assert_eq!(skipped.fired(), Fired::NotEvaluated);
}

#[tokio::test]
async fn test_rules_skipped_by_a_later_pass_are_unchecked() {
    let inputs = Arc::new(FormInputs::new());
    inputs.insert(InputSnapshot::new("name", "x"));
    let form = FormWithConstraints::new(inputs.clone());
    let outer = FieldFeedbacks::for_field(&form, "name", StopPolicy::FirstError).unwrap();

    let empty = FieldFeedback::mount(&outer, FieldFeedbackProps::predicate(|v| v.is_empty())).unwrap();
    let nested = FieldFeedbacks::nested(&outer, StopPolicy::No).unwrap();
    let short = FieldFeedback::mount(
        &nested,
        FieldFeedbackProps::predicate(|v| v.len() < 3).message("short"),
    )
    .unwrap();

    form.validate_fields(&[]).await.unwrap();
    assert_eq!(short.fired(), Fired::Fired);
    assert_eq!(short.display_text().as_deref(), Some("short"));

    inputs.set_value("name", "");
    let fields = form.validate_fields(&[]).await.unwrap();

    assert_eq!(fired(&fields[0]), vec![Fired::Fired]);
    assert_eq!(empty.fired(), Fired::Fired);
    assert_eq!(short.fired(), Fired::NotEvaluated);
    assert_eq!(short.display_text(), None);
    assert!(fields[0].validation(short.key()).is_none());
}

#[tokio::test]
async fn test_reset_does_not_reevaluate() {
    let calls = Arc::new(AtomicUsize::new(0));
    let inputs: Arc<dyn InputSource> = Arc::new(vec![InputSnapshot::new("name", "")]);
    let form = FormWithConstraints::new(inputs);
    let group = FieldFeedbacks::for_field(&form, "name", StopPolicy::No).unwrap();

    let counter = calls.clone();
    let rule = FieldFeedback::mount(
        &group,
        FieldFeedbackProps::predicate(move |value| {
            counter.fetch_add(1, Ordering::SeqCst);
            value.is_empty()
        }),
    )
    .unwrap();
    let when_valid = FieldFeedback::mount(&group, FieldFeedbackProps::new(When::Valid)).unwrap();

    form.validate_form().await.unwrap();
    assert_eq!(rule.fired(), Fired::Fired);
    assert_eq!(when_valid.fired(), Fired::NotFired);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let fields = form.reset();
    assert_eq!(fields.len(), 1);
    assert!(fields[0].validations().is_empty());
    assert!(form.field("name").unwrap().validations().is_empty());
    assert_eq!(rule.fired(), Fired::NotEvaluated);
    assert_eq!(when_valid.fired(), Fired::NotEvaluated);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(form.is_valid());
}

#[tokio::test]
async fn test_validate_form_skips_fields_with_feedback() {
    let inputs = Arc::new(FormInputs::new());
    inputs.insert(InputSnapshot::new("username", ""));
    inputs.insert(InputSnapshot::new("email", ""));
    let form = FormWithConstraints::new(inputs.clone());

    let username = FieldFeedbacks::for_field(&form, "username", StopPolicy::FirstError).unwrap();
    let username_rule = FieldFeedback::mount(&username, FieldFeedbackProps::predicate(|v| v.is_empty())).unwrap();
    let email = FieldFeedbacks::for_field(&form, "email", StopPolicy::FirstError).unwrap();
    let email_rule = FieldFeedback::mount(&email, FieldFeedbackProps::predicate(|v| v.is_empty())).unwrap();

    form.validate_fields(&["username".into()]).await.unwrap();
    assert_eq!(username_rule.fired(), Fired::Fired);

    inputs.set_value("username", "john");
    let validated = form.validate_form().await.unwrap();

    let names: Vec<&str> = validated.iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["email"]);
    assert_eq!(username_rule.fired(), Fired::Fired);
    assert_eq!(email_rule.fired(), Fired::Fired);

    form.validate_fields(&[]).await.unwrap();
    assert_eq!(username_rule.fired(), Fired::NotFired);
}

#[tokio::test]
async fn test_selector_errors() {
    let inputs: Arc<dyn InputSource> = Arc::new(vec![
        InputSnapshot::new("username", ""),
        InputSnapshot::new("username", ""),
    ]);
    let form = FormWithConstraints::new(inputs);

    assert_eq!(
        form.validate_fields(&["email".into()]).await,
        Err(FormError::InputNotFound {
            name: "email".to_string()
        })
    );
    assert_eq!(
        form.validate_form().await,
        Err(FormError::MultipleInputs {
            name: "username".to_string()
        })
    );
    assert_eq!(
        form.reset_fields(&["username".into()]),
        Err(FormError::MultipleInputs {
            name: "username".to_string()
        })
    );
}

#[tokio::test]
async fn test_radio_group_validated_once() {
    let inputs: Arc<dyn InputSource> = Arc::new(vec![
        InputSnapshot::new("color", "red").with_type(InputType::Radio),
        InputSnapshot::new("color", "blue").with_type(InputType::Radio),
    ]);
    let form = FormWithConstraints::new(inputs);
    let group = FieldFeedbacks::for_field(&form, "color", StopPolicy::No).unwrap();
    let _rule = FieldFeedback::mount(&group, FieldFeedbackProps::new(When::AnyViolation)).unwrap();

    let fields = form.validate_fields(&["color".into()]).await.unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].validations().len(), 1);
}

#[tokio::test]
async fn test_groups_share_a_field() {
    let inputs: Arc<dyn InputSource> = Arc::new(vec![InputSnapshot::new("name", "")]);
    let form = FormWithConstraints::new(inputs);

    let first = FieldFeedbacks::for_field(&form, "name", StopPolicy::No).unwrap();
    let second = FieldFeedbacks::for_field(&form, "name", StopPolicy::No).unwrap();
    let _a = FieldFeedback::mount(&first, FieldFeedbackProps::predicate(|_| true)).unwrap();
    let _b = FieldFeedback::mount(&second, FieldFeedbackProps::predicate(|_| false).warning()).unwrap();

    let fields = form.validate_fields(&[]).await.unwrap();
    let keys: Vec<String> = fields[0].validations().iter().map(|v| v.key.to_string()).collect();
    assert_eq!(keys, vec!["0.0", "1.0"]);
    assert!(first.has_errors());
    assert!(!second.has_feedbacks());

    drop(_a);
    drop(first);
    assert!(form.field("name").is_some());
    drop(_b);
    drop(second);
    assert!(form.field("name").is_none());
}

#[tokio::test]
async fn test_lifecycle_notifications() {
    let inputs: Arc<dyn InputSource> = Arc::new(vec![InputSnapshot::new("name", "")]);
    let form = FormWithConstraints::new(inputs);
    let group = FieldFeedbacks::for_field(&form, "name", StopPolicy::No).unwrap();
    let _rule = FieldFeedback::mount(&group, FieldFeedbackProps::predicate(|v| v.is_empty())).unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    for stage in [
        FieldLifecycle::WillValidate,
        FieldLifecycle::DidValidate,
        FieldLifecycle::DidReset,
    ] {
        let events = events.clone();
        let listener: Arc<FieldListener> = Arc::new(move |field: &Field| {
            events
                .lock()
                .unwrap()
                .push((stage, field.validations().len()));
        });
        form.subscribe(stage, "name", listener).unwrap();
    }

    form.validate_fields(&[]).await.unwrap();
    form.reset();

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            (FieldLifecycle::WillValidate, 0),
            (FieldLifecycle::DidValidate, 1),
            (FieldLifecycle::DidReset, 0),
        ]
    );
}

fn username_form() -> (Arc<FormInputs>, Arc<FormWithConstraints>, Arc<FieldFeedbacks>) {
    let inputs = Arc::new(FormInputs::new());
    inputs.insert_with_constraints("username", InputType::Text, Html5Constraints::new().required());
    let form = FormWithConstraints::new(inputs.clone());
    let group = FieldFeedbacks::for_field(&form, "username", StopPolicy::FirstError).unwrap();
    (inputs, form, group)
}

fn availability_props<F, Fut>(check: F) -> AsyncProps<bool, String>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<bool, String>> + Send + 'static,
{
    AsyncProps::new(check)
        .then(|available| {
            if *available {
                vec![FieldFeedbackProps::predicate(|_| true)
                    .info()
                    .message("Username available")]
            } else {
                vec![FieldFeedbackProps::predicate(|_| true).message("Username already taken, choose another")]
            }
        })
        .catch(|error| vec![FieldFeedbackProps::predicate(|_| true).message(error.clone())])
}

fn count_did_validate(form: &FormWithConstraints, field: &str) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    let listener: Arc<FieldListener> = Arc::new(move |_: &Field| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    form.on_field_did_validate(field, listener).unwrap();
    count
}

#[tokio::test]
async fn test_async_username_taken() {
    let (inputs, form, group) = username_form();
    let _required = FieldFeedback::mount(&group, FieldFeedbackProps::new(Constraint::ValueMissing)).unwrap();
    let availability = AsyncFeedback::mount(
        &group,
        availability_props(|value| async move { Ok(value != "john") }),
    )
    .unwrap();
    let did_validate = count_did_validate(&form, "username");

    inputs.set_value("username", "john");
    form.validate_fields(&["username".into()]).await.unwrap();

    assert!(availability.is_pending());
    assert_eq!(fired(&form.field("username").unwrap()), vec![Fired::NotFired]);
    assert_eq!(did_validate.load(Ordering::SeqCst), 1);

    form.wait_for_async_checks().await;

    assert_eq!(availability.status(), AsyncStatus::Resolved(false));
    assert_eq!(did_validate.load(Ordering::SeqCst), 2);

    let children = availability.children();
    assert_eq!(children.len(), 1);
    assert_eq!(
        children[0].display_text().as_deref(),
        Some("Username already taken, choose another")
    );

    let field = form.field("username").unwrap();
    assert_eq!(fired(&field), vec![Fired::NotFired, Fired::Fired]);
    assert_eq!(kinds(&field), vec![FeedbackKind::Error, FeedbackKind::Error]);
    assert!(!form.is_valid());
}

#[tokio::test]
async fn test_async_username_available() {
    let (inputs, form, group) = username_form();
    let availability = AsyncFeedback::mount(
        &group,
        availability_props(|value| async move { Ok(value != "john") }),
    )
    .unwrap();

    inputs.set_value("username", "jane");
    form.validate_fields(&[]).await.unwrap();
    form.wait_for_async_checks().await;

    assert_eq!(availability.status(), AsyncStatus::Resolved(true));
    let field = form.field("username").unwrap();
    assert_eq!(kinds(&field), vec![FeedbackKind::Info]);
    assert_eq!(fired(&field), vec![Fired::Fired]);
    assert!(form.is_valid());
}

#[tokio::test]
async fn test_async_rejection_renders_catch() {
    let (inputs, form, group) = username_form();
    let availability = AsyncFeedback::mount(
        &group,
        availability_props(|_| async move { Err("Service unavailable".to_string()) }),
    )
    .unwrap();

    inputs.set_value("username", "john");
    form.validate_fields(&[]).await.unwrap();
    form.wait_for_async_checks().await;

    assert_eq!(
        availability.status(),
        AsyncStatus::Rejected("Service unavailable".to_string())
    );
    assert_eq!(
        availability.children()[0].display_text().as_deref(),
        Some("Service unavailable")
    );
}

#[tokio::test]
async fn test_async_latest_check_wins() {
    init_tracing();
    let (inputs, form, group) = username_form();
    let gate = Arc::new(Notify::new());
    let checks = Arc::new(AtomicUsize::new(0));

    let check_gate = gate.clone();
    let check_count = checks.clone();
    let availability = AsyncFeedback::mount(
        &group,
        availability_props(move |value| {
            let gate = check_gate.clone();
            check_count.fetch_add(1, Ordering::SeqCst);
            async move {
                // The first check only settles once the second one did
                if value == "jo" {
                    gate.notified().await;
                } else {
                    gate.notify_one();
                }
                Ok(value != "john")
            }
        }),
    )
    .unwrap();
    let did_validate = count_did_validate(&form, "username");

    inputs.set_value("username", "jo");
    form.validate_fields(&[]).await.unwrap();
    inputs.set_value("username", "john");
    form.validate_fields(&[]).await.unwrap();

    form.wait_for_async_checks().await;

    assert_eq!(checks.load(Ordering::SeqCst), 2);
    assert_eq!(availability.status(), AsyncStatus::Resolved(false));
    assert_eq!(availability.children().len(), 1);
    assert_eq!(did_validate.load(Ordering::SeqCst), 3);

    let field = form.field("username").unwrap();
    assert_eq!(field.element().map(|e| e.value.as_str()), Some("john"));
    assert_eq!(fired(&field), vec![Fired::Fired]);
    assert!(!form.is_valid());
}

#[tokio::test]
async fn test_reset_discards_pending_check() {
    let (inputs, form, group) = username_form();
    let availability = AsyncFeedback::mount(
        &group,
        availability_props(|value| async move { Ok(value != "john") }),
    )
    .unwrap();

    inputs.set_value("username", "john");
    form.validate_fields(&[]).await.unwrap();
    assert!(availability.is_pending());

    form.reset();
    form.wait_for_async_checks().await;

    assert_eq!(availability.status(), AsyncStatus::Idle);
    assert!(availability.children().is_empty());
    assert!(form.field("username").unwrap().validations().is_empty());
    assert!(form.is_valid());
}

#[tokio::test]
async fn test_async_check_skipped_after_stop() {
    let (_inputs, form, group) = username_form();
    let _required = FieldFeedback::mount(&group, FieldFeedbackProps::new(Constraint::ValueMissing)).unwrap();
    let availability = AsyncFeedback::mount(
        &group,
        availability_props(|value| async move { Ok(value != "john") }),
    )
    .unwrap();

    form.validate_fields(&[]).await.unwrap();

    assert_eq!(availability.status(), AsyncStatus::Idle);
    form.wait_for_async_checks().await;
    assert_eq!(fired(&form.field("username").unwrap()), vec![Fired::Fired]);
}

#[tokio::test]
async fn test_consistency_check_can_be_disabled() {
    let config = FormConfig {
        check_consistency: false,
        ..FormConfig::default()
    };
    let inputs: Arc<dyn InputSource> = Arc::new(vec![InputSnapshot::new("name", "")]);
    let form = FormWithConstraints::with_config(inputs, config);
    let group = FieldFeedbacks::mount(&form, None, FieldFeedbacksProps::for_field("name")).unwrap();
    let _rule = FieldFeedback::mount(&group, FieldFeedbackProps::predicate(|v| v.is_empty())).unwrap();

    assert_eq!(group.stop(), StopPolicy::FirstError);
    let fields = form.validate_fields(&[]).await.unwrap();
    assert_eq!(fired(&fields[0]), vec![Fired::Fired]);
}

#[tokio::test]
async fn test_pending_check_dropped_when_stop_skips_the_next_pass() {
    let (inputs, form, group) = username_form();
    let _required = FieldFeedback::mount(&group, FieldFeedbackProps::new(Constraint::ValueMissing)).unwrap();
    let gate = Arc::new(Notify::new());

    let check_gate = gate.clone();
    let availability = AsyncFeedback::mount(
        &group,
        availability_props(move |value| {
            let gate = check_gate.clone();
            async move {
                gate.notified().await;
                Ok(value != "john")
            }
        }),
    )
    .unwrap();
    let did_validate = count_did_validate(&form, "username");

    inputs.set_value("username", "john");
    form.validate_fields(&[]).await.unwrap();
    assert!(availability.is_pending());

    inputs.set_value("username", "");
    form.validate_fields(&[]).await.unwrap();
    assert_eq!(availability.status(), AsyncStatus::Idle);

    gate.notify_one();
    form.wait_for_async_checks().await;

    assert_eq!(availability.status(), AsyncStatus::Idle);
    assert!(availability.children().is_empty());
    assert_eq!(did_validate.load(Ordering::SeqCst), 2);

    let field = form.field("username").unwrap();
    assert_eq!(field.element().map(|e| e.value.as_str()), Some(""));
    assert_eq!(fired(&field), vec![Fired::Fired]);
}

/// Renders one "taken" error whose evaluation signals `started`, then blocks
/// its thread for a while
fn slow_rendering_props(started: Arc<Notify>) -> AsyncProps<bool, String> {
    AsyncProps::new(|value: String| async move { Ok::<_, String>(value != "john") }).then(move |available| {
        let started = started.clone();
        let taken = !*available;
        vec![FieldFeedbackProps::predicate(move |_| {
            started.notify_one();
            std::thread::sleep(Duration::from_millis(100));
            taken
        })
        .message("Username already taken, choose another")]
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pass_waits_for_settlement_in_progress() {
    let (inputs, form, group) = username_form();
    let _required = FieldFeedback::mount(&group, FieldFeedbackProps::new(Constraint::ValueMissing)).unwrap();
    let started = Arc::new(Notify::new());
    let availability = AsyncFeedback::mount(&group, slow_rendering_props(started.clone())).unwrap();

    inputs.set_value("username", "john");
    form.validate_fields(&[]).await.unwrap();

    // The settlement is recording on a worker thread
    started.notified().await;
    inputs.set_value("username", "");
    let fields = form.validate_fields(&[]).await.unwrap();
    form.wait_for_async_checks().await;

    assert_eq!(fired(&fields[0]), vec![Fired::Fired]);
    assert_eq!(availability.status(), AsyncStatus::Idle);
    assert!(availability.children().is_empty());

    let field = form.field("username").unwrap();
    assert_eq!(fired(&field), vec![Fired::Fired]);
    assert_eq!(kinds(&field), vec![FeedbackKind::Error]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reset_during_settlement_discards_rendered_outcomes() {
    let (inputs, form, group) = username_form();
    let started = Arc::new(Notify::new());
    let availability = AsyncFeedback::mount(&group, slow_rendering_props(started.clone())).unwrap();
    let did_validate = count_did_validate(&form, "username");

    inputs.set_value("username", "john");
    form.validate_fields(&[]).await.unwrap();

    started.notified().await;
    form.reset();
    form.wait_for_async_checks().await;

    assert_eq!(availability.status(), AsyncStatus::Idle);
    assert!(availability.children().is_empty());
    assert!(form.field("username").unwrap().validations().is_empty());
    assert!(form.is_valid());
    assert_eq!(did_validate.load(Ordering::SeqCst), 1);
}

#[test]
fn test_async_check_outside_tokio_runtime() {
    let (inputs, form, group) = username_form();
    let availability = AsyncFeedback::mount(
        &group,
        availability_props(|value| async move { Ok(value != "john") }),
    )
    .unwrap();

    inputs.set_value("username", "john");
    let fields = futures::executor::block_on(form.validate_fields(&[])).unwrap();

    assert_eq!(fields.len(), 1);
    assert_eq!(availability.status(), AsyncStatus::Idle);
    futures::executor::block_on(form.wait_for_async_checks());
    assert!(form.is_valid());
}
