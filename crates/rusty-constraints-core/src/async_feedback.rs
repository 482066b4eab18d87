// File: rusty-constraints-core/src/async_feedback.rs
// Purpose: Rules backed by an async check, rendering their feedback on settlement

use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, Weak};
use tokio::runtime::Handle;

use crate::error::ConfigError;
use crate::field::{Field, FieldValidation};
use crate::field_feedback::{FieldFeedback, FieldFeedbackProps};
use crate::field_feedbacks::FieldFeedbacks;
use crate::form::{FieldLifecycle, FieldListener, ValidateEmitter, ValidateListener};
use crate::input::InputSnapshot;
use crate::key::FeedbackKey;
use crate::lock;

/// State of the latest check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncStatus<T, E> {
    Idle,
    Pending,
    Resolved(T),
    Rejected(E),
}

type CheckFn<T, E> = dyn Fn(String) -> BoxFuture<'static, Result<T, E>> + Send + Sync;
type RenderFn<V> = dyn Fn(&V) -> Vec<FieldFeedbackProps> + Send + Sync;

/// Declaration of an async rule
///
/// `then` and `catch` return the rules to mount for a settlement; those rules
/// are then evaluated against the input that was checked.
pub struct AsyncProps<T, E> {
    check: Arc<CheckFn<T, E>>,
    then: Option<Arc<RenderFn<T>>>,
    catch: Option<Arc<RenderFn<E>>>,
}

impl<T: 'static, E: 'static> AsyncProps<T, E> {
    pub fn new<F, Fut>(check: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            check: Arc::new(move |value: String| -> BoxFuture<'static, Result<T, E>> {
                check(value).boxed()
            }),
            then: None,
            catch: None,
        }
    }

    pub fn then(mut self, render: impl Fn(&T) -> Vec<FieldFeedbackProps> + Send + Sync + 'static) -> Self {
        self.then = Some(Arc::new(render));
        self
    }

    pub fn catch(mut self, render: impl Fn(&E) -> Vec<FieldFeedbackProps> + Send + Sync + 'static) -> Self {
        self.catch = Some(Arc::new(render));
        self
    }
}

struct AsyncState<T, E> {
    /// Bumped by every check and every reset; a settlement carrying an older
    /// token is stale
    token: u64,
    status: AsyncStatus<T, E>,
    children: Vec<Arc<FieldFeedback>>,
}

/// A mounted async rule
///
/// The check runs on the tokio runtime, so validation passes do not wait for
/// it; [`FormWithConstraints::wait_for_async_checks`](crate::FormWithConstraints::wait_for_async_checks)
/// does. The latest check wins: results of superseded checks are dropped.
pub struct AsyncFeedback<T, E> {
    group: Arc<FieldFeedbacks>,
    props: AsyncProps<T, E>,
    emitter: Arc<ValidateEmitter>,
    state: Mutex<AsyncState<T, E>>,
    validate_listener: Arc<ValidateListener>,
    reset_listener: Arc<FieldListener>,
}

impl<T, E> AsyncFeedback<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Mount an async rule in `group`
    ///
    /// Checks are spawned on the tokio runtime the validation pass runs on.
    /// A pass driven outside a tokio runtime leaves the rule `Idle` and logs an
    /// error instead of starting the check.
    pub fn mount(group: &Arc<FieldFeedbacks>, props: AsyncProps<T, E>) -> Result<Arc<Self>, ConfigError> {
        let rule = Arc::new_cyclic(|weak: &Weak<AsyncFeedback<T, E>>| {
            let on_validate = weak.clone();
            let validate_listener: Arc<ValidateListener> =
                Arc::new(move |input: InputSnapshot| -> BoxFuture<'static, Vec<FieldValidation>> {
                    if let Some(rule) = on_validate.upgrade() {
                        rule.validate(&input);
                    }
                    future::ready(Vec::new()).boxed()
                });

            let on_reset = weak.clone();
            let reset_listener: Arc<FieldListener> = Arc::new(move |_: &Field| {
                if let Some(rule) = on_reset.upgrade() {
                    rule.reset();
                }
            });

            AsyncFeedback {
                group: group.clone(),
                props,
                emitter: Arc::new(ValidateEmitter::new()),
                state: Mutex::new(AsyncState {
                    token: 0,
                    status: AsyncStatus::Idle,
                    children: Vec::new(),
                }),
                validate_listener,
                reset_listener,
            }
        });

        let field_name = group.field_name().to_string();
        group
            .emitter()
            .add_listener(field_name.clone(), rule.validate_listener.clone())?;
        group
            .form()
            .subscribe(FieldLifecycle::DidReset, field_name, rule.reset_listener.clone())?;

        Ok(rule)
    }

    /// Start a check for `input`, superseding any pending one
    ///
    /// When the group's stop policy already ended evaluation, or no tokio
    /// runtime is running, the pending check is abandoned instead.
    fn validate(self: &Arc<Self>, input: &InputSnapshot) {
        if input.name != self.group.field_name() {
            return;
        }

        if self.group.stop_reached() {
            tracing::debug!("Async check for '{}' skipped by the stop policy", input.name);
            self.abandon();
            return;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!("Async check for '{}' needs a tokio runtime: {}", input.name, e);
                self.abandon();
                return;
            }
        };

        let token = {
            let mut state = lock(&self.state);
            state.token += 1;
            state.status = AsyncStatus::Pending;
            state.token
        };
        tracing::debug!("Async check #{} started for '{}'", token, input.name);

        let check = (self.props.check)(input.value.clone());
        let rule = Arc::downgrade(self);
        let input = input.clone();

        let handle = runtime.spawn(async move {
            let result = check.await;
            match rule.upgrade() {
                Some(rule) => rule.settle(token, input, result).await,
                None => tracing::debug!("Async feedback for '{}' unmounted before its check settled", input.name),
            }
        });
        self.group.form().track_async_check(handle);
    }

    /// Record the settlement, then mount and evaluate the rendered rules
    ///
    /// Runs under the form's pass lock, so no validation pass can clear the
    /// field between the token check and the recording of the rendered rules.
    async fn settle(&self, token: u64, input: InputSnapshot, result: Result<T, E>) {
        let form = self.group.form();
        let _pass = form.lock_passes().await;

        {
            let mut state = lock(&self.state);
            if state.token != token {
                tracing::debug!("Discarding stale async check #{} for '{}'", token, input.name);
                return;
            }
            state.status = match &result {
                Ok(value) => AsyncStatus::Resolved(value.clone()),
                Err(error) => AsyncStatus::Rejected(error.clone()),
            };
        }

        let declarations = match &result {
            Ok(value) => self.props.then.as_ref().map(|render| render(value)),
            Err(error) => self.props.catch.as_ref().map(|render| render(error)),
        }
        .unwrap_or_default();

        let mut children = Vec::with_capacity(declarations.len());
        for props in declarations {
            match FieldFeedback::mount_on(&self.group, &self.emitter, props) {
                Ok(child) => children.push(child),
                Err(e) => tracing::error!("Invalid feedback rendered by async check for '{}': {}", input.name, e),
            }
        }
        let keys: Vec<FeedbackKey> = children.iter().map(|child| child.key().clone()).collect();

        let previous = {
            let mut state = lock(&self.state);
            if state.token != token {
                tracing::debug!("Async check #{} for '{}' superseded while rendering", token, input.name);
                return;
            }
            std::mem::replace(&mut state.children, children)
        };
        drop(previous);

        let name = input.name.clone();
        let outcomes: Vec<FieldValidation> = self
            .emitter
            .emit_async(&name, input)
            .await
            .into_iter()
            .flatten()
            .collect();

        // A reset is synchronous and does not wait for the pass lock
        if lock(&self.state).token != token {
            tracing::debug!("Async check #{} for '{}' reset while recording", token, name);
            form.fields_store().remove_validations(&name, &keys);
            return;
        }

        tracing::debug!("Async check #{} for '{}' settled: {:?}", token, name, outcomes);
        form.emit_field_did_validate(&name);
    }

    fn reset(&self) {
        self.abandon();
    }

    /// Supersede any pending check and unmount the rendered rules
    fn abandon(&self) {
        let children = {
            let mut state = lock(&self.state);
            state.token += 1;
            state.status = AsyncStatus::Idle;
            std::mem::take(&mut state.children)
        };
        drop(children);
    }

    pub fn status(&self) -> AsyncStatus<T, E> {
        lock(&self.state).status.clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(lock(&self.state).status, AsyncStatus::Pending)
    }

    /// Rules rendered by the latest settlement
    pub fn children(&self) -> Vec<Arc<FieldFeedback>> {
        lock(&self.state).children.clone()
    }

    pub fn group(&self) -> &Arc<FieldFeedbacks> {
        &self.group
    }
}

impl<T, E> Drop for AsyncFeedback<T, E> {
    fn drop(&mut self) {
        let field_name = self.group.field_name().to_string();

        if let Err(e) = self
            .group
            .emitter()
            .remove_listener(&field_name, &self.validate_listener)
        {
            tracing::debug!("Async feedback for '{}' was not listening: {}", field_name, e);
        }
        if let Err(e) = self
            .group
            .form()
            .unsubscribe(FieldLifecycle::DidReset, &field_name, &self.reset_listener)
        {
            tracing::debug!("Async feedback for '{}' was not subscribed: {}", field_name, e);
        }
    }
}

impl<T, E> fmt::Debug for AsyncFeedback<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("AsyncFeedback")
            .field("field", &self.group.field_name())
            .field("token", &state.token)
            .field("children", &state.children.len())
            .finish_non_exhaustive()
    }
}
