use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use repose_core::{Dispose, Scheduler, Scope, Signal, effect, signal};

use crate::adapter::{AdapterCore, AdapterState};
use crate::error::{SubmitError, panic_message};
use crate::input::InputProps;
use crate::notifier::{Batch, ChangeNotifier};
use crate::store::{MemoryStore, Validator, ValueStore};
use crate::submission::{SubmitEnhancer, Submitter};
use crate::value::{FieldChange, FieldErrors, FieldValue, FormValues};

pub type ChangeHandler = Rc<dyn Fn(&FieldChange, &FormValues, bool)>;
pub type SubmitHandler =
    Rc<dyn Fn(FormValues, SubmitEnhancer) -> LocalBoxFuture<'static, anyhow::Result<()>>>;

type Children = Box<dyn Fn(&FormContext)>;

/// Builder for a mounted adaptive form.
///
/// ```rust
/// use repose_core::Scheduler;
/// use repose_form::*;
///
/// let scheduler = Scheduler::new();
/// let form = AdaptiveForm::new()
///     .initial_values([("email", "")])
///     .on_submit(|values, _enhancer| async move {
///         log::info!("submitting {values:?}");
///         Ok(())
///     })
///     .mount(&scheduler, |ctx| {
///         let _ = ctx.adapter.is_submitting;
///     });
///
/// scheduler
///     .dispatch(|| form.handle_submit(Submitter::new("save")))
///     .unwrap();
/// assert!(form.adapter().is_submitted);
/// ```
pub struct AdaptiveForm {
    store: Option<Box<dyn ValueStore>>,
    initial_values: FormValues,
    validator: Option<Validator>,
    on_change: Option<ChangeHandler>,
    on_submit: Option<SubmitHandler>,
}

impl Default for AdaptiveForm {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveForm {
    pub fn new() -> Self {
        Self {
            store: None,
            initial_values: FormValues::new(),
            validator: None,
            on_change: None,
            on_submit: None,
        }
    }

    pub fn initial_values<K, V>(mut self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.initial_values = values.into_iter().collect();
        self
    }

    pub fn validate(mut self, f: impl Fn(&FormValues) -> FieldErrors + 'static) -> Self {
        self.validator = Some(Rc::new(f));
        self
    }

    /// Uses a custom store; `initial_values` and `validate` are then ignored.
    pub fn store(mut self, store: impl ValueStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn on_change(mut self, f: impl Fn(&FieldChange, &FormValues, bool) + 'static) -> Self {
        self.on_change = Some(Rc::new(f));
        self
    }

    pub fn on_submit<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(FormValues, SubmitEnhancer) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.on_submit = Some(Rc::new(
            move |values: FormValues,
                  enhancer: SubmitEnhancer|
                  -> LocalBoxFuture<'static, anyhow::Result<()>> {
                f(values, enhancer).boxed_local()
            },
        ));
        self
    }

    /// Mounts the form, rendering `children` once right away and then on
    /// every frame a form action requests.
    pub fn mount(self, scheduler: &Scheduler, children: impl Fn(&FormContext) + 'static) -> FormHandle {
        let AdaptiveForm {
            store,
            initial_values,
            validator,
            on_change,
            on_submit,
        } = self;

        let store: Box<dyn ValueStore> = match store {
            Some(store) => {
                if !initial_values.is_empty() || validator.is_some() {
                    log::debug!("form: custom store given; ignoring initial values and validator");
                }
                store
            }
            None => match validator {
                Some(validator) => Box::new(MemoryStore::with_validator(initial_values, validator)),
                None => Box::new(MemoryStore::always_valid(initial_values)),
            },
        };

        let on_submit: SubmitHandler = match on_submit {
            Some(on_submit) => on_submit,
            None => Rc::new(submit_nothing),
        };

        let inner = Rc::new(FormInner {
            scheduler: scheduler.clone(),
            scope: Scope::new(),
            store: RefCell::new(store),
            notifier: RefCell::new(ChangeNotifier::new()),
            adapter: RefCell::new(AdapterCore::default()),
            published: signal(AdapterState::default()),
            on_change,
            on_submit,
            children: Box::new(children),
            mounted: Cell::new(true),
        });

        inner.scope.run(|| {
            let weak = Rc::downgrade(&inner);
            let scheduler = scheduler.clone();
            effect(move || {
                scheduler.on_frame(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.render();
                    }
                })
            });
        });
        inner.scope.add_disposer({
            let weak = Rc::downgrade(&inner);
            move || {
                if let Some(inner) = weak.upgrade() {
                    inner.mounted.set(false);
                    inner.notifier.borrow_mut().take_batch();
                }
            }
        });

        log::debug!(
            "form: mounted with {} field(s)",
            inner.store.borrow().values().len()
        );
        inner.render();

        FormHandle { inner }
    }
}

fn submit_nothing(_: FormValues, _: SubmitEnhancer) -> LocalBoxFuture<'static, anyhow::Result<()>> {
    futures::future::ready(Ok(())).boxed_local()
}

struct FormInner {
    scheduler: Scheduler,
    scope: Scope,
    store: RefCell<Box<dyn ValueStore>>,
    notifier: RefCell<ChangeNotifier>,
    adapter: RefCell<AdapterCore>,
    published: Signal<AdapterState>,
    on_change: Option<ChangeHandler>,
    on_submit: SubmitHandler,
    children: Children,
    mounted: Cell<bool>,
}

impl FormInner {
    fn is_live(&self, action: &str) -> bool {
        if !self.mounted.get() {
            log::debug!("form: {action} on an unmounted form; ignoring");
        }
        self.mounted.get()
    }

    /// Store values plus any writes still waiting in the open batch.
    fn current_values(&self) -> FormValues {
        if let Some(staged) = self.notifier.borrow().staged() {
            return staged.clone();
        }
        self.store.borrow().values()
    }

    fn context(self: &Rc<Self>) -> FormContext {
        let adapter = self.adapter.borrow().snapshot();
        let values = self.current_values();
        let errors = self.store.borrow().validate(&values);
        FormContext {
            adapter,
            is_valid_form: errors.is_empty(),
            values,
            errors,
            handle: FormHandle {
                inner: self.clone(),
            },
        }
    }

    fn render(self: &Rc<Self>) {
        if !self.mounted.get() {
            return;
        }
        self.adapter.borrow_mut().submission.begin_frame();
        let ctx = self.context();
        self.published.set(ctx.adapter.clone());
        // A subscriber may have unmounted the form.
        if !self.mounted.get() {
            return;
        }
        (self.children)(&ctx);

        if self.adapter.borrow_mut().submission.end_frame() {
            self.scheduler.request_frame();
        }
    }

    fn set_value(self: &Rc<Self>, name: &str, value: FieldValue) {
        if !self.is_live("set_value") {
            return;
        }

        let opened = {
            let store = self.store.borrow();
            self.notifier
                .borrow_mut()
                .record(|| store.values(), name, value.clone())
        };
        self.store.borrow_mut().set_value(name, value);

        if opened {
            let weak = Rc::downgrade(self);
            self.scheduler.queue_microtask(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.flush_changes();
                }
            });
        }
    }

    fn flush_changes(&self) {
        let Some(batch) = self.notifier.borrow_mut().take_batch() else {
            return;
        };
        self.reconcile(&batch);

        for record in &batch.records {
            let is_valid = self.store.borrow().validate(&record.values).is_empty();
            if let Some(on_change) = &self.on_change {
                on_change(&record.change, &record.values, is_valid);
            }
        }

        self.scheduler.request_frame();
    }

    /// Writes back any batched field the store lost while coalescing.
    fn reconcile(&self, batch: &Batch) {
        let mut store = self.store.borrow_mut();
        store.commit();

        let current = store.values();
        let mut merged = current.clone();
        for name in batch.touched_names() {
            merged.set(name, batch.values.value(name));
        }

        if merged != current {
            log::debug!(
                "form: store lost writes from a batch of {}; reconciling",
                batch.records.len()
            );
            store.set_values(merged);
        }
    }

    fn submit(self: &Rc<Self>, trigger: Option<Submitter>) {
        if !self.is_live("handle_submit") {
            return;
        }

        self.adapter
            .borrow_mut()
            .submission
            .record_trigger(trigger);
        self.scheduler.request_frame();

        let values = self.current_values();
        let errors = {
            let mut store = self.store.borrow_mut();
            store.touch_all();
            store.validate(&values)
        };
        if !errors.is_empty() {
            log::debug!(
                "form: submission blocked by {} invalid field(s)",
                errors.len()
            );
            return;
        }

        let enhancer = self.adapter.borrow_mut().submission.begin();
        log::debug!(
            "form: attempt {} started by {:?}",
            enhancer.attempt(),
            enhancer.submitter()
        );

        let invoked = catch_unwind(AssertUnwindSafe(|| {
            (self.on_submit)(values, enhancer.clone())
        }));
        let fut = match invoked {
            Ok(fut) => fut,
            Err(payload) => {
                self.finish_submission(&enhancer, Err(SubmitError::Panicked(panic_message(payload))));
                return;
            }
        };

        let weak = Rc::downgrade(self);
        let task_enhancer = enhancer.clone();
        let task = async move {
            let result = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(SubmitError::Rejected(err)),
                Err(payload) => Err(SubmitError::Panicked(panic_message(payload))),
            };
            match weak.upgrade() {
                Some(inner) => inner.finish_submission(&task_enhancer, result),
                None => log::debug!(
                    "form: dropped before attempt {} settled",
                    task_enhancer.attempt()
                ),
            }
        };

        if let Err(err) = self.scheduler.spawn_local(task) {
            self.finish_submission(&enhancer, Err(err.into()));
        }
    }

    fn finish_submission(&self, enhancer: &SubmitEnhancer, result: Result<(), SubmitError>) {
        if !self.mounted.get() {
            log::debug!(
                "form: attempt {} settled after unmount",
                enhancer.attempt()
            );
            return;
        }
        let outcome = self.adapter.borrow_mut().submission.settle(enhancer, result);
        if outcome.is_some() {
            self.scheduler.request_frame();
        }
    }
}

/// Cloneable handle to a mounted form: the adapter's read and action surface.
#[derive(Clone)]
pub struct FormHandle {
    inner: Rc<FormInner>,
}

impl FormHandle {
    /// Live adapter state. Renderers see the same data, but only at frames.
    pub fn adapter(&self) -> AdapterState {
        self.inner.adapter.borrow().snapshot()
    }

    pub fn values(&self) -> FormValues {
        self.inner.current_values()
    }

    pub fn value(&self, name: &str) -> FieldValue {
        self.values().value(name)
    }

    pub fn errors(&self) -> FieldErrors {
        let values = self.values();
        self.inner.store.borrow().validate(&values)
    }

    pub fn is_valid_form(&self) -> bool {
        self.errors().is_empty()
    }

    pub fn set_value(&self, name: &str, value: impl Into<FieldValue>) {
        self.inner.set_value(name, value.into());
    }

    /// Submits on behalf of the element `trigger`.
    pub fn handle_submit(&self, trigger: impl Into<Submitter>) {
        self.inner.submit(Some(trigger.into()));
    }

    /// Submits without a triggering element.
    pub fn submit(&self) {
        self.inner.submit(None);
    }

    pub fn show_validation(&self) {
        if !self.inner.is_live("show_validation") {
            return;
        }
        self.inner.adapter.borrow_mut().show_validation();
        self.inner.scheduler.request_frame();
    }

    pub fn hide_validation(&self) {
        if !self.inner.is_live("hide_validation") {
            return;
        }
        self.inner.adapter.borrow_mut().hide_validation();
        self.inner.scheduler.request_frame();
    }

    pub fn touch(&self, name: &str) {
        if !self.inner.is_live("touch") {
            return;
        }
        self.inner.store.borrow_mut().touch(name);
        self.inner.scheduler.request_frame();
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.inner.store.borrow().is_touched(name)
    }

    pub fn get_input_props(&self, name: &str) -> InputProps {
        let values = self.values();
        let value = values.value(name);
        let help = {
            let store = self.inner.store.borrow();
            if store.is_touched(name) {
                store.validate(&values).get(name).map(str::to_owned)
            } else {
                None
            }
        };
        InputProps::new(name, value, help, self.clone())
    }

    /// Observes the adapter state published at each render. The subscription
    /// also ends when the form unmounts.
    pub fn subscribe(&self, f: impl Fn(&AdapterState) + 'static) -> Dispose {
        let guard = self.inner.published.watch(f);
        let g = guard.clone();
        self.inner.scope.add_disposer(move || g.run());
        guard
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    /// Tears the form down: no more renders, later actions are ignored, and
    /// pending submissions settle silently.
    pub fn unmount(&self) {
        if !self.inner.mounted.get() {
            return;
        }
        log::debug!("form: unmounting");
        self.inner.scope.clone().dispose();
    }
}

impl fmt::Debug for FormHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormHandle")
            .field("adapter", &self.adapter())
            .field("values", &self.values())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

/// What `children` receive on every render.
#[derive(Clone)]
pub struct FormContext {
    pub adapter: AdapterState,
    pub values: FormValues,
    pub errors: FieldErrors,
    pub is_valid_form: bool,
    handle: FormHandle,
}

impl FormContext {
    pub fn handle(&self) -> &FormHandle {
        &self.handle
    }
}

impl fmt::Debug for FormContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormContext")
            .field("adapter", &self.adapter)
            .field("values", &self.values)
            .field("errors", &self.errors)
            .field("is_valid_form", &self.is_valid_form)
            .finish_non_exhaustive()
    }
}
