//! # Adaptive forms
//!
//! `repose-form` sits between a raw value store and the UI that renders it.
//! A mounted form hands its children a [`FormContext`] on every frame, with
//! an [`AdapterState`] that tracks:
//!
//! - `is_submitting` / `is_submitted`: the lifecycle of the latest
//!   submission attempt;
//! - `submitter`: which element triggered the submission, visible for the
//!   frame right after the trigger and cleared afterwards;
//! - `validation_request_count`: how many times `show_validation()` was
//!   called since the last `hide_validation()`.
//!
//! ## Submitting
//!
//! The submit handler returns a future. Failure is explicit: call
//! `signal_failed_submission()` on the enhancer and the attempt ends with
//! `is_submitted == false`. An `Err` from the handler is logged but does not
//! by itself mark the attempt as failed.
//!
//! ```rust
//! use futures::channel::oneshot;
//! use repose_core::Scheduler;
//! use repose_form::*;
//!
//! let scheduler = Scheduler::new();
//! let (reply_tx, reply_rx) = oneshot::channel::<bool>();
//! let reply_rx = std::cell::RefCell::new(Some(reply_rx));
//!
//! let form = AdaptiveForm::new()
//!     .on_submit(move |_values, enhancer| {
//!         let reply = reply_rx.borrow_mut().take();
//!         async move {
//!             let accepted = match reply {
//!                 Some(rx) => rx.await.unwrap_or(false),
//!                 None => false,
//!             };
//!             if !accepted {
//!                 enhancer.signal_failed_submission();
//!             }
//!             Ok(())
//!         }
//!     })
//!     .mount(&scheduler, |_ctx| {});
//!
//! scheduler.dispatch(|| form.handle_submit("save")).unwrap();
//! assert!(form.adapter().is_submitting);
//! assert_eq!(form.adapter().submitter, None);
//!
//! reply_tx.send(false).unwrap();
//! scheduler.flush().unwrap();
//! let state = form.adapter();
//! assert!(!state.is_submitting && !state.is_submitted);
//! ```
//!
//! ## Batched changes
//!
//! Any number of `set_value` calls inside one event handler are delivered to
//! `on_change` once each, in call order, when the handler yields. Each call
//! sees the values as they stood right after it.

pub mod adapter;
pub mod error;
pub mod form;
pub mod input;
pub mod notifier;
pub mod store;
pub mod submission;
pub mod validation;
pub mod value;

pub use adapter::{AdapterCore, AdapterState};
pub use error::SubmitError;
pub use form::{AdaptiveForm, ChangeHandler, FormContext, FormHandle, SubmitHandler};
pub use input::InputProps;
pub use notifier::{Batch, ChangeNotifier, ChangeRecord};
pub use store::{MemoryStore, Validator, ValueStore};
pub use submission::{AttemptId, AttemptOutcome, SubmissionCoordinator, SubmitEnhancer, Submitter};
pub use validation::ValidationVisibility;
pub use value::{FieldChange, FieldErrors, FieldValue, FormValues};
