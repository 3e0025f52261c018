//! # Signals, Scopes, and the Scheduler
//!
//! `repose-core` is the small reactive runtime the form layer is built on.
//! There are three main pieces:
//!
//! - `Signal<T>`: observable value with keyed subscribers.
//! - `Scope` / `Dispose`: lifecycle-bound cleanup.
//! - `Scheduler`: a cooperative, single-threaded event loop with microtasks,
//!   local futures, and frames.
//!
//! ## Signals
//!
//! `Signal<T>` is a cloneable handle to a piece of state:
//!
//! ```rust
//! use repose_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! `watch` returns a `Dispose` guard instead of a raw subscription id, which
//! makes it easy to hand the cleanup to a scope:
//!
//! ```rust
//! use repose_core::*;
//!
//! let name = signal(String::from("Jane"));
//! let scope = Scope::new();
//! scope.run(|| {
//!     effect({
//!         let name = name.clone();
//!         move || name.watch(|v| log::info!("name is now {v}"))
//!     });
//! });
//! assert_eq!(name.subscriber_count(), 1);
//! scope.dispose();
//! assert_eq!(name.subscriber_count(), 0);
//! ```
//!
//! ## Scheduler
//!
//! The scheduler never runs anything on its own. The host calls
//! `dispatch` for each UI event; the event handler runs synchronously and
//! everything it queued (microtasks, futures, frames) is drained before
//! `dispatch` returns:
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use repose_core::*;
//!
//! let scheduler = Scheduler::new();
//! let rendered = Rc::new(Cell::new(0));
//! let _frame = scheduler.on_frame({
//!     let rendered = rendered.clone();
//!     move || rendered.set(rendered.get() + 1)
//! });
//!
//! scheduler
//!     .dispatch(|| {
//!         scheduler.request_frame();
//!         scheduler.request_frame();
//!     })
//!     .unwrap();
//! assert_eq!(rendered.get(), 1);
//! ```
//!
//! Futures spawned with `spawn_local` are polled during a flush; when they
//! wait on something external (a timer, a response), call `flush` again once
//! it is ready.

pub mod effects;
pub mod error;
pub mod prelude;
pub mod runtime;
pub mod scope;
pub mod signal;

pub use effects::*;
pub use error::*;
pub use prelude::*;
pub use runtime::*;
pub use scope::*;
pub use signal::*;
