use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use slotmap::{SlotMap, new_key_type};

use crate::Dispose;
use crate::error::RuntimeError;

new_key_type! {
    pub struct FrameId;
}

pub const DEFAULT_MAX_FLUSH_PASSES: usize = 1024;

type Microtask = Box<dyn FnOnce()>;

/// Single-threaded cooperative event loop.
///
/// Work reaches the scheduler three ways, drained in this order on every
/// flush pass:
///
/// - microtasks, queued with [`Scheduler::queue_microtask`], run as soon as
///   the current synchronous work yields;
/// - local futures, spawned with [`Scheduler::spawn_local`], polled on a
///   `LocalPool` (microtasks are drained after each completed future);
/// - frames, requested with [`Scheduler::request_frame`], which run every
///   callback registered with [`Scheduler::on_frame`]. A frame is the
///   render boundary: state changes become visible to renderers here.
///
/// Nothing runs in the background: the host drives the loop by calling
/// [`Scheduler::dispatch`] for each UI event or [`Scheduler::flush`] when a
/// timer or I/O completion woke a task.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

struct SchedulerInner {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    microtasks: RefCell<VecDeque<Microtask>>,
    frames: RefCell<SlotMap<FrameId, Rc<dyn Fn()>>>,
    frame_requested: Cell<bool>,
    flushing: Cell<bool>,
    frame_count: Cell<u64>,
    max_passes: usize,
}

/// What a single [`Scheduler::flush`] call ran.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub microtasks: usize,
    pub tasks_completed: usize,
    pub frames: usize,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_max_flush_passes(DEFAULT_MAX_FLUSH_PASSES)
    }

    /// A pass that keeps producing work (a renderer that writes state on
    /// every frame, say) is cut off after `max_passes` and reported as
    /// [`RuntimeError::FlushLimit`].
    pub fn with_max_flush_passes(max_passes: usize) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            inner: Rc::new(SchedulerInner {
                pool: RefCell::new(pool),
                spawner,
                microtasks: RefCell::new(VecDeque::new()),
                frames: RefCell::new(SlotMap::with_key()),
                frame_requested: Cell::new(false),
                flushing: Cell::new(false),
                frame_count: Cell::new(0),
                max_passes: max_passes.max(1),
            }),
        }
    }

    pub fn spawn_local(&self, fut: impl Future<Output = ()> + 'static) -> Result<(), RuntimeError> {
        self.inner.spawner.spawn_local(fut)?;
        Ok(())
    }

    pub fn queue_microtask(&self, f: impl FnOnce() + 'static) {
        self.inner.microtasks.borrow_mut().push_back(Box::new(f));
    }

    /// Coalesces: any number of requests before the next pass yield one frame.
    pub fn request_frame(&self) {
        self.inner.frame_requested.set(true);
    }

    /// Registers a frame callback; running the returned guard removes it.
    pub fn on_frame(&self, f: impl Fn() + 'static) -> Dispose {
        let id = self.inner.frames.borrow_mut().insert(Rc::new(f));
        let weak = Rc::downgrade(&self.inner);
        Dispose::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.frames.borrow_mut().remove(id);
            }
        })
    }

    pub fn frame_count(&self) -> u64 {
        self.inner.frame_count.get()
    }

    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.get()
    }

    /// Runs one UI event handler, then flushes everything it scheduled.
    ///
    /// Called from inside a flush (a renderer reacting to a frame, say) the
    /// handler runs immediately and its work is picked up by the flush that
    /// is already in progress.
    pub fn dispatch<R>(&self, event: impl FnOnce() -> R) -> Result<R, RuntimeError> {
        let result = event();
        self.flush()?;
        Ok(result)
    }

    pub fn flush(&self) -> Result<FlushStats, RuntimeError> {
        if self.inner.flushing.replace(true) {
            return Ok(FlushStats::default());
        }
        let _guard = FlushGuard(&self.inner.flushing);
        self.flush_passes()
    }

    fn flush_passes(&self) -> Result<FlushStats, RuntimeError> {
        let mut stats = FlushStats::default();

        for _ in 0..self.inner.max_passes {
            let mut progressed = false;

            let ran = self.drain_microtasks();
            stats.microtasks += ran;
            progressed |= ran > 0;

            while self.run_one_task() {
                stats.tasks_completed += 1;
                progressed = true;
                stats.microtasks += self.drain_microtasks();
            }

            // Stalled tasks may still have queued work while being polled.
            let ran = self.drain_microtasks();
            stats.microtasks += ran;
            progressed |= ran > 0;

            if self.inner.frame_requested.replace(false) {
                self.run_frame();
                stats.frames += 1;
                progressed = true;
            }

            if !progressed {
                return Ok(stats);
            }
        }

        log::warn!(
            "scheduler: still busy after {} flush passes; giving up",
            self.inner.max_passes
        );
        Err(RuntimeError::FlushLimit {
            passes: self.inner.max_passes,
        })
    }

    fn drain_microtasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.inner.microtasks.borrow_mut().pop_front();
            let Some(task) = next else {
                return ran;
            };
            task();
            ran += 1;
        }
    }

    fn run_one_task(&self) -> bool {
        self.inner.pool.borrow_mut().try_run_one()
    }

    fn run_frame(&self) {
        let callbacks: Vec<Rc<dyn Fn()>> = self.inner.frames.borrow().values().cloned().collect();
        self.inner
            .frame_count
            .set(self.inner.frame_count.get().wrapping_add(1));
        for cb in callbacks {
            cb();
        }
    }
}

/// Clears the flushing flag even when a callback unwinds out of a flush.
struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
