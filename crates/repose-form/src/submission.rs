use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::error::SubmitError;

/// Identity of the UI element that triggered a submission (which button).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Submitter(Rc<str>);

impl Submitter {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Rc::from(id.as_ref()))
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Submitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Submitter").field(&self.id()).finish()
    }
}

impl fmt::Display for Submitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<&str> for Submitter {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

pub type AttemptId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed,
}

/// Per-attempt failure latch. Read once, when the attempt settles.
#[derive(Debug)]
struct AttemptLatch {
    id: AttemptId,
    failed: Cell<bool>,
    settled: Cell<bool>,
}

/// Handed to the submit handler alongside the values.
#[derive(Clone)]
pub struct SubmitEnhancer {
    submitter: Option<Submitter>,
    latch: Rc<AttemptLatch>,
}

impl SubmitEnhancer {
    pub fn submitter(&self) -> Option<&Submitter> {
        self.submitter.as_ref()
    }

    pub fn attempt(&self) -> AttemptId {
        self.latch.id
    }

    /// Marks this attempt as failed. One-shot: repeated calls are no-ops, and
    /// calls after the attempt settled are ignored.
    pub fn signal_failed_submission(&self) {
        if self.latch.settled.get() {
            log::debug!(
                "form: failure signal for attempt {} arrived after it settled; ignoring",
                self.latch.id
            );
            return;
        }
        if !self.latch.failed.replace(true) {
            log::debug!("form: attempt {} signalled as failed", self.latch.id);
        }
    }

    pub fn is_failure_signalled(&self) -> bool {
        self.latch.failed.get()
    }
}

impl fmt::Debug for SubmitEnhancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitEnhancer")
            .field("submitter", &self.submitter)
            .field("attempt", &self.latch.id)
            .field("failed", &self.latch.failed.get())
            .finish()
    }
}

/// Owns `is_submitting`, `is_submitted` and `submitter`.
///
/// Only the most recent attempt drives the flags: an attempt that settles
/// after a newer one started is ignored.
#[derive(Debug, Default)]
pub struct SubmissionCoordinator {
    is_submitting: bool,
    is_submitted: bool,
    submitter: Option<Submitter>,
    /// A trigger no frame has shown yet.
    trigger_unseen: bool,
    /// The submitter was part of the frame being rendered.
    trigger_shown: bool,
    current: Option<Rc<AttemptLatch>>,
    next_attempt: AttemptId,
}

impl SubmissionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_submitted(&self) -> bool {
        self.is_submitted
    }

    pub fn submitter(&self) -> Option<&Submitter> {
        self.submitter.as_ref()
    }

    /// Records who triggered the submission. The identity lives until the end
    /// of the first frame that starts after this call.
    pub fn record_trigger(&mut self, trigger: Option<Submitter>) {
        self.submitter = trigger;
        self.trigger_unseen = true;
        self.trigger_shown = false;
    }

    /// Starts a new attempt with a fresh latch.
    pub fn begin(&mut self) -> SubmitEnhancer {
        let id = self.next_attempt;
        self.next_attempt += 1;

        if let Some(prev) = self.current.take() {
            log::debug!("form: attempt {} superseded by attempt {id}", prev.id);
        }

        let latch = Rc::new(AttemptLatch {
            id,
            failed: Cell::new(false),
            settled: Cell::new(false),
        });
        self.current = Some(latch.clone());
        self.is_submitting = true;
        self.is_submitted = false;

        SubmitEnhancer {
            submitter: self.submitter.clone(),
            latch,
        }
    }

    /// Settles an attempt. Returns `None` when the attempt was superseded and
    /// left the flags alone.
    pub fn settle(
        &mut self,
        enhancer: &SubmitEnhancer,
        result: Result<(), SubmitError>,
    ) -> Option<AttemptOutcome> {
        let latch = &enhancer.latch;
        if latch.settled.replace(true) {
            return None;
        }

        if let Err(err) = &result {
            log::warn!("form: attempt {}: {err}", latch.id);
        }

        let outcome = if latch.failed.get() {
            AttemptOutcome::Failed
        } else {
            AttemptOutcome::Succeeded
        };

        match &self.current {
            Some(current) if Rc::ptr_eq(current, latch) => {}
            _ => {
                log::debug!(
                    "form: attempt {} settled ({outcome:?}) after being superseded",
                    latch.id
                );
                return None;
            }
        }

        self.current = None;
        self.is_submitting = false;
        self.is_submitted = outcome == AttemptOutcome::Succeeded;
        log::debug!("form: attempt {} settled: {outcome:?}", latch.id);
        Some(outcome)
    }

    /// Start of a frame, before its snapshot is taken.
    pub fn begin_frame(&mut self) {
        if std::mem::take(&mut self.trigger_unseen) {
            self.trigger_shown = true;
        }
    }

    /// Frame boundary. Returns `true` when a submitter was cleared, so the
    /// caller can render the cleared state. A trigger recorded while the
    /// frame was rendering survives until the end of the next one.
    pub fn end_frame(&mut self) -> bool {
        if !std::mem::take(&mut self.trigger_shown) {
            return false;
        }
        self.submitter.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_sets_submitted() {
        let mut c = SubmissionCoordinator::new();
        c.record_trigger(Some("save".into()));
        let e = c.begin();
        assert!(c.is_submitting());
        assert!(!c.is_submitted());
        assert_eq!(e.submitter(), Some(&Submitter::new("save")));

        assert_eq!(c.settle(&e, Ok(())), Some(AttemptOutcome::Succeeded));
        assert!(!c.is_submitting());
        assert!(c.is_submitted());
    }

    #[test]
    fn signalled_failure_is_one_shot_and_scoped() {
        let mut c = SubmissionCoordinator::new();
        let first = c.begin();
        first.signal_failed_submission();
        first.signal_failed_submission();
        assert_eq!(c.settle(&first, Ok(())), Some(AttemptOutcome::Failed));
        assert!(!c.is_submitting());
        assert!(!c.is_submitted());

        // Late signal after settling does nothing to the next attempt.
        first.signal_failed_submission();
        let second = c.begin();
        assert!(!second.is_failure_signalled());
        assert_eq!(c.settle(&second, Ok(())), Some(AttemptOutcome::Succeeded));
        assert!(c.is_submitted());
    }

    #[test]
    fn rejection_without_signal_counts_as_submitted() {
        let mut c = SubmissionCoordinator::new();
        let e = c.begin();
        let outcome = c.settle(&e, Err(SubmitError::Rejected(anyhow::anyhow!("offline"))));
        assert_eq!(outcome, Some(AttemptOutcome::Succeeded));
        assert!(c.is_submitted());
    }

    #[test]
    fn superseded_attempt_is_ignored() {
        let mut c = SubmissionCoordinator::new();
        let old = c.begin();
        let new = c.begin();
        assert_ne!(old.attempt(), new.attempt());

        assert_eq!(c.settle(&old, Ok(())), None);
        assert!(c.is_submitting());
        assert!(!c.is_submitted());

        new.signal_failed_submission();
        assert_eq!(c.settle(&new, Ok(())), Some(AttemptOutcome::Failed));
        assert!(!c.is_submitting());
    }

    #[test]
    fn settling_twice_is_noop() {
        let mut c = SubmissionCoordinator::new();
        let e = c.begin();
        assert!(c.settle(&e, Ok(())).is_some());
        assert!(c.settle(&e, Ok(())).is_none());
    }

    #[test]
    fn submitter_clears_after_one_frame() {
        let mut c = SubmissionCoordinator::new();
        assert!(!c.end_frame());

        c.record_trigger(Some("a".into()));
        let _pending = c.begin();
        assert_eq!(c.submitter(), Some(&Submitter::new("a")));
        c.begin_frame();
        assert!(c.end_frame());
        assert_eq!(c.submitter(), None);
        assert!(c.is_submitting());
        c.begin_frame();
        assert!(!c.end_frame());
    }

    #[test]
    fn trigger_during_frame_waits_for_next_frame() {
        let mut c = SubmissionCoordinator::new();

        c.begin_frame();
        c.record_trigger(Some("a".into()));
        assert!(!c.end_frame());
        assert_eq!(c.submitter(), Some(&Submitter::new("a")));

        c.begin_frame();
        assert!(c.end_frame());
        assert_eq!(c.submitter(), None);
    }
}
