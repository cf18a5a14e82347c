//! Hierarchical progress reporting and cancellation

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Receives progress from a running change and exposes the caller's cancellation signal
pub trait ProgressMonitor {
    /// Start a task of `total_work` units
    fn begin_task(&mut self, name: &str, total_work: usize);

    /// Report fractional work; used when a sub-monitor scales its child's units
    fn internal_worked(&mut self, work: f64);

    /// Report whole units of work
    fn worked(&mut self, work: usize) {
        self.internal_worked(work as f64);
    }

    /// Name the step currently running
    fn sub_task(&mut self, _name: &str) {}

    /// Mark the task as finished
    fn done(&mut self);

    /// Whether the caller asked for cancellation
    fn is_cancelled(&self) -> bool;
}

/// Monitor that ignores all progress and is never cancelled
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressMonitor;

impl NullProgressMonitor {
    /// Create a new null monitor
    pub fn new() -> Self {
        NullProgressMonitor
    }
}

impl ProgressMonitor for NullProgressMonitor {
    fn begin_task(&mut self, _name: &str, _total_work: usize) {}

    fn internal_worked(&mut self, _work: f64) {}

    fn done(&mut self) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Root monitor that records progress and owns a cancellation token
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    task: String,
    total_work: usize,
    worked: f64,
    current_sub_task: Option<String>,
    begun: bool,
    finished: bool,
    cancel: CancellationToken,
}

impl ProgressTracker {
    /// Create a new tracker with a fresh cancellation token
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Create a tracker observing an existing cancellation token
    pub fn with_token(cancel: CancellationToken) -> Self {
        ProgressTracker {
            task: String::new(),
            total_work: 0,
            worked: 0.0,
            current_sub_task: None,
            begun: false,
            finished: false,
            cancel,
        }
    }

    /// A handle that can cancel the running operation
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Name passed to the first `begin_task`
    pub fn task_name(&self) -> &str {
        &self.task
    }

    /// Most recent sub task name
    pub fn current_sub_task(&self) -> Option<&str> {
        self.current_sub_task.as_deref()
    }

    /// Total units announced by `begin_task`
    pub fn total_work(&self) -> usize {
        self.total_work
    }

    /// Units of work reported so far
    pub fn work_done(&self) -> f64 {
        self.worked
    }

    /// Completed fraction in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total_work == 0 {
            return if self.finished { 1.0 } else { 0.0 };
        }
        (self.worked / self.total_work as f64).min(1.0)
    }

    /// Whether `done` was called
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressMonitor for ProgressTracker {
    fn begin_task(&mut self, name: &str, total_work: usize) {
        // nested begin_task calls on the root belong to the same task
        if self.begun {
            return;
        }
        self.begun = true;
        self.task = name.to_string();
        self.total_work = total_work;
        debug!(task = name, total_work, "Progress task started");
    }

    fn internal_worked(&mut self, work: f64) {
        if work <= 0.0 {
            return;
        }
        self.worked += work;
        if self.total_work > 0 {
            self.worked = self.worked.min(self.total_work as f64);
        }
    }

    fn sub_task(&mut self, name: &str) {
        self.current_sub_task = Some(name.to_string());
    }

    fn done(&mut self) {
        if self.finished {
            return;
        }
        self.worked = self.total_work as f64;
        self.finished = true;
        debug!(task = %self.task, "Progress task done");
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Delegates a slice of the parent's units to a child task
///
/// The child announces its own total with `begin_task`; every unit it reports
/// is scaled so that the child's whole task maps onto `parent_ticks` units of
/// the parent. `done` forwards whatever part of the slice is still unreported.
pub struct SubProgressMonitor<'a> {
    parent: &'a mut dyn ProgressMonitor,
    parent_ticks: usize,
    scale: f64,
    sent_to_parent: f64,
    nesting: usize,
}

impl<'a> SubProgressMonitor<'a> {
    /// Carve `parent_ticks` units out of `parent`
    pub fn new(parent: &'a mut dyn ProgressMonitor, parent_ticks: usize) -> Self {
        SubProgressMonitor {
            parent,
            parent_ticks,
            scale: 0.0,
            sent_to_parent: 0.0,
            nesting: 0,
        }
    }

    fn forward(&mut self, work: f64) {
        let remaining = self.parent_ticks as f64 - self.sent_to_parent;
        let delta = work.min(remaining);
        if delta > 0.0 {
            self.parent.internal_worked(delta);
            self.sent_to_parent += delta;
        }
    }
}

impl ProgressMonitor for SubProgressMonitor<'_> {
    fn begin_task(&mut self, name: &str, total_work: usize) {
        self.nesting += 1;
        if self.nesting > 1 {
            return;
        }
        self.scale = if total_work == 0 {
            0.0
        } else {
            self.parent_ticks as f64 / total_work as f64
        };
        if !name.is_empty() {
            self.parent.sub_task(name);
        }
    }

    fn internal_worked(&mut self, work: f64) {
        if self.nesting != 1 || work <= 0.0 {
            return;
        }
        let scaled = work * self.scale;
        self.forward(scaled);
    }

    fn sub_task(&mut self, name: &str) {
        self.parent.sub_task(name);
    }

    fn done(&mut self) {
        if self.nesting > 1 {
            self.nesting -= 1;
            return;
        }
        let remaining = self.parent_ticks as f64 - self.sent_to_parent;
        self.forward(remaining);
        self.nesting = 0;
    }

    fn is_cancelled(&self) -> bool {
        self.parent.is_cancelled()
    }
}
