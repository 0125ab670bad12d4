use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use super::state::{Notification, PhonebookState};
use crate::{PhonebookError, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// locks `mutex`, a panic in another holder does not make the state unusable
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs a job once after a delay.
///
/// The default implementation is [`TokioScheduler`]. [`ManualScheduler`] runs jobs only when its
/// simulated clock is advanced, which makes timeouts testable without waiting.
pub trait Scheduler: Send + Sync {
    /// runs `job` once `delay` has passed, unless the returned handle is cancelled first
    fn schedule(&self, delay: Duration, job: Box<dyn FnOnce() + Send + 'static>) -> TimerHandle;
}

/// A handle to a job waiting in a [`Scheduler`]
pub struct TimerHandle {
    cancel: Job,
}

impl TimerHandle {
    /// wraps the action that withdraws the job
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        TimerHandle {
            cancel: Box::new(cancel),
        }
    }

    /// withdraws the job if it has not run yet
    pub fn cancel(self) {
        (self.cancel)()
    }
}

/// A [`Scheduler`] backed by tokio timers
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// a scheduler that spawns its timers on the current tokio runtime
    ///
    /// # Errors
    /// returns an error if not called from within a tokio runtime
    pub fn current() -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| PhonebookError::StringErr(format!("no tokio runtime: {}", e)))?;
        Ok(TokioScheduler { handle })
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, job: Job) -> TimerHandle {
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            job();
        });
        TimerHandle::new(move || task.abort())
    }
}

/// A [`Scheduler`] with a simulated clock. Jobs run, in deadline order, when
/// [`advance`](ManualScheduler::advance) moves the clock past their deadline
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Arc<Mutex<ManualClock>>,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next_id: u64,
    jobs: Vec<(u64, Duration, Job)>,
}

impl ManualScheduler {
    /// a scheduler whose clock starts at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// time elapsed on the simulated clock
    pub fn now(&self) -> Duration {
        lock(&self.clock).now
    }

    /// number of jobs that have not run or been cancelled
    pub fn pending(&self) -> usize {
        lock(&self.clock).jobs.len()
    }

    /// moves the clock forward by `by` and runs every job that became due
    pub fn advance(&self, by: Duration) {
        let mut due = {
            let mut clock = lock(&self.clock);
            clock.now += by;
            let now = clock.now;
            let (due, waiting): (Vec<_>, Vec<_>) =
                clock.jobs.drain(..).partition(|(_, deadline, _)| *deadline <= now);
            clock.jobs = waiting;
            due
        };
        due.sort_by_key(|(id, deadline, _)| (*deadline, *id));
        // the lock is released, jobs may schedule new jobs
        for (_, _, job) in due {
            job();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, job: Job) -> TimerHandle {
        let id = {
            let mut clock = lock(&self.clock);
            let id = clock.next_id;
            clock.next_id += 1;
            let deadline = clock.now + delay;
            clock.jobs.push((id, deadline, job));
            id
        };
        let clock = Arc::clone(&self.clock);
        TimerHandle::new(move || lock(&clock).jobs.retain(|(job_id, _, _)| *job_id != id))
    }
}

/// A single notification slot.
///
/// Showing a notification replaces the current one and cancels its pending clear, so at most one
/// clear timer is ever outstanding and it always belongs to the notification on screen.
pub struct Notifier {
    state: Arc<Mutex<PhonebookState>>,
    scheduler: Arc<dyn Scheduler>,
    pending: Mutex<Option<TimerHandle>>,
    // bumped on every show/cancel, a clear only applies to the ticket it was scheduled for
    ticket: Arc<AtomicU64>,
}

impl Notifier {
    /// a notifier writing into `state`, clearing through `scheduler`
    pub fn new(state: Arc<Mutex<PhonebookState>>, scheduler: Arc<dyn Scheduler>) -> Self {
        Notifier {
            state,
            scheduler,
            pending: Mutex::new(None),
            ticket: Arc::new(AtomicU64::new(0)),
        }
    }

    /// shows `notification` and clears it after `visible_for`
    pub fn show(&self, notification: Notification, visible_for: Duration) {
        let mut pending = lock(&self.pending);
        if let Some(timer) = pending.take() {
            timer.cancel();
        }
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticket, ?notification, "showing notification");
        lock(&self.state).notification = Some(notification);

        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.ticket);
        let timer = self.scheduler.schedule(
            visible_for,
            Box::new(move || {
                if current.load(Ordering::SeqCst) == ticket {
                    lock(&state).notification = None;
                }
            }),
        );
        *pending = Some(timer);
    }

    /// cancels the pending clear, leaving the current notification as it is
    pub fn cancel(&self) {
        self.ticket.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = lock(&self.pending).take() {
            timer.cancel();
        }
    }
}
