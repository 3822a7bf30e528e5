//! Polls the backend for the tickets of one booking until any show up.

use crate::error::AppResult;
use crate::models::Ticket;
use crate::tasks::PollLimits;
use futures_util::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Where tickets come from. An empty list means "not issued yet".
pub trait TicketSource: Send + Sync + 'static {
    fn tickets_for_booking<'a>(&'a self, booking_id: &'a str)
    -> BoxFuture<'a, AppResult<Vec<Ticket>>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollParams {
    pub booking_id: Option<String>,
    pub enabled: bool,
    pub interval: Duration,
}

impl PollParams {
    pub fn new(booking_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            booking_id: Some(booking_id.into()),
            enabled: true,
            interval,
        }
    }

    pub fn disabled(interval: Duration) -> Self {
        Self {
            booking_id: None,
            enabled: false,
            interval,
        }
    }

    fn should_run(&self) -> bool {
        self.enabled && self.booking_id.is_some() && !self.interval.is_zero()
    }
}

/// What a consumer can observe about the loop at any moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSnapshot {
    pub booking_id: Option<String>,
    pub tickets: Vec<Ticket>,
    pub polling: bool,
    pub attempts: u32,
    pub gave_up: bool,
}

enum Applied {
    Stale,
    Pending,
    Finished,
}

struct LoopState {
    params: PollParams,
    // Bumped on every stop/restart; results tagged with an older value are dropped.
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct Inner<S> {
    source: Arc<S>,
    limits: PollLimits,
    state: Mutex<LoopState>,
    updates: watch::Sender<PollSnapshot>,
}

pub struct TicketPoller<S: TicketSource> {
    inner: Arc<Inner<S>>,
}

impl<S: TicketSource> TicketPoller<S> {
    pub fn new(source: Arc<S>, interval: Duration, limits: PollLimits) -> Self {
        let (updates, _) = watch::channel(PollSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                source,
                limits,
                state: Mutex::new(LoopState {
                    params: PollParams::disabled(interval),
                    generation: 0,
                    task: None,
                }),
                updates,
            }),
        }
    }

    /// Changing any parameter cancels the running loop and starts over from a
    /// clean snapshot. Setting identical parameters does nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_params(&self, params: PollParams) {
        let mut state = self.inner.lock();
        if state.params == params {
            return;
        }

        self.inner.cancel(&mut state);
        let run = params.should_run();
        self.inner.updates.send_replace(PollSnapshot {
            booking_id: params.booking_id.clone(),
            polling: run,
            ..PollSnapshot::default()
        });
        state.params = params;

        if let (true, Some(booking_id)) = (run, state.params.booking_id.clone()) {
            log::debug!("Ticket polling started for booking {booking_id}");
            let interval = state.params.interval;
            let generation = state.generation;
            let inner = Arc::clone(&self.inner);
            state.task = Some(tokio::spawn(run_loop(inner, generation, booking_id, interval)));
        }
    }

    pub fn start(&self, booking_id: impl Into<String>) {
        let interval = self.inner.lock().params.interval;
        self.set_params(PollParams::new(booking_id, interval));
    }

    /// Safe to call any number of times, including before the first start.
    pub fn stop(&self) {
        let mut state = self.inner.lock();
        self.inner.cancel(&mut state);
        state.params.enabled = false;
        self.inner.updates.send_modify(|snap| snap.polling = false);
    }

    /// Query right now, outside the schedule. A non-empty answer ends the loop.
    pub async fn refresh(&self) -> AppResult<Vec<Ticket>> {
        let (generation, booking_id) = {
            let state = self.inner.lock();
            (state.generation, state.params.booking_id.clone())
        };
        let Some(booking_id) = booking_id else {
            return Ok(Vec::new());
        };

        let tickets = self.inner.source.tickets_for_booking(&booking_id).await?;
        if !tickets.is_empty() {
            let attempts = self.inner.updates.borrow().attempts;
            self.inner.apply(generation, attempts, tickets.clone());
        }
        Ok(tickets)
    }

    pub fn snapshot(&self) -> PollSnapshot {
        self.inner.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.inner.updates.subscribe()
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.inner.updates.borrow().tickets.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.inner.updates.borrow().polling
    }

    pub fn params(&self) -> PollParams {
        self.inner.lock().params.clone()
    }
}

impl<S: TicketSource> Drop for TicketPoller<S> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        self.inner.cancel(&mut state);
    }
}

impl<S: TicketSource> Inner<S> {
    fn lock(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel(&self, state: &mut LoopState) {
        state.generation = state.generation.wrapping_add(1);
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }

    fn apply(&self, generation: u64, attempts: u32, tickets: Vec<Ticket>) -> Applied {
        let mut state = self.lock();
        if state.generation != generation {
            return Applied::Stale;
        }

        let found = !tickets.is_empty();
        let exhausted = !found && self.limits.attempts_exhausted(attempts);
        self.updates.send_modify(|snap| {
            snap.attempts = attempts;
            if found {
                snap.tickets = tickets;
                snap.polling = false;
            } else if exhausted {
                snap.polling = false;
                snap.gave_up = true;
            }
        });

        if found || exhausted {
            self.cancel(&mut state);
            Applied::Finished
        } else {
            Applied::Pending
        }
    }

    fn give_up(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        self.updates.send_modify(|snap| {
            snap.polling = false;
            snap.gave_up = true;
        });
        self.cancel(&mut state);
    }
}

async fn run_loop<S: TicketSource>(
    inner: Arc<Inner<S>>,
    generation: u64,
    booking_id: String,
    interval: Duration,
) {
    let started = Instant::now();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempts: u32 = 0;

    loop {
        // 第一次 tick 立即完成：激活后马上查询一次
        ticker.tick().await;
        if inner.limits.time_exhausted(started.elapsed()) {
            log::warn!("Ticket polling for booking {booking_id} timed out after {attempts} attempts");
            inner.give_up(generation);
            return;
        }

        attempts = attempts.saturating_add(1);
        let tickets = match inner.source.tickets_for_booking(&booking_id).await {
            Ok(tickets) => tickets,
            Err(e) => {
                log::warn!("Ticket query for booking {booking_id} failed (attempt {attempts}): {e}");
                Vec::new()
            }
        };

        match inner.apply(generation, attempts, tickets) {
            Applied::Pending => {}
            Applied::Finished => {
                log::debug!("Ticket polling for booking {booking_id} finished after {attempts} attempts");
                return;
            }
            Applied::Stale => return,
        }
    }
}
