//! Debounced input handling.
//!
//! Every qualifying input updates the pending [`FilterState`] right away and
//! (re)arms a single timer. Only when the timer runs out is a
//! [`FilterCycle`] handed to the caller, so a burst of keystrokes costs one
//! filter and one render.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::filter::FilterState;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);
pub const MIN_DEBOUNCE_MS: u64 = 150;
pub const MAX_DEBOUNCE_MS: u64 = 300;

pub fn debounce_from_millis(ms: u64) -> Duration {
    Duration::from_millis(ms.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Query(String),
    Category(Option<String>),
    SubCategory(Option<String>),
    Region(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PendingFilter { deadline: Instant },
}

/// One settled burst of input: the state to filter with, and whether the
/// region moved at any point during the burst.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCycle {
    pub state: FilterState,
    pub region_changed: bool,
}

#[derive(Clone, Debug)]
pub struct InputCoordinator {
    state: FilterState,
    phase: Phase,
    delay: Duration,
    region_changed: bool,
    coalesced: usize,
}

impl InputCoordinator {
    pub fn new(state: FilterState, delay: Duration) -> Self {
        Self {
            state,
            phase: Phase::Idle,
            delay,
            region_changed: false,
            coalesced: 0,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Idle => None,
            Phase::PendingFilter { deadline } => Some(deadline),
        }
    }

    /// Applies `event` and arms (or pushes back) the timer. Returns the new
    /// deadline.
    pub fn on_input(&mut self, event: InputEvent, now: Instant) -> Instant {
        match event {
            InputEvent::Query(q) => self.state.set_query(q),
            InputEvent::Category(c) => self.state.set_category(c),
            InputEvent::SubCategory(s) => self.state.set_sub_category(s),
            InputEvent::Region(r) => {
                if self.state.set_region(r) {
                    self.region_changed = true;
                }
            }
        }

        let deadline = now + self.delay;
        match self.phase {
            Phase::Idle => {
                trace!(?deadline, "debounce armed");
                self.coalesced = 1;
            }
            Phase::PendingFilter { .. } => {
                trace!(?deadline, "debounce reset");
                self.coalesced += 1;
            }
        }
        self.phase = Phase::PendingFilter { deadline };
        deadline
    }

    /// Emits the pending cycle once its deadline has passed.
    pub fn poll_expired(&mut self, now: Instant) -> Option<FilterCycle> {
        match self.phase {
            Phase::PendingFilter { deadline } if now >= deadline => self.fire(),
            _ => None,
        }
    }

    /// Emits the pending cycle immediately, if there is one.
    pub fn flush(&mut self) -> Option<FilterCycle> {
        match self.phase {
            Phase::PendingFilter { .. } => self.fire(),
            Phase::Idle => None,
        }
    }

    fn fire(&mut self) -> Option<FilterCycle> {
        debug!(
            events = self.coalesced,
            region = %self.state.region,
            region_changed = self.region_changed,
            "debounce settled"
        );
        self.phase = Phase::Idle;
        self.coalesced = 0;
        Some(FilterCycle {
            state: self.state.clone(),
            region_changed: std::mem::take(&mut self.region_changed),
        })
    }
}

/// Drives `coordinator` from `events` until the channel closes, calling
/// `on_cycle` once per settled burst. A burst still pending when the channel
/// closes is flushed before returning. The first error from `on_cycle` stops
/// the loop and is returned.
pub async fn run<F, E>(
    mut coordinator: InputCoordinator,
    mut events: mpsc::UnboundedReceiver<InputEvent>,
    mut on_cycle: F,
) -> Result<InputCoordinator, E>
where
    F: FnMut(FilterCycle) -> Result<(), E>,
{
    let timer = sleep(coordinator.delay());
    tokio::pin!(timer);

    loop {
        let pending = coordinator.deadline().is_some();
        tokio::select! {
            biased;
            maybe = events.recv() => match maybe {
                Some(event) => {
                    let deadline = coordinator.on_input(event, Instant::now());
                    timer.as_mut().reset(deadline);
                }
                None => {
                    if let Some(cycle) = coordinator.flush() {
                        on_cycle(cycle)?;
                    }
                    break;
                }
            },
            () = &mut timer, if pending => {
                if let Some(cycle) = coordinator.poll_expired(Instant::now()) {
                    on_cycle(cycle)?;
                }
            }
        }
    }

    Ok(coordinator)
}
