//! Resend cooldown for the `SendingLetter` step
//!
//! Two independently cancellable timers: a one-shot delay that moves the flow
//! on, and a repeating tick that burns down the resend budget.

use std::time::Duration;

use super::types::CountdownState;
use crate::scheduler::{Scheduler, TimerHandle};

/// Outcome of routing a timer firing through the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CountdownEvent {
    /// Handle is not owned by this countdown
    Ignored,
    /// The advance delay elapsed
    AdvanceDue,
    /// One tick elapsed, budget still positive
    Tick(u32),
    /// Budget reached zero, tick stopped
    Expired,
}

#[derive(Debug)]
pub(crate) struct Countdown {
    total: u32,
    remaining: u32,
    advance: Option<TimerHandle>,
    tick: Option<TimerHandle>,
}

impl Countdown {
    pub(crate) fn new(total: u32) -> Self {
        Self {
            total,
            remaining: total,
            advance: None,
            tick: None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.advance.is_some() || self.tick.is_some()
    }

    pub(crate) fn remaining(&self) -> u32 {
        self.remaining
    }

    pub(crate) fn state(&self) -> CountdownState {
        CountdownState {
            remaining_seconds: self.remaining,
            is_active: self.tick.is_some(),
        }
    }

    /// Arm both timers with a full budget
    pub(crate) fn start(&mut self, scheduler: &dyn Scheduler, delay: Duration, interval: Duration) {
        self.cancel(scheduler);
        self.advance = Some(scheduler.schedule_once(delay));
        self.rearm_tick(scheduler, interval);
    }

    /// Restart only the tick with a full budget
    pub(crate) fn rearm_tick(&mut self, scheduler: &dyn Scheduler, interval: Duration) {
        if let Some(tick) = self.tick.take() {
            scheduler.cancel(tick);
        }
        self.remaining = self.total;
        self.tick = Some(scheduler.schedule_repeating(interval));
    }

    /// Stop the tick and drop the budget to zero
    pub(crate) fn expire(&mut self, scheduler: &dyn Scheduler) {
        if let Some(tick) = self.tick.take() {
            scheduler.cancel(tick);
        }
        self.remaining = 0;
    }

    /// Cancel both timers; safe to call repeatedly
    pub(crate) fn cancel(&mut self, scheduler: &dyn Scheduler) {
        if let Some(advance) = self.advance.take() {
            scheduler.cancel(advance);
        }
        if let Some(tick) = self.tick.take() {
            scheduler.cancel(tick);
        }
    }

    pub(crate) fn on_timer(&mut self, handle: TimerHandle, scheduler: &dyn Scheduler) -> CountdownEvent {
        if self.advance == Some(handle) {
            self.advance = None;
            return CountdownEvent::AdvanceDue;
        }
        if self.tick != Some(handle) {
            return CountdownEvent::Ignored;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expire(scheduler);
            CountdownEvent::Expired
        } else {
            CountdownEvent::Tick(self.remaining)
        }
    }
}
