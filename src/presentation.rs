//! Presentation collaborators and the experiment runner
//!
//! The engine never touches rendering objects. It hands each [`Trial`] to a
//! [`PresentationSurface`], which applies it to whatever the participant
//! sees and hears, and it only reveals the response prompt once a
//! [`PromptGate`] has opened on the [`Clock`].

use std::cell::Cell;
use std::fmt::Display;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::design::Trial;
use crate::session::{Progress, TrialSession};
use crate::store::ResultStore;
use crate::{Error, Result};

/// Delay between trial setup and the response prompt appearing.
pub const DEFAULT_PROMPT_DELAY: Duration = Duration::from_millis(1500);

/// Whatever shows trials to the participant.
pub trait PresentationSurface {
    /// Apply a trial's factor levels to the stimulus.
    fn configure(&mut self, trial: &Trial);

    /// Show or hide the response controls.
    fn set_prompt_visible(&mut self, visible: bool);

    /// Replace the status/instruction line.
    fn set_status_text(&mut self, text: &str);

    /// Restore per-trial physical state (object poses) before a trial.
    fn reset_scene(&mut self) {}
}

/// Time source for the prompt gate.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// One-shot deadline that opens the response prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptGate {
    delay: Duration,
    deadline: Option<Instant>,
}

impl PromptGate {
    /// Create a disarmed gate with the given delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm the gate to open `delay` after `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Disarm without opening.
    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    /// Check if the gate is waiting to open.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Get the configured delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Time left before the gate opens, if armed.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// Open the gate if its deadline has passed.
    ///
    /// Returns true exactly once per arming.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for PromptGate {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_DELAY)
    }
}

/// What happened to a participant action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// The prompt was not showing; the action was dropped.
    Ignored,
    /// The next trial is now on the surface.
    Next {
        /// Index of the trial now presented
        index: usize,
    },
    /// The experiment finished and its results were written.
    Complete {
        /// Where the result table was written
        location: String,
    },
}

/// Status line while a trial awaits a response.
#[must_use]
pub fn trial_status(number: usize, total: usize, prompt: &str) -> String {
    format!("[{number}/{total}] {prompt}")
}

/// Status line after a successful save.
#[must_use]
pub fn completion_status(location: &str) -> String {
    format!("Experiment complete. Saved to '{location}'.")
}

/// Status line after a failed save.
#[must_use]
pub fn failure_status(location: &str, error: &impl Display) -> String {
    format!("Experiment complete, but saving to '{location}' failed: {error}")
}

/// Drives a session through a presentation surface.
///
/// Each trial is configured on the surface with the prompt hidden; the
/// prompt appears once the gate opens in [`ExperimentRunner::poll`], and
/// actions arriving before that are ignored.
pub struct ExperimentRunner<P, C, S> {
    session: TrialSession<S>,
    surface: P,
    clock: C,
    gate: PromptGate,
    prompt: String,
    prompt_visible: bool,
}

impl<P, C, S> ExperimentRunner<P, C, S>
where
    P: PresentationSurface,
    C: Clock,
    S: ResultStore,
{
    /// Create a runner with the default prompt delay and an empty prompt.
    #[must_use]
    pub fn new(session: TrialSession<S>, surface: P, clock: C) -> Self {
        Self {
            session,
            surface,
            clock,
            gate: PromptGate::default(),
            prompt: String::new(),
            prompt_visible: false,
        }
    }

    /// Set the question shown after the trial counter.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the delay before the prompt appears.
    #[must_use]
    pub fn with_prompt_delay(mut self, delay: Duration) -> Self {
        self.gate = PromptGate::new(delay);
        self
    }

    /// Present the first trial.
    ///
    /// # Errors
    ///
    /// Returns `SessionComplete` if the session has no trial left.
    pub fn start(&mut self) -> Result<()> {
        self.present()
    }

    /// Reveal the prompt if the gate has opened. Returns true when it did.
    pub fn poll(&mut self) -> bool {
        if self.gate.poll(self.clock.now()) {
            self.prompt_visible = true;
            self.surface.set_prompt_visible(true);
            debug!(trial = self.session.current_index() + 1, "prompt shown");
            true
        } else {
            false
        }
    }

    /// Handle one participant action.
    ///
    /// # Errors
    ///
    /// - `InvalidResponse` if `category` is not recognized; the prompt stays
    ///   up for the same trial
    /// - `StorageWriteFailed` if the final save failed; the status line says
    ///   so and [`ExperimentRunner::save_to`] can retry elsewhere
    pub fn on_response(&mut self, category: u32) -> Result<RunnerEvent> {
        if !self.prompt_visible {
            debug!(category, "response ignored while prompt hidden");
            return Ok(RunnerEvent::Ignored);
        }

        let progress = match self.session.respond(category) {
            Ok(progress) => progress,
            Err(e @ Error::StorageWriteFailed { .. }) => {
                self.hide_prompt();
                let status = failure_status(self.session.location(), &e);
                self.surface.set_status_text(&status);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        match progress {
            Progress::Next { index } => {
                self.present()?;
                Ok(RunnerEvent::Next { index })
            }
            Progress::Complete { location } => {
                self.hide_prompt();
                self.surface.set_status_text(&completion_status(&location));
                Ok(RunnerEvent::Complete { location })
            }
        }
    }

    /// Retry saving a completed session at another location.
    ///
    /// # Errors
    ///
    /// Returns `StorageWriteFailed` if this location fails too.
    pub fn save_to(&mut self, location: impl Into<String>) -> Result<()> {
        let location = location.into();
        match self.session.save_to(location.clone()) {
            Ok(()) => {
                self.surface.set_status_text(&completion_status(&location));
                Ok(())
            }
            Err(e) => {
                self.surface
                    .set_status_text(&failure_status(&location, &e));
                Err(e)
            }
        }
    }

    fn present(&mut self) -> Result<()> {
        let trial = self.session.current_trial()?;
        self.surface.reset_scene();
        self.surface.configure(trial);

        if let Some((number, total)) = self.session.progress() {
            self.surface
                .set_status_text(&trial_status(number, total, &self.prompt));
        }

        self.prompt_visible = false;
        self.surface.set_prompt_visible(false);
        self.gate.arm(self.clock.now());
        Ok(())
    }

    fn hide_prompt(&mut self) {
        self.prompt_visible = false;
        self.gate.disarm();
        self.surface.set_prompt_visible(false);
    }

    /// Check if the response controls are showing.
    #[must_use]
    pub const fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    /// Time left before the prompt appears, if it is pending.
    #[must_use]
    pub fn remaining_delay(&self) -> Option<Duration> {
        self.gate.remaining(self.clock.now())
    }

    /// Get the session.
    #[must_use]
    pub const fn session(&self) -> &TrialSession<S> {
        &self.session
    }

    /// Get the presentation surface.
    #[must_use]
    pub const fn surface(&self) -> &P {
        &self.surface
    }

    /// Get the presentation surface mutably.
    pub fn surface_mut(&mut self) -> &mut P {
        &mut self.surface
    }

    /// Get the clock.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Dismantle the runner, returning the session and surface.
    pub fn into_parts(self) -> (TrialSession<S>, P) {
        (self.session, self.surface)
    }
}
