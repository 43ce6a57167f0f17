//! The load test animation as a time-driven state machine.
//!
//! [`transition`] is the whole machine: a pure function from state and event to the
//! next state and the work to do. [`AnimationController`] owns the bridge, its
//! analysis and the clocks, feeds ticks through [`transition`] and carries out the
//! resulting [`AnimationAction`]s to produce one [`InterpolationSnapshot`] per frame.

use std::fmt;

use tracing::{debug, info, warn};

use crate::analysis::Analysis;
use crate::bridge::BridgeModel;
use crate::config::{AnimationConfig, SimulationConfig};
use crate::errors::TopologyError;
use crate::gusset::Gusset;
use crate::interpolation::{InterpolationSnapshot, Interpolator, Roadway};

/// States of the load test animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationState {
    /// Nothing shown yet, or just reset.
    Uninitialized,
    /// The bridge carries nothing, not even its own weight.
    Unloaded,
    /// Self-weight ramping in.
    DeadLoading,
    /// The truck driving across.
    LoadMoving,
    /// Collapse in progress.
    Failing,
    /// Collapse complete.
    Failed,
    /// Collapse complete; the truck rolls up to the emergency stop.
    LoadMovingToDeadLoadFailure,
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnimationState::Uninitialized => "uninitialized",
            AnimationState::Unloaded => "unloaded",
            AnimationState::DeadLoading => "dead loading",
            AnimationState::LoadMoving => "load moving",
            AnimationState::Failing => "failing",
            AnimationState::Failed => "failed",
            AnimationState::LoadMovingToDeadLoadFailure => "load moving to dead load failure",
        })
    }
}

/// Inputs to the state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimationEvent {
    /// A new frame.
    Tick {
        /// Seconds since the state clock was last restarted.
        state_elapsed: f64,
        /// Current truck location in panels.
        load_location: f64,
    },
    /// The frame just computed shows a failed structure.
    FailureDetected,
}

/// Work the controller performs after a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimationAction {
    /// Reset clocks, park the truck at the start of the run-up and show the unloaded bridge.
    Start,
    /// Show the unloaded bridge.
    HoldUnloaded,
    /// Show this fraction of the dead load, then check for failure.
    ApplyDeadLoad(f64),
    /// Advance the truck, show the bridge under it, then check for failure.
    MoveLoad,
    /// Advance the truck across the collapsed bridge.
    MoveLoadToFailure,
    /// Show the collapse this far along, 0 to 1.
    BlendFailure(f64),
    /// Keep showing the collapsed bridge.
    ShowFailure,
    /// Freeze the failing frame and analyse the weakened structure.
    CaptureFailure,
    /// Nothing to do.
    None,
}

/// Outcome of [`transition`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    /// State after the event.
    pub next: AnimationState,
    /// Whether the state clock restarts now.
    pub restart_clock: bool,
    /// Work to do for this event.
    pub action: AnimationAction,
}

impl Transition {
    /// Move to `next` without touching the state clock.
    const fn to(next: AnimationState, action: AnimationAction) -> Self {
        Self {
            next,
            restart_clock: false,
            action,
        }
    }

    /// Move to `next` and restart the state clock.
    const fn restarting(next: AnimationState, action: AnimationAction) -> Self {
        Self {
            next,
            restart_clock: true,
            action,
        }
    }
}

/// The animation state machine.
///
/// Total over every state and event; an event a state does not handle leaves it
/// unchanged with [`AnimationAction::None`].
///
/// # Examples
/// ```
/// use trussim::animation::{transition, AnimationAction, AnimationEvent, AnimationState};
/// use trussim::config::AnimationConfig;
///
/// let config = AnimationConfig::default();
/// let tick = AnimationEvent::Tick { state_elapsed: 0.6, load_location: -3.0 };
/// let step = transition(AnimationState::Unloaded, tick, &config);
/// assert_eq!(step.next, AnimationState::DeadLoading);
/// assert!(step.restart_clock);
/// assert_eq!(step.action, AnimationAction::HoldUnloaded);
/// ```
#[must_use]
pub fn transition(state: AnimationState, event: AnimationEvent, config: &AnimationConfig) -> Transition {
    use AnimationAction as A;
    use AnimationState as S;

    match (state, event) {
        (S::Uninitialized, AnimationEvent::Tick { .. }) => Transition::restarting(S::Unloaded, A::Start),
        (S::Unloaded, AnimationEvent::Tick { state_elapsed, .. }) => {
            if state_elapsed >= config.initial_pause_duration {
                Transition::restarting(S::DeadLoading, A::HoldUnloaded)
            } else {
                Transition::to(S::Unloaded, A::HoldUnloaded)
            }
        }
        (S::DeadLoading, AnimationEvent::Tick { state_elapsed, .. }) => {
            let fraction = state_elapsed / config.dead_loading_duration;
            if fraction > 1.0 {
                Transition::restarting(S::LoadMoving, A::ApplyDeadLoad(1.0))
            } else {
                Transition::to(S::DeadLoading, A::ApplyDeadLoad(fraction.max(0.0)))
            }
        }
        (S::LoadMoving, AnimationEvent::Tick { .. }) => Transition::to(S::LoadMoving, A::MoveLoad),
        (S::Failing, AnimationEvent::Tick { state_elapsed, .. }) => {
            let t = state_elapsed / config.failure_duration;
            if t > 1.0 {
                Transition::to(S::Failed, A::BlendFailure(1.0))
            } else {
                Transition::to(S::Failing, A::BlendFailure(t.max(0.0)))
            }
        }
        (S::Failed, AnimationEvent::Tick { load_location, .. }) => {
            if load_location < config.emergency_stop_location {
                Transition::to(S::LoadMovingToDeadLoadFailure, A::ShowFailure)
            } else {
                Transition::to(S::Failed, A::ShowFailure)
            }
        }
        (S::LoadMovingToDeadLoadFailure, AnimationEvent::Tick { load_location, .. }) => {
            if load_location >= config.emergency_stop_location {
                Transition::to(S::Failed, A::ShowFailure)
            } else {
                Transition::to(S::LoadMovingToDeadLoadFailure, A::MoveLoadToFailure)
            }
        }
        (S::Unloaded | S::DeadLoading | S::LoadMoving, AnimationEvent::FailureDetected) => {
            Transition::restarting(S::Failing, A::CaptureFailure)
        }
        (
            S::Uninitialized | S::Failing | S::Failed | S::LoadMovingToDeadLoadFailure,
            AnimationEvent::FailureDetected,
        ) => Transition::to(state, A::None),
    }
}

/// Seconds between two nanosecond timestamps; zero if the clock ran backwards.
fn seconds_between(earlier: u64, later: u64) -> f64 {
    later.saturating_sub(earlier) as f64 * 1.0e-9
}

/// Drives the load test animation of one bridge.
///
/// The bridge is analysed once at construction. Editing the bridge means building a
/// new controller.
#[derive(Debug)]
pub struct AnimationController {
    /// The bridge under test.
    bridge: BridgeModel,
    /// Analysis and animation settings.
    config: SimulationConfig,
    /// Load test of the intact bridge.
    analysis: Analysis,
    /// Turns analysis results into frames.
    interpolator: Interpolator,
    /// Gusset plates, in joint order.
    gussets: Vec<Gusset>,
    /// Current state.
    state: AnimationState,
    /// Clock reading of the previous update, in nanoseconds.
    last_display_time: u64,
    /// Clock reading when the state clock last restarted, in nanoseconds.
    last_state_change_time: u64,
    /// Truck location in panels.
    load_location: f64,
    /// Share of dead load in place.
    dead_load_applied: f64,
    /// Intact bridge at the present loading. Frozen while a collapse plays.
    current: InterpolationSnapshot,
    /// Weakened bridge the collapse blends towards.
    failure_target: Option<InterpolationSnapshot>,
    /// Frame handed out by [`AnimationController::update`].
    display: InterpolationSnapshot,
    /// Metres travelled by the load point since last taken.
    distance_moved: f64,
}

impl AnimationController {
    /// Analyse `bridge` and prepare its animation.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] when the bridge cannot be analysed at all.
    ///
    /// # Examples
    /// ```
    /// use trussim::animation::{AnimationController, AnimationState};
    /// use trussim::config::SimulationConfig;
    /// use trussim::interpolation::FlatRoadway;
    /// use trussim::{BridgeModel, DesignConditions, Inventory, SectionFamily};
    ///
    /// let conditions = DesignConditions::from_code(1_060_804_000).expect("valid scenario");
    /// let inventory = Inventory::standard();
    /// let steel = inventory.material(2).cloned().expect("quenched steel");
    /// let tube = inventory.shape(SectionFamily::Tube, 27).expect("300 mm tube");
    /// let bridge = BridgeModel::warren(conditions, 4.0, &steel, tube, tube).expect("valid stock");
    ///
    /// let mut controller =
    ///     AnimationController::new(bridge, SimulationConfig::default(), Box::new(FlatRoadway::default()))
    ///         .expect("valid topology");
    /// controller.update(0);
    /// assert_eq!(controller.state(), AnimationState::Unloaded);
    /// controller.update(600_000_000);
    /// assert_eq!(controller.state(), AnimationState::DeadLoading);
    /// ```
    pub fn new(
        bridge: BridgeModel,
        config: SimulationConfig,
        roadway: Box<dyn Roadway>,
    ) -> Result<Self, TopologyError> {
        let analysis = Analysis::run(&bridge, &config.analysis)?;
        let gussets = Gusset::build_all(bridge.truss());
        let interpolator = Interpolator::new(roadway, config.animation.displacement_exaggeration)
            .with_load_interference(gussets.iter().any(Gusset::is_interfering_with_load));
        let load_location = -config.animation.runup;
        let current = interpolator.dead_load_only(&bridge, &analysis, 0.0, load_location);
        debug!(
            status = %analysis.status(),
            joints = bridge.truss().joint_count(),
            members = bridge.truss().member_count(),
            "animation prepared"
        );
        Ok(Self {
            display: current.clone(),
            current,
            bridge,
            config,
            analysis,
            interpolator,
            gussets,
            state: AnimationState::Uninitialized,
            last_display_time: 0,
            last_state_change_time: 0,
            load_location,
            dead_load_applied: 0.0,
            failure_target: None,
            distance_moved: 0.0,
        })
    }

    /// Advance to `time`, a monotonic clock reading in nanoseconds, and return the frame
    /// to draw.
    pub fn update(&mut self, time: u64) -> &InterpolationSnapshot {
        let event = AnimationEvent::Tick {
            state_elapsed: seconds_between(self.last_state_change_time, time),
            load_location: self.load_location,
        };
        let elapsed = seconds_between(self.last_display_time, time);
        self.last_display_time = time;
        let step = transition(self.state, event, &self.config.animation);
        self.apply(step, time, elapsed);
        &self.display
    }

    /// Return to [`AnimationState::Uninitialized`]; the next update starts over.
    pub fn reset(&mut self) {
        self.state = AnimationState::Uninitialized;
        self.failure_target = None;
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Truck location in panels from the left abutment.
    #[must_use]
    pub fn load_location(&self) -> f64 {
        self.load_location
    }

    /// Share of the dead load applied so far.
    #[must_use]
    pub fn dead_load_applied(&self) -> f64 {
        self.dead_load_applied
    }

    /// The frame returned by the last update.
    #[must_use]
    pub fn snapshot(&self) -> &InterpolationSnapshot {
        &self.display
    }

    /// The bridge being animated.
    #[must_use]
    pub fn bridge(&self) -> &BridgeModel {
        &self.bridge
    }

    /// Load test results of the intact bridge.
    #[must_use]
    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    /// Gusset plates of every joint.
    #[must_use]
    pub fn gussets(&self) -> &[Gusset] {
        &self.gussets
    }

    /// Hold the truck in place, or let it drive on.
    pub fn set_paused(&mut self, paused: bool) {
        self.config.animation.paused = paused;
    }

    /// Whether the truck is held in place.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.config.animation.paused
    }

    /// Distance the truck moved since the last call, in metres. Resets the count.
    pub fn take_distance_moved(&mut self) -> f64 {
        std::mem::take(&mut self.distance_moved)
    }

    /// Adopt a transition and carry out its action.
    fn apply(&mut self, step: Transition, time: u64, elapsed: f64) {
        if step.next != self.state {
            debug!(from = %self.state, to = %step.next, "animation state change");
        }
        self.state = step.next;
        if step.restart_clock {
            self.last_state_change_time = time;
        }

        match step.action {
            AnimationAction::Start => {
                self.last_display_time = time;
                self.last_state_change_time = time;
                self.load_location = -self.config.animation.runup;
                self.dead_load_applied = 0.0;
                self.failure_target = None;
                self.show_dead_load(0.0);
                self.distance_moved = 0.0;
            }
            AnimationAction::HoldUnloaded => {
                self.load_location = -self.config.animation.runup;
                self.show_dead_load(0.0);
            }
            AnimationAction::ApplyDeadLoad(fraction) => {
                self.load_location = -self.config.animation.runup;
                self.dead_load_applied = fraction;
                self.show_dead_load(fraction);
                self.check_for_failure(time);
            }
            AnimationAction::MoveLoad => {
                self.advance_load(elapsed);
                self.show_load();
                self.check_for_failure(time);
            }
            AnimationAction::MoveLoadToFailure => {
                self.advance_load(elapsed);
                self.show_load();
                self.blend_failure(1.0);
            }
            AnimationAction::BlendFailure(t) => self.blend_failure(t),
            AnimationAction::CaptureFailure => self.capture_failure(),
            AnimationAction::ShowFailure | AnimationAction::None => {}
        }
    }

    /// Show the intact bridge under a share of the dead load.
    fn show_dead_load(&mut self, fraction: f64) {
        self.current = self
            .interpolator
            .dead_load_only(&self.bridge, &self.analysis, fraction, self.load_location);
        self.record_movement();
        self.display = self.current.clone();
    }

    /// Show the intact bridge with the truck at its present location.
    fn show_load(&mut self) {
        self.current = self
            .interpolator
            .at_location(&self.bridge, &self.analysis, self.load_location);
        self.record_movement();
        self.display = self.current.clone();
    }

    /// Add the load point travel between the shown frame and the new one.
    fn record_movement(&mut self) {
        self.distance_moved += self.display.load_point().distance(self.current.load_point());
    }

    /// Move the truck `elapsed` seconds further, faster off the deck, wrapping back to
    /// the start of the run-up once clear of the far side. A paused truck stays put.
    fn advance_load(&mut self, elapsed: f64) {
        let animation = &self.config.animation;
        if animation.paused {
            return;
        }
        let loaded = self.bridge.conditions().loaded_joint_count() as f64;
        let mut speed = animation.truck_speed_panels_per_second();
        if self.load_location <= 0.0 || self.load_location >= loaded {
            speed *= animation.off_deck_speed_factor;
        }
        self.load_location += elapsed * speed;
        if self.load_location >= loaded + animation.runup {
            self.load_location = -animation.runup;
        }
    }

    /// Feed a failure event through the machine if the new frame shows one.
    fn check_for_failure(&mut self, time: u64) {
        if !self.current.is_failure() {
            return;
        }
        let step = transition(self.state, AnimationEvent::FailureDetected, &self.config.animation);
        self.apply(step, time, 0.0);
    }

    /// Freeze the failing frame and pick the collapse target.
    fn capture_failure(&mut self) {
        info!(
            load_location = self.load_location,
            failed_members = self.current.failure_count(),
            unstable = self.current.is_unstable(),
            "bridge failure detected"
        );
        let failed = self.current.failure_mask();
        let weakened = Analysis::run_degraded(&self.bridge, &failed, &self.config.analysis);
        let target = match weakened {
            Ok(weakened) if !weakened.is_unstable() => {
                self.interpolator
                    .at_location(&self.bridge, &weakened, self.load_location)
            }
            Ok(_) => {
                warn!("weakened bridge is unstable; collapse is shown in place");
                self.current.clone()
            }
            Err(error) => {
                warn!(%error, "weakened bridge could not be analysed; collapse is shown in place");
                self.current.clone()
            }
        };
        self.failure_target = Some(target);
        self.display = self.current.clone();
    }

    /// Show the collapse `t` of the way along.
    fn blend_failure(&mut self, t: f64) {
        let target = self.failure_target.as_ref().unwrap_or(&self.current);
        self.display = self
            .interpolator
            .failure_blend(&self.bridge, &self.current, target, t);
    }
}
