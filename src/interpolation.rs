//! Display states between solved load cases.
//!
//! An [`InterpolationSnapshot`] is everything a renderer needs for one frame:
//! exaggerated joint displacements, member forces and ratios, which members have
//! failed, and where the truck stands. The [`Interpolator`] builds snapshots from an
//! [`Analysis`] for a dead load ramp, for a truck anywhere along the road, and for the
//! collapse blend toward a weakened structure.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::Analysis;
use crate::bridge::BridgeModel;
use crate::conditions::{PANEL_SIZE, WEAR_SURFACE_HEIGHT};
use crate::geometry::{Displacement, Point};

/// Bisection steps used to seat the rear axle.
const REAR_AXLE_ITERATIONS: usize = 20;

/// Distance error accepted when seating the rear axle, in metres.
const REAR_AXLE_TOLERANCE: f64 = 0.01;

/// Elevation of the road centreline off the bridge.
pub trait Roadway {
    /// Road surface elevation at `x`, in the world frame of the truss.
    fn elevation(&self, x: f64) -> f64;
}

impl<F> Roadway for F
where
    F: Fn(f64) -> f64,
{
    fn elevation(&self, x: f64) -> f64 {
        self(x)
    }
}

/// A level road at a fixed elevation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatRoadway {
    /// Road surface height, metres.
    elevation: f64,
}

impl FlatRoadway {
    /// A level road at `elevation`.
    #[must_use]
    pub const fn new(elevation: f64) -> Self {
        Self { elevation }
    }
}

impl Default for FlatRoadway {
    /// Road level with the top of the deck wear surface.
    fn default() -> Self {
        Self::new(WEAR_SURFACE_HEIGHT)
    }
}

impl Roadway for FlatRoadway {
    fn elevation(&self, _x: f64) -> f64 {
        self.elevation
    }
}

/// Display state of one member.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MemberStatus {
    /// Carrying its load.
    Intact,
    /// Overloaded in the current frame.
    Failed,
    /// Failed and collapsing. The renderer draws the member buckled or torn relative
    /// to the deformed length it had when failure was captured.
    Collapsed {
        /// Member length at the moment of failure, in metres.
        base_length: f64,
    },
}

impl MemberStatus {
    /// True unless the member is intact.
    #[must_use]
    pub const fn is_failed(self) -> bool {
        !matches!(self, MemberStatus::Intact)
    }
}

/// One frame of the load test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpolationSnapshot {
    /// Truck location in panels.
    load_location: f64,
    /// Exaggerated joint displacements.
    displacements: Vec<Displacement>,
    /// Axial forces, tension positive.
    member_forces: Vec<f64>,
    /// Force over strength for the sign of each force.
    force_ratios: Vec<f64>,
    /// Per-member state.
    member_status: Vec<MemberStatus>,
    /// Front axle contact point.
    load_point: Point,
    /// Unit vector from rear axle to front axle.
    load_rotation: Displacement,
    /// Drawn from an unstable analysis.
    unstable: bool,
    /// Some gusset blocks the truck.
    load_interference: bool,
}

impl InterpolationSnapshot {
    /// The unloaded bridge with the truck at `load_location` on a road at `road_point`.
    #[must_use]
    pub fn undeformed(joint_count: usize, member_count: usize, load_location: f64, road_point: Point) -> Self {
        Self {
            load_location,
            displacements: vec![Displacement::default(); joint_count],
            member_forces: vec![0.0; member_count],
            force_ratios: vec![0.0; member_count],
            member_status: vec![MemberStatus::Intact; member_count],
            load_point: road_point,
            load_rotation: Displacement::new(1.0, 0.0),
            unstable: false,
            load_interference: false,
        }
    }

    /// Blend two snapshots of the same truss.
    ///
    /// Continuous fields are blended linearly. Member status and flags follow `start`
    /// until `t` reaches 1. The result equals `start` for `t <= 0` and `end` for
    /// `t >= 1`.
    ///
    /// # Examples
    /// ```
    /// use trussim::interpolation::InterpolationSnapshot;
    /// use trussim::point;
    ///
    /// let a = InterpolationSnapshot::undeformed(3, 3, -3.0, point(-12.0, 0.8));
    /// let b = InterpolationSnapshot::undeformed(3, 3, 1.0, point(4.0, 0.8));
    /// assert_eq!(InterpolationSnapshot::lerp(&a, &b, 0.0), a);
    /// assert_eq!(InterpolationSnapshot::lerp(&a, &b, 1.0), b);
    /// assert_eq!(InterpolationSnapshot::lerp(&a, &b, 0.5).load_location(), -1.0);
    /// ```
    #[must_use]
    pub fn lerp(start: &Self, end: &Self, t: f64) -> Self {
        if t <= 0.0 {
            return start.clone();
        }
        if t >= 1.0 {
            return end.clone();
        }
        let s = 1.0 - t;
        let blend = |a: &[f64], b: &[f64]| -> Vec<f64> { a.iter().zip(b).map(|(a, b)| s * a + t * b).collect() };
        let rotation = Displacement::lerp(start.load_rotation, end.load_rotation, t);
        Self {
            load_location: s * start.load_location + t * end.load_location,
            displacements: start
                .displacements
                .iter()
                .zip(&end.displacements)
                .map(|(&a, &b)| Displacement::lerp(a, b, t))
                .collect(),
            member_forces: blend(&start.member_forces, &end.member_forces),
            force_ratios: blend(&start.force_ratios, &end.force_ratios),
            member_status: start.member_status.clone(),
            load_point: start
                .load_point
                .offset(Displacement::lerp(Displacement::default(), end.load_point - start.load_point, t)),
            load_rotation: if rotation.norm() > 1.0e-6 {
                rotation.with_length(1.0)
            } else {
                start.load_rotation
            },
            unstable: start.unstable,
            load_interference: start.load_interference,
        }
    }

    /// Truck front axle location in panels from the left abutment.
    #[must_use]
    pub fn load_location(&self) -> f64 {
        self.load_location
    }

    /// Exaggerated joint displacements in joint order.
    #[must_use]
    pub fn displacements(&self) -> &[Displacement] {
        &self.displacements
    }

    /// Exaggerated displacement of one joint.
    #[must_use]
    pub fn displacement(&self, joint: usize) -> Option<Displacement> {
        self.displacements.get(joint).copied()
    }

    /// Member forces in kilonewtons, tension positive.
    #[must_use]
    pub fn member_forces(&self) -> &[f64] {
        &self.member_forces
    }

    /// Force to strength ratio of one member, -1 at full compressive and +1 at full
    /// tensile capacity.
    #[must_use]
    pub fn force_ratio(&self, member: usize) -> f64 {
        self.force_ratios.get(member).copied().unwrap_or(0.0)
    }

    /// Status of one member.
    #[must_use]
    pub fn member_status(&self, member: usize) -> MemberStatus {
        self.member_status.get(member).copied().unwrap_or(MemberStatus::Intact)
    }

    /// Status of every member in member order.
    #[must_use]
    pub fn member_statuses(&self) -> &[MemberStatus] {
        &self.member_status
    }

    /// Per-member failure flags.
    #[must_use]
    pub fn failure_mask(&self) -> Vec<bool> {
        self.member_status.iter().map(|s| s.is_failed()).collect()
    }

    /// Number of failed members.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.member_status.iter().filter(|s| s.is_failed()).count()
    }

    /// True when the structure is unstable or any member has failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.unstable || self.failure_count() > 0
    }

    /// True when the structure is a mechanism.
    #[must_use]
    pub fn is_unstable(&self) -> bool {
        self.unstable
    }

    /// World position of the front axle contact.
    #[must_use]
    pub fn load_point(&self) -> Point {
        self.load_point
    }

    /// Unit vector along the truck from the rear axle to the front; `(1, 0)` is level.
    #[must_use]
    pub fn load_rotation(&self) -> Displacement {
        self.load_rotation
    }

    /// True when some gusset plate reaches into the truck's path.
    #[must_use]
    pub fn is_load_interfering(&self) -> bool {
        self.load_interference
    }
}

/// Builds [`InterpolationSnapshot`]s from analysis results.
pub struct Interpolator {
    /// Approach road surface.
    roadway: Box<dyn Roadway>,
    /// Displacement multiplier.
    exaggeration: f64,
    /// Copied into every snapshot.
    load_interference: bool,
}

impl fmt::Debug for Interpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpolator")
            .field("exaggeration", &self.exaggeration)
            .field("load_interference", &self.load_interference)
            .finish_non_exhaustive()
    }
}

impl Interpolator {
    /// Interpolator placing the truck on `roadway` off the deck and multiplying
    /// displacements by `exaggeration`.
    #[must_use]
    pub fn new(roadway: Box<dyn Roadway>, exaggeration: f64) -> Self {
        Self {
            roadway,
            exaggeration,
            load_interference: false,
        }
    }

    /// Mark every snapshot as obstructed by a gusset plate.
    #[must_use]
    pub fn with_load_interference(mut self, load_interference: bool) -> Self {
        self.load_interference = load_interference;
        self
    }

    /// Displacement multiplier.
    #[must_use]
    pub fn exaggeration(&self) -> f64 {
        self.exaggeration
    }

    /// Self-weight alone, scaled by `dead_load_fraction`, with the truck waiting off
    /// the deck at `load_location`.
    #[must_use]
    pub fn dead_load_only(
        &self,
        bridge: &BridgeModel,
        analysis: &Analysis,
        dead_load_fraction: f64,
        load_location: f64,
    ) -> InterpolationSnapshot {
        let scale = dead_load_fraction * self.exaggeration;
        let mut snapshot = self.blank(bridge, analysis, load_location);
        if let Some(dead) = analysis.result(0) {
            for (slot, &d) in snapshot.displacements.iter_mut().zip(dead.displacements()) {
                *slot = d * scale;
            }
            for (member, &force) in dead.member_forces().iter().enumerate() {
                let force = dead_load_fraction * force;
                let ratio = analysis.detector().force_ratio(member, force);
                snapshot.member_forces[member] = force;
                snapshot.force_ratios[member] = ratio;
                snapshot.member_status[member] = ratio_status(ratio, false);
            }
        }
        self.place_load(bridge, &mut snapshot);
        snapshot
    }

    /// Full dead load with the truck at `load_location` panels.
    ///
    /// On the deck the two neighbouring panel-point cases are blended; past the last
    /// deck joint the right case wraps to the dead load case. Off the deck the dead load
    /// case alone applies.
    #[must_use]
    pub fn at_location(&self, bridge: &BridgeModel, analysis: &Analysis, load_location: f64) -> InterpolationSnapshot {
        let loaded = bridge.conditions().loaded_joint_count();
        if load_location <= 0.0 || load_location >= loaded as f64 {
            return self.dead_load_only(bridge, analysis, 1.0, load_location);
        }

        let mut snapshot = self.blank(bridge, analysis, load_location);
        let left_case = load_location.floor() as usize;
        let right_case = if left_case + 1 < loaded { left_case + 1 } else { 0 };
        let t = load_location - left_case as f64;
        if let (Some(left), Some(right)) = (analysis.result(left_case), analysis.result(right_case)) {
            for (joint, slot) in snapshot.displacements.iter_mut().enumerate() {
                let a = left.displacement(joint).unwrap_or_default();
                let b = right.displacement(joint).unwrap_or_default();
                *slot = Displacement::lerp(a, b, t) * self.exaggeration;
            }
            for member in 0..snapshot.member_forces.len() {
                let a = left.member_force(member).unwrap_or(0.0);
                let b = right.member_force(member).unwrap_or(0.0);
                let force = (1.0 - t) * a + t * b;
                let ratio = analysis.detector().force_ratio(member, force);
                snapshot.member_forces[member] = force;
                snapshot.force_ratios[member] = ratio;
                // The left case alone may fail a member, so the truck cannot step past a failure.
                snapshot.member_status[member] = ratio_status(ratio, analysis.member_fails(left_case, member));
            }
        }
        self.place_load(bridge, &mut snapshot);
        snapshot
    }

    /// Blend from `base`, the frame at which failure was found, toward `target`, the
    /// weakened structure, by `t`.
    ///
    /// Forces and ratios stay those of `base`. Members failed in `base` collapse from
    /// their deformed length in `base`.
    #[must_use]
    pub fn failure_blend(
        &self,
        bridge: &BridgeModel,
        base: &InterpolationSnapshot,
        target: &InterpolationSnapshot,
        t: f64,
    ) -> InterpolationSnapshot {
        let truss = bridge.truss();
        let mut snapshot = InterpolationSnapshot {
            displacements: InterpolationSnapshot::lerp(base, target, t).displacements,
            ..base.clone()
        };
        for (member, status) in snapshot.member_status.iter_mut().enumerate() {
            if !status.is_failed() {
                continue;
            }
            let base_length = truss.member(member).map_or(0.0, |m| {
                let deformed = |joint: usize| {
                    let position = truss.joint(joint).map(|j| j.position()).unwrap_or_default();
                    position.offset(base.displacement(joint).unwrap_or_default())
                };
                deformed(m.joint_a()).distance(deformed(m.joint_b()))
            });
            *status = MemberStatus::Collapsed { base_length };
        }
        self.place_load(bridge, &mut snapshot);
        snapshot
    }

    /// Undeformed snapshot sized for `bridge`, flagged unstable when the analysis is.
    fn blank(&self, bridge: &BridgeModel, analysis: &Analysis, load_location: f64) -> InterpolationSnapshot {
        let truss = bridge.truss();
        let mut snapshot = InterpolationSnapshot::undeformed(
            truss.joint_count(),
            truss.member_count(),
            load_location,
            Point::default(),
        );
        snapshot.unstable = analysis.is_unstable();
        snapshot.load_interference = self.load_interference;
        snapshot
    }

    /// Set the load point and rotation for the snapshot's load location and
    /// displacements.
    fn place_load(&self, bridge: &BridgeModel, snapshot: &mut InterpolationSnapshot) {
        let (point, rotation) = self.load_placement(bridge, snapshot.load_location, &snapshot.displacements);
        snapshot.load_point = point;
        snapshot.load_rotation = rotation;
    }

    /// Front axle contact point and truck direction for a truck at `location` on a
    /// bridge displaced by `displacements`.
    fn load_placement(&self, bridge: &BridgeModel, location: f64, displacements: &[Displacement]) -> (Point, Displacement) {
        let loaded = bridge.conditions().loaded_joint_count();
        let last = loaded.saturating_sub(1);
        let deck = |joint: usize| -> (Point, Displacement) {
            let position = bridge
                .truss()
                .joint(joint)
                .map(|j| j.position())
                .unwrap_or_else(|| Point::new(joint as f64 * PANEL_SIZE, 0.0));
            (position, displacements.get(joint).copied().unwrap_or_default())
        };
        let road = |x: f64| Point::new(x, self.roadway.elevation(x));
        let wear = Displacement::new(0.0, WEAR_SURFACE_HEIGHT);
        let zero = Displacement::default();
        let level = Displacement::new(1.0, 0.0);

        if location <= 0.0 || location >= loaded as f64 {
            let (anchor, shift, offset) = if location <= 0.0 {
                let (p, d) = deck(0);
                (p, d, location)
            } else {
                let (p, d) = deck(last);
                (p, d, location - last as f64)
            };
            let front = road(offset * PANEL_SIZE + anchor.x + shift.x);
            let rear = road(front.x - PANEL_SIZE);
            let rotation = rear_axle_rotation(front, (rear, zero), (front, zero), PANEL_SIZE).unwrap_or(level);
            return (front, rotation);
        }

        let left_joint = location.floor() as usize;
        let t = location - left_joint as f64;
        let (left, left_shift) = deck(left_joint);
        let on_deck = left_joint < last;
        let front = if on_deck {
            let (right, right_shift) = deck(left_joint + 1);
            let (a, b) = (left.offset(left_shift), right.offset(right_shift));
            a.offset(Displacement::lerp(zero, b - a, t)).offset(wear)
        } else {
            let x = left.x + left_shift.x + t * PANEL_SIZE;
            Point::new(
                x,
                (1.0 - t) * (left.y + left_shift.y + WEAR_SURFACE_HEIGHT) + t * self.roadway.elevation(x),
            )
        };

        // Walk left one panel at a time until the rear axle seats.
        let mut right = if on_deck {
            let (p, d) = deck(left_joint + 1);
            (p.offset(wear), d)
        } else {
            (front, zero)
        };
        for joint in (0..=left_joint).rev().map(Some).chain([None]) {
            let left = match joint {
                Some(joint) => {
                    let (p, d) = deck(joint);
                    (p.offset(wear), d)
                }
                None => (road(front.x - PANEL_SIZE), zero),
            };
            if let Some(rotation) = rear_axle_rotation(front, left, right, PANEL_SIZE) {
                return (front, rotation);
            }
            right = left;
        }
        (front, level)
    }
}

/// Status for a member with force ratio `ratio`.
fn ratio_status(ratio: f64, already_failed: bool) -> MemberStatus {
    if already_failed || !(-1.0..=1.0).contains(&ratio) {
        MemberStatus::Failed
    } else {
        MemberStatus::Intact
    }
}

/// Direction from the rear axle to `front` when the rear axle, `wheelbase` behind,
/// rests on the displaced panel from `left` to `right`.
///
/// `None` when the panel's left end is already within a wheelbase of the front axle or
/// the bisection does not settle.
fn rear_axle_rotation(
    front: Point,
    left: (Point, Displacement),
    right: (Point, Displacement),
    wheelbase: f64,
) -> Option<Displacement> {
    let left = left.0.offset(left.1);
    let right = right.0.offset(right.1);
    if front.distance(left) < wheelbase {
        return None;
    }
    let (mut t0, mut t1) = (-0.5, 1.5);
    for _ in 0..REAR_AXLE_ITERATIONS {
        let t = 0.5 * (t0 + t1);
        let rear = left.offset(Displacement::lerp(Displacement::default(), right - left, t));
        let error = front.distance(rear) - wheelbase;
        if error > REAR_AXLE_TOLERANCE {
            t0 = t;
        } else if error < -REAR_AXLE_TOLERANCE {
            t1 = t;
        } else {
            let direction = front - rear;
            return Some(if direction.norm() > 1.0e-6 {
                direction.with_length(1.0)
            } else {
                Displacement::new(1.0, 0.0)
            });
        }
    }
    None
}
