//! Factored joint loads: self weight, deck dead load and the test truck.

use nalgebra::DVector;

use crate::bridge::BridgeModel;
use crate::conditions::{DeckType, LoadType};
use crate::truss::Truss;

/// Load factor applied to all dead load.
pub const DEAD_LOAD_FACTOR: f64 = 1.35;

/// Load factor applied to the truck, including the dynamic allowance.
pub const LIVE_LOAD_FACTOR: f64 = 1.75 * 1.33;

/// Standard gravity in metres per second squared.
pub const GRAVITY: f64 = 9.8066;

/// Joint force vector with two entries per joint, `x` then `y`, in kilonewtons.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadVector {
    /// `[fx0, fy0, fx1, fy1, ...]`.
    forces: DVector<f64>,
}

impl LoadVector {
    /// Zero loads on `joint_count` joints.
    #[must_use]
    pub fn new(joint_count: usize) -> Self {
        Self {
            forces: DVector::<f64>::zeros(2 * joint_count),
        }
    }

    /// Number of joints covered.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.forces.len() / 2
    }

    /// Add a force to a joint. Loads on joints outside the vector are ignored.
    pub fn add(&mut self, joint: usize, fx: f64, fy: f64) {
        if joint < self.joint_count() {
            self.forces[2 * joint] += fx;
            self.forces[2 * joint + 1] += fy;
        }
    }

    /// Horizontal force on a joint; 0 for joints outside the vector.
    #[must_use]
    pub fn fx(&self, joint: usize) -> f64 {
        self.forces.get(2 * joint).copied().unwrap_or(0.0)
    }

    /// Vertical force on a joint; 0 for joints outside the vector.
    #[must_use]
    pub fn fy(&self, joint: usize) -> f64 {
        self.forces.get(2 * joint + 1).copied().unwrap_or(0.0)
    }

    /// The underlying degree-of-freedom vector.
    #[must_use]
    pub fn as_vector(&self) -> &DVector<f64> {
        &self.forces
    }
}

/// Position of the test truck.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovingLoad {
    /// No truck; dead load only.
    None,
    /// Front axle at this location in panels from the left abutment. The rear axle
    /// trails one panel behind.
    At(f64),
}

/// One loading state of the bridge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadCase {
    /// Share of the dead load in place, 0 to 1.
    pub dead_load_fraction: f64,
    /// Truck position.
    pub moving_load: MovingLoad,
}

impl LoadCase {
    /// Dead load only, scaled by `fraction`.
    #[must_use]
    pub const fn dead_load_only(fraction: f64) -> Self {
        Self {
            dead_load_fraction: fraction,
            moving_load: MovingLoad::None,
        }
    }

    /// Full dead load with the front axle at deck joint `joint`.
    #[must_use]
    pub fn panel_point(joint: usize) -> Self {
        Self {
            dead_load_fraction: 1.0,
            moving_load: MovingLoad::At(joint as f64),
        }
    }
}

/// Axle weights of the test truck in kilonewtons, unfactored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Truck {
    /// Front axle weight.
    pub front_axle: f64,
    /// Rear axle weight.
    pub rear_axle: f64,
}

impl Truck {
    /// The truck used for a load type.
    #[must_use]
    pub const fn for_load_type(load_type: LoadType) -> Self {
        match load_type {
            LoadType::StandardTruck => Self {
                front_axle: 44.0,
                rear_axle: 181.0,
            },
            LoadType::HeavyTruck => Self {
                front_axle: 124.0,
                rear_axle: 124.0,
            },
        }
    }
}

/// Factored self weight of a member, carried half by each end joint, in kilonewtons.
#[must_use]
pub fn member_self_weight(truss: &Truss, member: usize) -> f64 {
    let (Some(m), Some(length)) = (truss.member(member), truss.member_length(member)) else {
        return 0.0;
    };
    DEAD_LOAD_FACTOR * m.shape().area() * length * m.material().density() * GRAVITY / 1000.0
}

/// Factored deck and wearing surface load at an interior deck joint, in kilonewtons.
#[must_use]
pub fn deck_point_load(deck_type: DeckType) -> f64 {
    match deck_type {
        DeckType::MediumStrength => DEAD_LOAD_FACTOR * 120.265 + 33.097,
        DeckType::HighStrength => DEAD_LOAD_FACTOR * 82.608 + 33.097,
    }
}

/// Split an axle load between the two deck joints around `location` by the lever rule.
fn add_axle(loads: &mut LoadVector, panels: usize, location: f64, weight: f64) {
    if !(0.0..=panels as f64).contains(&location) {
        return;
    }
    // location is non-negative and at most `panels`
    let left = (location.floor() as usize).min(panels - 1);
    let t = location - left as f64;
    loads.add(left, 0.0, -(1.0 - t) * weight);
    loads.add(left + 1, 0.0, -t * weight);
}

/// Assemble the joint loads of `case` for a bridge.
///
/// # Examples
/// ```
/// use trussim::loads::{self, LoadCase};
/// use trussim::{BridgeModel, DesignConditions};
///
/// let conditions = DesignConditions::from_code(1_060_804_000).expect("valid scenario");
/// let bridge = BridgeModel::new(conditions);
/// let dead = loads::load_vector(&bridge, &LoadCase::dead_load_only(1.0));
/// assert!(dead.fy(3) < 0.0);
/// assert_eq!(dead.fx(3), 0.0);
/// ```
#[must_use]
pub fn load_vector(bridge: &BridgeModel, case: &LoadCase) -> LoadVector {
    let truss = bridge.truss();
    let conditions = bridge.conditions();
    let mut loads = LoadVector::new(truss.joint_count());

    let dead = case.dead_load_fraction;
    for (index, member) in truss.members().iter().enumerate() {
        let half = 0.5 * dead * member_self_weight(truss, index);
        loads.add(member.joint_a(), 0.0, -half);
        loads.add(member.joint_b(), 0.0, -half);
    }
    let deck = dead * deck_point_load(conditions.deck_type());
    let last = conditions.loaded_joint_count() - 1;
    for joint in 0..=last {
        let share = if joint == 0 || joint == last { 0.5 } else { 1.0 };
        loads.add(joint, 0.0, -share * deck);
    }

    if let MovingLoad::At(front) = case.moving_load {
        let truck = Truck::for_load_type(conditions.load_type());
        let panels = conditions.panel_count();
        add_axle(&mut loads, panels, front, LIVE_LOAD_FACTOR * truck.front_axle);
        add_axle(&mut loads, panels, front - 1.0, LIVE_LOAD_FACTOR * truck.rear_axle);
    }
    loads
}

/// The load cases checked by the load test: dead load alone, then the front axle at
/// each deck joint after the first.
#[must_use]
pub fn panel_point_load_cases(bridge: &BridgeModel) -> Vec<LoadCase> {
    std::iter::once(LoadCase::dead_load_only(1.0))
        .chain((1..bridge.conditions().loaded_joint_count()).map(LoadCase::panel_point))
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::conditions::DesignConditions;
    use crate::inventory::{Inventory, SectionFamily};

    fn bridge(code: u64) -> BridgeModel {
        let conditions = DesignConditions::from_code(code).expect("valid scenario");
        let inventory = Inventory::standard();
        let steel = inventory.material(0).cloned().expect("carbon steel");
        let tube = inventory.shape(SectionFamily::Tube, 20).expect("180 mm tube");
        BridgeModel::warren(conditions, 4.0, &steel, tube, tube).expect("valid stock")
    }

    fn total_vertical(loads: &LoadVector) -> f64 {
        (0..loads.joint_count()).map(|j| loads.fy(j)).sum()
    }

    #[test]
    fn dead_load_totals_deck_and_self_weight() {
        let bridge = bridge(1_060_804_000);
        let loads = load_vector(&bridge, &LoadCase::dead_load_only(1.0));
        let self_weight: f64 = (0..bridge.truss().member_count())
            .map(|m| member_self_weight(bridge.truss(), m))
            .sum();
        let deck = 6.0 * deck_point_load(DeckType::MediumStrength);
        assert_relative_eq!(total_vertical(&loads), -(self_weight + deck), max_relative = 1.0e-12);
    }

    #[test]
    fn dead_load_fraction_scales_linearly() {
        let bridge = bridge(3_060_804_000);
        let full = load_vector(&bridge, &LoadCase::dead_load_only(1.0));
        let part = load_vector(&bridge, &LoadCase::dead_load_only(0.25));
        for joint in 0..full.joint_count() {
            assert_relative_eq!(part.fy(joint), 0.25 * full.fy(joint), max_relative = 1.0e-12);
        }
    }

    #[test]
    fn panel_point_case_puts_axles_on_joints() {
        let bridge = bridge(1_060_804_000);
        let dead = load_vector(&bridge, &LoadCase::dead_load_only(1.0));
        let live = load_vector(&bridge, &LoadCase::panel_point(3));
        assert_relative_eq!(live.fy(3) - dead.fy(3), -LIVE_LOAD_FACTOR * 44.0, max_relative = 1.0e-12);
        assert_relative_eq!(live.fy(2) - dead.fy(2), -LIVE_LOAD_FACTOR * 181.0, max_relative = 1.0e-12);
        assert_relative_eq!(live.fy(4), dead.fy(4));
    }

    #[test]
    fn axle_between_joints_is_split_by_lever_rule() {
        let bridge = bridge(2_060_804_000);
        let dead = load_vector(&bridge, &LoadCase::dead_load_only(1.0));
        let live = load_vector(
            &bridge,
            &LoadCase {
                dead_load_fraction: 1.0,
                moving_load: MovingLoad::At(6.5),
            },
        );
        let axle = LIVE_LOAD_FACTOR * 124.0;
        // Front axle is off the deck; the rear axle sits mid-way along the last panel.
        assert_relative_eq!(live.fy(5) - dead.fy(5), -0.5 * axle, max_relative = 1.0e-12);
        assert_relative_eq!(live.fy(6) - dead.fy(6), -0.5 * axle, max_relative = 1.0e-12);
        assert_relative_eq!(
            total_vertical(&live) - total_vertical(&dead),
            -axle,
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn load_test_has_one_case_per_deck_joint() {
        let bridge = bridge(1_060_804_000);
        let cases = panel_point_load_cases(&bridge);
        assert_eq!(cases.len(), 7);
        assert_eq!(cases[0].moving_load, MovingLoad::None);
        assert_eq!(cases[6].moving_load, MovingLoad::At(6.0));
    }

    #[test]
    fn joints_outside_the_vector_carry_no_load() {
        let mut loads = LoadVector::new(2);
        loads.add(1, 3.0, -4.0);
        loads.add(5, 100.0, 100.0);
        assert_eq!(loads.fx(5), 0.0);
        assert_eq!(loads.fy(2), 0.0);
        assert_eq!(loads.fx(1), 3.0);
        assert_eq!(total_vertical(&loads), -4.0);
    }
}
