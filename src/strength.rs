//! Member capacity formulas.
//!
//! Strengths follow the load and resistance factor design rules for axially loaded
//! steel members (see <https://en.wikipedia.org/wiki/Limit_state_design>). Units are
//! kilonewtons, kilopascals and metres throughout.

use std::f64::consts::PI;

use crate::inventory::{Material, Shape};

/// Resistance factor applied to compressive capacity.
pub const COMPRESSION_RESISTANCE_FACTOR: f64 = 0.90;

/// Resistance factor applied to tensile capacity.
pub const TENSION_RESISTANCE_FACTOR: f64 = 0.95;

/// Largest slenderness ratio (length over radius of gyration) allowed by the code.
pub const MAX_SLENDERNESS: f64 = 300.0;

/// Slenderness parameter at which inelastic buckling gives way to elastic buckling.
const INELASTIC_LIMIT: f64 = 2.25;

/// Column slenderness parameter `λ = L²·Fy·A / (π²·E·I)`.
#[must_use]
pub fn slenderness_parameter(material: &Material, shape: &Shape, length: f64) -> f64 {
    length * length * material.yield_stress() * shape.area()
        / (PI * PI * material.elastic_modulus() * shape.moment())
}

/// Factored compressive strength of a member in kilonewtons.
///
/// # Examples
/// ```
/// use trussim::{strength, Inventory, SectionFamily};
///
/// let inventory = Inventory::standard();
/// let steel = inventory.material(0).expect("carbon steel");
/// let bar = inventory.shape(SectionFamily::Bar, 10).expect("80 mm bar");
/// let short = strength::compressive_strength(steel, &bar, 1.0);
/// let long = strength::compressive_strength(steel, &bar, 6.0);
/// assert!(long < short);
/// ```
#[must_use]
pub fn compressive_strength(material: &Material, shape: &Shape, length: f64) -> f64 {
    let squash_load = material.yield_stress() * shape.area();
    let lambda = slenderness_parameter(material, shape, length);
    if lambda <= INELASTIC_LIMIT {
        COMPRESSION_RESISTANCE_FACTOR * 0.66_f64.powf(lambda) * squash_load
    } else {
        COMPRESSION_RESISTANCE_FACTOR * 0.88 * squash_load / lambda
    }
}

/// Factored tensile strength of a member in kilonewtons.
#[must_use]
pub fn tensile_strength(material: &Material, shape: &Shape) -> f64 {
    TENSION_RESISTANCE_FACTOR * material.yield_stress() * shape.area()
}

/// Length at which `shape` reaches the `allowable` slenderness ratio.
///
/// An infinite allowance (scenarios with cable anchorages) gives an infinite length.
#[must_use]
pub fn max_slenderness_length(shape: &Shape, allowable: f64) -> f64 {
    allowable / shape.inverse_radius_of_gyration()
}

/// Signed force to strength ratio.
///
/// Positive forces are divided by the tensile strength and negative ones by the
/// compressive strength, so `-1.0` is full compressive capacity and `1.0` full
/// tensile capacity.
#[must_use]
pub fn force_strength_ratio(force: f64, compressive_strength: f64, tensile_strength: f64) -> f64 {
    if force > 0.0 {
        force / tensile_strength
    } else {
        force / compressive_strength
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::inventory::{Inventory, SectionFamily};

    fn carbon_steel() -> Material {
        Inventory::standard().material(0).cloned().expect("carbon steel")
    }

    #[test]
    fn tensile_strength_matches_hand_calculation() {
        let shape = Shape::bar(12, 100);
        // 0.95 * 250 MPa * 0.01 m^2
        assert_relative_eq!(tensile_strength(&carbon_steel(), &shape), 2_375.0, epsilon = 1.0e-9);
    }

    #[test]
    fn compressive_strength_uses_inelastic_branch_for_stocky_members() {
        let material = carbon_steel();
        let shape = Shape::bar(12, 100);
        let length = 2.0;
        let lambda = slenderness_parameter(&material, &shape, length);
        assert!(lambda < INELASTIC_LIMIT);
        let expected = 0.9 * 0.66_f64.powf(lambda) * 250_000.0 * 0.01;
        assert_relative_eq!(
            compressive_strength(&material, &shape, length),
            expected,
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn compressive_strength_is_continuous_at_the_branch_point() {
        let material = carbon_steel();
        let shape = Shape::tube(14, 120);
        // Solve λ(L) = 2.25 for L.
        let length = (INELASTIC_LIMIT * PI * PI * material.elastic_modulus() * shape.moment()
            / (material.yield_stress() * shape.area()))
        .sqrt();
        let below = compressive_strength(&material, &shape, length * (1.0 - 1.0e-9));
        let above = compressive_strength(&material, &shape, length * (1.0 + 1.0e-9));
        // The two branches meet to within half a percent.
        assert_relative_eq!(below, above, max_relative = 5.0e-3);
    }

    #[test]
    fn strengths_do_not_decrease_with_area() {
        let material = carbon_steel();
        let inventory = Inventory::standard();
        for family in SectionFamily::ALL {
            let shapes = inventory.shapes(family);
            for pair in shapes.windows(2) {
                let (small, large) = (&pair[0], &pair[1]);
                assert!(large.area() >= small.area());
                assert!(tensile_strength(&material, large) >= tensile_strength(&material, small));
                // Short members stay on the inelastic branch for every size.
                assert!(
                    compressive_strength(&material, large, 0.5)
                        >= compressive_strength(&material, small, 0.5)
                );
            }
        }
    }

    #[test]
    fn force_ratio_sign_follows_force() {
        assert_relative_eq!(force_strength_ratio(50.0, 200.0, 100.0), 0.5);
        assert_relative_eq!(force_strength_ratio(-50.0, 200.0, 100.0), -0.25);
        assert_relative_eq!(force_strength_ratio(0.0, 200.0, 100.0), 0.0);
    }

    #[test]
    fn unlimited_slenderness_allows_any_length() {
        let shape = Shape::bar(0, 30);
        assert!(max_slenderness_length(&shape, f64::INFINITY).is_infinite());
        assert_relative_eq!(
            max_slenderness_length(&shape, MAX_SLENDERNESS),
            shape.max_slenderness_length()
        );
    }
}
