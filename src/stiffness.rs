//! Direct stiffness solver for planar pin-jointed trusses.
//!
//! See <https://en.wikipedia.org/wiki/Direct_stiffness_method>. Units are kilonewtons
//! and metres, so displacements come out in metres.

use nalgebra::{DMatrix, Dyn, SMatrix, LU};
use tracing::debug;

use crate::errors::AnalysisError;
use crate::geometry::Displacement;
use crate::loads::LoadVector;
use crate::truss::Truss;

/// Default relative pivot tolerance below which a structure is treated as a mechanism.
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1.0e-10;

/// Displacements and member forces for one load vector.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalysisResult {
    /// Joint displacements, metres.
    displacements: Vec<Displacement>,
    /// Axial forces, kilonewtons.
    member_forces: Vec<f64>,
}

impl AnalysisResult {
    /// A result with zero displacement and force everywhere.
    #[must_use]
    pub fn zeroed(joint_count: usize, member_count: usize) -> Self {
        Self {
            displacements: vec![Displacement::default(); joint_count],
            member_forces: vec![0.0; member_count],
        }
    }

    /// Per-joint displacement in metres.
    #[must_use]
    pub fn displacements(&self) -> &[Displacement] {
        &self.displacements
    }

    /// Displacement of one joint.
    #[must_use]
    pub fn displacement(&self, joint: usize) -> Option<Displacement> {
        self.displacements.get(joint).copied()
    }

    /// Per-member axial force in kilonewtons, tension positive.
    #[must_use]
    pub fn member_forces(&self) -> &[f64] {
        &self.member_forces
    }

    /// Axial force in one member.
    #[must_use]
    pub fn member_force(&self, member: usize) -> Option<f64> {
        self.member_forces.get(member).copied()
    }
}

/// Geometry and axial stiffness of one member.
#[derive(Clone, Copy, Debug)]
struct Element {
    /// Start joint.
    joint_a: usize,
    /// End joint.
    joint_b: usize,
    /// Direction cosine along x, start to end.
    cx: f64,
    /// Direction cosine along y.
    cy: f64,
    /// `E·A/L`, already scaled for degradation.
    axial_stiffness: f64,
}

impl Element {
    /// Global 4×4 stiffness matrix ordered `[ax, ay, bx, by]`.
    fn matrix(&self) -> SMatrix<f64, 4, 4> {
        let (l, m) = (self.cx, self.cy);
        self.axial_stiffness
            * SMatrix::<f64, 4, 4>::from_row_slice(&[
                l * l,
                l * m,
                -l * l,
                -l * m,
                l * m,
                m * m,
                -l * m,
                -m * m,
                -l * l,
                -l * m,
                l * l,
                l * m,
                -l * m,
                -m * m,
                l * m,
                m * m,
            ])
    }

    /// Global DOF indices matching [`Element::matrix`].
    fn dofs(&self) -> [usize; 4] {
        [
            2 * self.joint_a,
            2 * self.joint_a + 1,
            2 * self.joint_b,
            2 * self.joint_b + 1,
        ]
    }
}

/// Assembles and factors truss stiffness matrices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StiffnessAnalyzer {
    /// Smallest acceptable pivot relative to the largest stiffness entry.
    pivot_tolerance: f64,
}

impl Default for StiffnessAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_PIVOT_TOLERANCE)
    }
}

impl StiffnessAnalyzer {
    /// Analyzer that rejects pivots smaller than `pivot_tolerance × max|K|`.
    #[must_use]
    pub const fn new(pivot_tolerance: f64) -> Self {
        Self { pivot_tolerance }
    }

    /// Relative pivot tolerance.
    #[must_use]
    pub fn pivot_tolerance(&self) -> f64 {
        self.pivot_tolerance
    }

    /// Solve a truss under a single load vector.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Topology`] for trusses that cannot be assembled and
    /// [`AnalysisError::Unstable`] when the structure is a mechanism.
    ///
    /// # Examples
    /// ```
    /// use trussim::loads::LoadVector;
    /// use trussim::{point, Inventory, Restraint, SectionFamily, StiffnessAnalyzer, Truss};
    ///
    /// let inventory = Inventory::standard();
    /// let steel = inventory.material(0).cloned().expect("carbon steel");
    /// let bar = inventory.shape(SectionFamily::Bar, 12).expect("100 mm bar");
    ///
    /// let mut truss = Truss::new();
    /// let support = truss.add_fixed_joint(point(0.0, 0.0), Restraint::PIN);
    /// let tip = truss.add_fixed_joint(point(1.0, 0.0), Restraint::ROLLER);
    /// truss.add_member(support, tip, steel, bar).expect("valid member");
    ///
    /// let mut loads = LoadVector::new(2);
    /// loads.add(tip, -100.0, 0.0);
    /// let result = StiffnessAnalyzer::default().analyze(&truss, &loads).expect("stable");
    /// assert!((result.member_forces()[0] + 100.0).abs() < 1.0e-9);
    /// ```
    pub fn analyze(&self, truss: &Truss, loads: &LoadVector) -> Result<AnalysisResult, AnalysisError> {
        self.factor(truss, None)?.solve(loads)
    }

    /// Assemble and factor the reduced stiffness matrix of a truss.
    ///
    /// `stiffness_scale`, when given, multiplies the axial stiffness of each member;
    /// members past the end of the slice keep full stiffness.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Topology`] for trusses that cannot be assembled and
    /// [`AnalysisError::Unstable`] when the structure is a mechanism.
    pub fn factor(
        &self,
        truss: &Truss,
        stiffness_scale: Option<&[f64]>,
    ) -> Result<StiffnessSystem, AnalysisError> {
        truss.validate()?;

        let elements: Vec<Element> = truss
            .members()
            .iter()
            .enumerate()
            .map(|(index, member)| {
                let a = truss.joints()[member.joint_a()].position();
                let b = truss.joints()[member.joint_b()].position();
                let delta = b - a;
                let length = delta.norm();
                let scale = stiffness_scale
                    .and_then(|s| s.get(index).copied())
                    .unwrap_or(1.0);
                Element {
                    joint_a: member.joint_a(),
                    joint_b: member.joint_b(),
                    cx: delta.x / length,
                    cy: delta.y / length,
                    axial_stiffness: scale * member.material().elastic_modulus() * member.shape().area()
                        / length,
                }
            })
            .collect();

        let dof_count = 2 * truss.joint_count();
        let mut stiffness = DMatrix::<f64>::zeros(dof_count, dof_count);
        for element in &elements {
            let local = element.matrix();
            let dof_map = element.dofs();
            for (row_local, global_row) in dof_map.iter().enumerate() {
                for (col_local, global_col) in dof_map.iter().enumerate() {
                    stiffness[(*global_row, *global_col)] += local[(row_local, col_local)];
                }
            }
        }

        let free_dofs: Vec<usize> = truss
            .joints()
            .iter()
            .enumerate()
            .flat_map(|(index, joint)| {
                let restraint = joint.restraint();
                [(2 * index, restraint.x), (2 * index + 1, restraint.y)]
            })
            .filter(|&(_, restrained)| !restrained)
            .map(|(dof, _)| dof)
            .collect();

        debug!(
            joints = truss.joint_count(),
            members = elements.len(),
            free_dofs = free_dofs.len(),
            "assembled stiffness matrix"
        );

        let free_len = free_dofs.len();
        if free_len == 0 {
            return Ok(StiffnessSystem {
                lu: None,
                free_dofs,
                dof_count,
                elements,
            });
        }
        let mut k_ff = DMatrix::<f64>::zeros(free_len, free_len);
        for (row_idx, &row) in free_dofs.iter().enumerate() {
            for (col_idx, &col) in free_dofs.iter().enumerate() {
                k_ff[(row_idx, col_idx)] = stiffness[(row, col)];
            }
        }
        let tolerance = self.pivot_tolerance * k_ff.amax();
        let lu = k_ff.lu();
        let pivot = lu
            .u()
            .diagonal()
            .iter()
            .fold(f64::INFINITY, |min, v| min.min(v.abs()));
        if pivot.is_nan() || pivot <= tolerance {
            debug!(pivot, tolerance, "stiffness matrix is singular");
            return Err(AnalysisError::Unstable { pivot, tolerance });
        }
        Ok(StiffnessSystem {
            lu: Some(lu),
            free_dofs,
            dof_count,
            elements,
        })
    }
}

/// A factored truss stiffness system, reusable across load vectors.
#[derive(Clone, Debug)]
pub struct StiffnessSystem {
    /// Factorization of the free-DOF block; absent when every DOF is restrained.
    lu: Option<LU<f64, Dyn, Dyn>>,
    /// Unrestrained DOFs in ascending order.
    free_dofs: Vec<usize>,
    /// Two per joint.
    dof_count: usize,
    /// One per member.
    elements: Vec<Element>,
}

impl StiffnessSystem {
    /// Solve for one load vector.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Unstable`] if back substitution fails.
    pub fn solve(&self, loads: &LoadVector) -> Result<AnalysisResult, AnalysisError> {
        let mut results = self.solve_all(std::slice::from_ref(loads))?;
        Ok(results.remove(0))
    }

    /// Solve for several load vectors with one factorization.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Unstable`] if back substitution fails.
    pub fn solve_all(&self, loads: &[LoadVector]) -> Result<Vec<AnalysisResult>, AnalysisError> {
        let free_len = self.free_dofs.len();
        let mut full = DMatrix::<f64>::zeros(self.dof_count, loads.len());
        if let Some(lu) = &self.lu {
            let mut rhs = DMatrix::<f64>::zeros(free_len, loads.len());
            for (case, load) in loads.iter().enumerate() {
                let vector = load.as_vector();
                for (row_idx, &row) in self.free_dofs.iter().enumerate() {
                    rhs[(row_idx, case)] = vector.get(row).copied().unwrap_or(0.0);
                }
            }
            let solution = lu.solve(&rhs).ok_or(AnalysisError::Unstable {
                pivot: 0.0,
                tolerance: 0.0,
            })?;
            for (idx, &dof) in self.free_dofs.iter().enumerate() {
                for case in 0..loads.len() {
                    full[(dof, case)] = solution[(idx, case)];
                }
            }
        }
        Ok((0..loads.len())
            .map(|case| self.result_for(&full, case))
            .collect())
    }

    /// Extract joint displacements and member forces for one solved column.
    fn result_for(&self, full: &DMatrix<f64>, case: usize) -> AnalysisResult {
        let displacements: Vec<Displacement> = (0..self.dof_count / 2)
            .map(|joint| Displacement::new(full[(2 * joint, case)], full[(2 * joint + 1, case)]))
            .collect();
        let member_forces = self
            .elements
            .iter()
            .map(|element| {
                let relative = displacements[element.joint_b] - displacements[element.joint_a];
                element.axial_stiffness * (element.cx * relative.x + element.cy * relative.y)
            })
            .collect();
        AnalysisResult {
            displacements,
            member_forces,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::errors::TopologyError;
    use crate::geometry::point;
    use crate::inventory::{Inventory, Material, SectionFamily, Shape};
    use crate::truss::Restraint;

    fn stock() -> (Material, Shape) {
        let inventory = Inventory::standard();
        (
            inventory.material(0).cloned().expect("carbon steel"),
            inventory.shape(SectionFamily::Bar, 12).expect("100 mm bar"),
        )
    }

    /// Pin at A(0,0), roller at B(8,0), apex C(4,3); members AB, AC, BC.
    fn reference_triangle() -> Truss {
        let (material, shape) = stock();
        let mut truss = Truss::new();
        let a = truss.add_fixed_joint(point(0.0, 0.0), Restraint::PIN);
        let b = truss.add_fixed_joint(point(8.0, 0.0), Restraint::ROLLER);
        let c = truss.add_joint(point(4.0, 3.0));
        for (start, end) in [(a, b), (a, c), (b, c)] {
            truss
                .add_member(start, end, material.clone(), shape)
                .expect("member accepted");
        }
        truss
    }

    #[test]
    fn triangle_forces_match_hand_solution() {
        let truss = reference_triangle();
        let mut loads = LoadVector::new(3);
        loads.add(2, 0.0, -100.0);
        let result = StiffnessAnalyzer::default()
            .analyze(&truss, &loads)
            .expect("analysis succeeds");
        // Each diagonal carries 50 kN vertically at slope 3/5.
        assert_relative_eq!(result.member_forces()[0], 200.0 / 3.0, max_relative = 1.0e-6);
        assert_relative_eq!(result.member_forces()[1], -250.0 / 3.0, max_relative = 1.0e-6);
        assert_relative_eq!(result.member_forces()[2], -250.0 / 3.0, max_relative = 1.0e-6);
        assert_eq!(result.displacement(0), Some(Displacement::default()));
        assert!(result.displacement(2).expect("apex").y < 0.0);
    }

    #[test]
    fn cantilever_bar_matches_closed_form_displacement() {
        let (material, shape) = stock();
        let mut truss = Truss::new();
        let support = truss.add_fixed_joint(point(0.0, 0.0), Restraint::PIN);
        let free = truss.add_fixed_joint(point(1.0, 0.0), Restraint::ROLLER);
        truss
            .add_member(support, free, material, shape)
            .expect("member accepted");
        let mut loads = LoadVector::new(2);
        loads.add(free, -1_000.0, 0.0);

        let result = StiffnessAnalyzer::default()
            .analyze(&truss, &loads)
            .expect("analysis succeeds");
        let expected = -1_000.0 * 1.0 / (0.01 * 200_000_000.0);
        assert_relative_eq!(result.displacements()[free].x, expected, max_relative = 1.0e-9);
        assert_relative_eq!(result.displacements()[free].y, 0.0);
        assert_relative_eq!(result.member_forces()[0], -1_000.0, max_relative = 1.0e-9);
    }

    #[test]
    fn square_without_diagonal_is_unstable() {
        let (material, shape) = stock();
        let mut truss = Truss::new();
        let a = truss.add_fixed_joint(point(0.0, 0.0), Restraint::PIN);
        let b = truss.add_fixed_joint(point(4.0, 0.0), Restraint::ROLLER);
        let c = truss.add_joint(point(4.0, 4.0));
        let d = truss.add_joint(point(0.0, 4.0));
        for (start, end) in [(a, b), (b, c), (c, d), (d, a)] {
            truss
                .add_member(start, end, material.clone(), shape)
                .expect("member accepted");
        }
        let error = StiffnessAnalyzer::default()
            .factor(&truss, None)
            .expect_err("mechanism detected");
        assert!(matches!(error, AnalysisError::Unstable { .. }));
    }

    #[test]
    fn topology_errors_are_reported_before_assembly() {
        let (material, shape) = stock();
        let mut truss = reference_triangle();
        let loose = truss.add_joint(point(10.0, 10.0));
        let far = truss.add_joint(point(12.0, 10.0));
        truss
            .add_member(loose, far, material, shape)
            .expect("member accepted");
        let error = StiffnessAnalyzer::default()
            .factor(&truss, None)
            .expect_err("disconnected joint detected");
        assert_eq!(error, AnalysisError::Topology(TopologyError::DisconnectedJoint(loose)));
    }

    #[test]
    fn degraded_member_sheds_stiffness_not_equilibrium() {
        let truss = reference_triangle();
        let mut loads = LoadVector::new(3);
        loads.add(2, 0.0, -100.0);
        let analyzer = StiffnessAnalyzer::default();
        let intact = analyzer.analyze(&truss, &loads).expect("intact");
        let degraded = analyzer
            .factor(&truss, Some(&[1.0, 0.02, 1.0]))
            .and_then(|system| system.solve(&loads))
            .expect("degraded");
        // Statically determinate, so forces are unchanged while the apex sags further.
        for (a, b) in intact.member_forces().iter().zip(degraded.member_forces()) {
            assert_relative_eq!(*a, *b, max_relative = 1.0e-6);
        }
        assert!(degraded.displacements()[2].y < intact.displacements()[2].y);
    }

    #[test]
    fn multiple_load_vectors_share_one_factorization() {
        let truss = reference_triangle();
        let mut down = LoadVector::new(3);
        down.add(2, 0.0, -100.0);
        let mut side = LoadVector::new(3);
        side.add(2, 50.0, 0.0);
        let analyzer = StiffnessAnalyzer::default();
        let system = analyzer.factor(&truss, None).expect("stable");
        let both = system.solve_all(&[down.clone(), side.clone()]).expect("solved");
        assert_eq!(both.len(), 2);
        assert_eq!(both[0], system.solve(&down).expect("solved"));
        assert_eq!(both[1], system.solve(&side).expect("solved"));
    }

    #[test]
    fn repeated_analysis_is_deterministic() {
        let truss = reference_triangle();
        let mut loads = LoadVector::new(3);
        loads.add(2, 10.0, -100.0);
        let analyzer = StiffnessAnalyzer::default();
        let first = analyzer.analyze(&truss, &loads).expect("stable");
        let second = analyzer.analyze(&truss, &loads).expect("stable");
        assert_eq!(first, second);
    }
}
