//! Arena-indexed truss topology: joints, members and their stock.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};

use crate::errors::{MemberPropertyError, TopologyError, TrussEditError};
use crate::geometry::Point;
use crate::inventory::{Material, Shape};

/// Translational restraint of a joint along each axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restraint {
    /// Horizontal translation is prevented.
    pub x: bool,
    /// Vertical translation is prevented.
    pub y: bool,
}

impl Restraint {
    /// No restraint.
    pub const FREE: Restraint = Restraint { x: false, y: false };
    /// Pinned support, both directions restrained.
    pub const PIN: Restraint = Restraint { x: true, y: true };
    /// Roller support, vertical direction restrained.
    pub const ROLLER: Restraint = Restraint { x: false, y: true };

    /// True when at least one direction is restrained.
    #[must_use]
    pub const fn is_support(self) -> bool {
        self.x || self.y
    }

    /// Number of restrained directions.
    #[must_use]
    pub const fn count(self) -> usize {
        self.x as usize + self.y as usize
    }
}

/// A pin joint of the truss.
#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    /// Position in metres.
    position: Point,
    /// Joint was prescribed by the design conditions and cannot be moved or deleted.
    fixed: bool,
    /// Support condition.
    restraint: Restraint,
}

impl Joint {
    /// Position in metres.
    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Whether the joint is prescribed by the design conditions.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Support condition of the joint.
    #[must_use]
    pub fn restraint(&self) -> Restraint {
        self.restraint
    }
}

/// A two-force member connecting two joints.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    /// First end joint.
    joint_a: usize,
    /// Second end joint.
    joint_b: usize,
    /// Assigned material.
    material: Material,
    /// Assigned cross section.
    shape: Shape,
}

impl Member {
    /// Index of the first end joint.
    #[must_use]
    pub fn joint_a(&self) -> usize {
        self.joint_a
    }

    /// Index of the second end joint.
    #[must_use]
    pub fn joint_b(&self) -> usize {
        self.joint_b
    }

    /// Assigned material.
    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Assigned cross section.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// True when `joint` is one of the member's ends.
    #[must_use]
    pub fn has_joint(&self, joint: usize) -> bool {
        self.joint_a == joint || self.joint_b == joint
    }

    /// The end opposite `joint`, if `joint` is an end of this member.
    #[must_use]
    pub fn other_joint(&self, joint: usize) -> Option<usize> {
        if self.joint_a == joint {
            Some(self.joint_b)
        } else if self.joint_b == joint {
            Some(self.joint_a)
        } else {
            None
        }
    }
}

/// Reject stock that would give a member no stiffness.
fn check_stock(member: usize, material: &Material, shape: &Shape) -> Result<(), TrussEditError> {
    let source = if shape.area() <= 0.0 {
        MemberPropertyError::NonPositiveArea { area: shape.area() }
    } else if shape.moment() <= 0.0 {
        MemberPropertyError::NonPositiveMoment {
            moment: shape.moment(),
        }
    } else if material.elastic_modulus() <= 0.0 {
        MemberPropertyError::NonPositiveElasticModulus {
            elastic_modulus: material.elastic_modulus(),
        }
    } else {
        return Ok(());
    };
    Err(TrussEditError::InvalidMemberProperties { member, source })
}

/// Container for a planar pin-jointed truss.
///
/// Joints and members live in contiguous arenas and refer to each other by index.
/// Removing a joint or member shifts the indices of everything after it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Truss {
    /// Joint arena.
    joints: Vec<Joint>,
    /// Member arena.
    members: Vec<Member>,
}

impl Truss {
    /// Create an empty truss.
    ///
    /// # Examples
    /// ```
    /// use trussim::Truss;
    ///
    /// let truss = Truss::new();
    /// assert_eq!(truss.joint_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of joints in the truss.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Return the number of members in the truss.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// All joints in index order.
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// All members in index order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Joint at `index`.
    #[must_use]
    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    /// Member at `index`.
    #[must_use]
    pub fn member(&self, index: usize) -> Option<&Member> {
        self.members.get(index)
    }

    /// Add a new free joint to the truss and return its index.
    ///
    /// # Examples
    /// ```
    /// use trussim::{point, Truss};
    ///
    /// let mut truss = Truss::new();
    /// let joint = truss.add_joint(point(4.0, 3.0));
    /// assert_eq!(truss.joint_count(), 1);
    /// assert_eq!(joint, 0);
    /// ```
    pub fn add_joint(&mut self, position: Point) -> usize {
        self.joints.push(Joint {
            position,
            fixed: false,
            restraint: Restraint::FREE,
        });
        self.joints.len() - 1
    }

    /// Add a joint prescribed by the design conditions.
    pub fn add_fixed_joint(&mut self, position: Point, restraint: Restraint) -> usize {
        self.joints.push(Joint {
            position,
            fixed: true,
            restraint,
        });
        self.joints.len() - 1
    }

    /// Update the position of an existing joint.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownJoint`] when `joint` is not part of this truss and
    /// [`TrussEditError::FixedJoint`] when it is prescribed by the design conditions.
    pub fn move_joint(&mut self, joint: usize, position: Point) -> Result<(), TrussEditError> {
        let node = self
            .joints
            .get_mut(joint)
            .ok_or(TrussEditError::UnknownJoint(joint))?;
        if node.fixed {
            return Err(TrussEditError::FixedJoint(joint));
        }
        node.position = position;
        Ok(())
    }

    /// Remove a joint and all connected members from the truss.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownJoint`] when `joint` is not part of this truss and
    /// [`TrussEditError::FixedJoint`] when it is prescribed by the design conditions.
    pub fn remove_joint(&mut self, joint: usize) -> Result<(), TrussEditError> {
        let node = self
            .joints
            .get(joint)
            .ok_or(TrussEditError::UnknownJoint(joint))?;
        if node.fixed {
            return Err(TrussEditError::FixedJoint(joint));
        }
        self.members.retain(|member| !member.has_joint(joint));
        for member in &mut self.members {
            if member.joint_a > joint {
                member.joint_a -= 1;
            }
            if member.joint_b > joint {
                member.joint_b -= 1;
            }
        }
        self.joints.remove(joint);
        Ok(())
    }

    /// Connect two joints with a new member and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownJoint`] for a missing end joint,
    /// [`TrussEditError::SelfConnectedMember`] when both ends coincide and
    /// [`TrussEditError::InvalidMemberProperties`] for stock without stiffness.
    pub fn add_member(
        &mut self,
        joint_a: usize,
        joint_b: usize,
        material: Material,
        shape: Shape,
    ) -> Result<usize, TrussEditError> {
        for joint in [joint_a, joint_b] {
            if joint >= self.joints.len() {
                return Err(TrussEditError::UnknownJoint(joint));
            }
        }
        if joint_a == joint_b {
            return Err(TrussEditError::SelfConnectedMember(joint_a));
        }
        let index = self.members.len();
        check_stock(index, &material, &shape)?;
        self.members.push(Member {
            joint_a,
            joint_b,
            material,
            shape,
        });
        Ok(index)
    }

    /// Remove a member from the truss.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownMember`] when `member` is not part of this truss.
    pub fn remove_member(&mut self, member: usize) -> Result<(), TrussEditError> {
        if member >= self.members.len() {
            return Err(TrussEditError::UnknownMember(member));
        }
        self.members.remove(member);
        Ok(())
    }

    /// Assign new stock to a member.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownMember`] when `member` is not part of this truss and
    /// [`TrussEditError::InvalidMemberProperties`] for stock without stiffness.
    ///
    /// # Examples
    /// ```
    /// use trussim::{point, Inventory, SectionFamily, Shape, Truss, TrussEditError};
    ///
    /// let inventory = Inventory::standard();
    /// let steel = inventory.material(0).cloned().expect("carbon steel");
    /// let bar = inventory.shape(SectionFamily::Bar, 4).expect("50 mm bar");
    ///
    /// let mut truss = Truss::new();
    /// let a = truss.add_joint(point(0.0, 0.0));
    /// let b = truss.add_joint(point(4.0, 0.0));
    /// let member = truss.add_member(a, b, steel.clone(), bar).expect("valid member");
    ///
    /// let flat = Shape::new(SectionFamily::Bar, 0, 30.0, 30.0, 0.0, 1.0e-8);
    /// let error = truss
    ///     .set_member_stock(member, steel, flat)
    ///     .expect_err("invalid area rejected");
    /// match error {
    ///     TrussEditError::InvalidMemberProperties { member: 0, .. } => (),
    ///     other => panic!("unexpected error: {other:?}"),
    /// }
    /// ```
    pub fn set_member_stock(
        &mut self,
        member: usize,
        material: Material,
        shape: Shape,
    ) -> Result<(), TrussEditError> {
        if member >= self.members.len() {
            return Err(TrussEditError::UnknownMember(member));
        }
        check_stock(member, &material, &shape)?;
        let edge = &mut self.members[member];
        edge.material = material;
        edge.shape = shape;
        Ok(())
    }

    /// Set the restraint state for a joint.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownJoint`] when `joint` is not part of this truss.
    pub fn set_restraint(&mut self, joint: usize, restraint: Restraint) -> Result<(), TrussEditError> {
        let node = self
            .joints
            .get_mut(joint)
            .ok_or(TrussEditError::UnknownJoint(joint))?;
        node.restraint = restraint;
        Ok(())
    }

    /// Distance between the end joints of a member.
    #[must_use]
    pub fn member_length(&self, member: usize) -> Option<f64> {
        let member = self.members.get(member)?;
        let a = self.joints.get(member.joint_a)?;
        let b = self.joints.get(member.joint_b)?;
        Some(a.position.distance(b.position))
    }

    /// Indices of the members meeting at `joint`, in member order.
    #[must_use]
    pub fn incident_members(&self, joint: usize) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, member)| member.has_joint(joint))
            .map(|(index, _)| index)
            .collect()
    }

    /// Check that the truss can be assembled into a stiffness system.
    ///
    /// Every member must join two distinct existing joints a non-zero distance apart,
    /// and every joint must reach a support through members.
    ///
    /// # Errors
    ///
    /// Returns the first [`TopologyError`] found, members before joints.
    pub fn validate(&self) -> Result<(), TopologyError> {
        for (index, member) in self.members.iter().enumerate() {
            for joint in [member.joint_a, member.joint_b] {
                if joint >= self.joints.len() {
                    return Err(TopologyError::UnknownJoint {
                        member: index,
                        joint,
                    });
                }
            }
            if member.joint_a == member.joint_b {
                return Err(TopologyError::SelfConnectedMember(index));
            }
            if self.member_length(index) == Some(0.0) {
                return Err(TopologyError::ZeroLengthMember(index));
            }
        }

        let mut graph = UnGraph::<(), ()>::with_capacity(self.joints.len(), self.members.len());
        let nodes: Vec<NodeIndex> = self.joints.iter().map(|_| graph.add_node(())).collect();
        for member in &self.members {
            graph.add_edge(nodes[member.joint_a], nodes[member.joint_b], ());
        }

        let mut reached = vec![false; self.joints.len()];
        let mut dfs = Dfs::empty(&graph);
        for (index, joint) in self.joints.iter().enumerate() {
            if !joint.restraint.is_support() || reached[index] {
                continue;
            }
            dfs.move_to(nodes[index]);
            while let Some(node) = dfs.next(&graph) {
                reached[node.index()] = true;
            }
        }
        match reached.iter().position(|&r| !r) {
            Some(joint) => Err(TopologyError::DisconnectedJoint(joint)),
            None => Ok(()),
        }
    }

    /// True when no member is longer than its shape allows at the given slenderness limit.
    #[must_use]
    pub fn is_passing_slenderness_check(&self, allowable: f64) -> bool {
        (0..self.members.len()).all(|index| {
            let shape = &self.members[index].shape;
            self.member_length(index)
                .is_some_and(|length| length * shape.inverse_radius_of_gyration() <= allowable)
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;
    use crate::inventory::{Inventory, SectionFamily};

    fn stock() -> (Material, Shape) {
        let inventory = Inventory::standard();
        (
            inventory.material(0).cloned().expect("carbon steel"),
            inventory.shape(SectionFamily::Tube, 12).expect("100 mm tube"),
        )
    }

    fn triangle() -> Truss {
        let (material, shape) = stock();
        let mut truss = Truss::new();
        let a = truss.add_fixed_joint(point(0.0, 0.0), Restraint::PIN);
        let b = truss.add_fixed_joint(point(8.0, 0.0), Restraint::ROLLER);
        let c = truss.add_joint(point(4.0, 3.0));
        truss
            .add_member(a, b, material.clone(), shape)
            .expect("member accepted");
        truss
            .add_member(a, c, material.clone(), shape)
            .expect("member accepted");
        truss.add_member(b, c, material, shape).expect("member accepted");
        truss
    }

    #[test]
    fn joint_mutators_return_error_for_unknown_indices() {
        let mut truss = triangle();
        let missing = truss.joint_count();

        let move_error = truss
            .move_joint(missing, point(2.0, 0.0))
            .expect_err("unknown joint rejected");
        assert_eq!(move_error, TrussEditError::UnknownJoint(missing));

        let restraint_error = truss
            .set_restraint(missing, Restraint::PIN)
            .expect_err("unknown joint rejected");
        assert_eq!(restraint_error, TrussEditError::UnknownJoint(missing));

        let remove_error = truss
            .remove_joint(missing)
            .expect_err("unknown joint rejected");
        assert_eq!(remove_error, TrussEditError::UnknownJoint(missing));
    }

    #[test]
    fn fixed_joints_cannot_be_moved_or_removed() {
        let mut truss = triangle();
        assert_eq!(
            truss.move_joint(0, point(1.0, 1.0)),
            Err(TrussEditError::FixedJoint(0))
        );
        assert_eq!(truss.remove_joint(1), Err(TrussEditError::FixedJoint(1)));
        truss.move_joint(2, point(4.0, 4.0)).expect("free joint moves");
        assert_relative_eq!(truss.member_length(1).expect("member exists"), 32.0_f64.sqrt());
    }

    #[test]
    fn member_mutators_return_error_for_unknown_indices() {
        let (material, shape) = stock();
        let mut truss = triangle();
        let missing = truss.member_count();
        assert_eq!(
            truss.set_member_stock(missing, material.clone(), shape),
            Err(TrussEditError::UnknownMember(missing))
        );
        assert_eq!(
            truss.remove_member(missing),
            Err(TrussEditError::UnknownMember(missing))
        );
        assert_eq!(
            truss.add_member(0, 9, material.clone(), shape),
            Err(TrussEditError::UnknownJoint(9))
        );
        assert_eq!(
            truss.add_member(2, 2, material, shape),
            Err(TrussEditError::SelfConnectedMember(2))
        );
    }

    #[test]
    fn invalid_member_properties_are_rejected() {
        let (material, _) = stock();
        let mut truss = triangle();
        let hollow = Shape::new(SectionFamily::Tube, 0, 30.0, 2.0, 2.0e-4, 0.0);
        let error = truss
            .add_member(0, 2, material, hollow)
            .expect_err("zero moment rejected");
        assert!(matches!(
            error,
            TrussEditError::InvalidMemberProperties {
                member: 3,
                source: MemberPropertyError::NonPositiveMoment { .. }
            }
        ));
    }

    #[test]
    fn removing_a_joint_drops_members_and_renumbers() {
        let (material, shape) = stock();
        let mut truss = triangle();
        let d = truss.add_joint(point(4.0, -3.0));
        let e = truss.add_joint(point(6.0, -3.0));
        truss
            .add_member(d, e, material.clone(), shape)
            .expect("member accepted");
        truss.add_member(e, 1, material, shape).expect("member accepted");

        truss.remove_joint(d).expect("free joint removed");
        assert_eq!(truss.joint_count(), 4);
        assert_eq!(truss.member_count(), 4);
        let last = truss.member(3).expect("renumbered member");
        assert_eq!((last.joint_a(), last.joint_b()), (3, 1));
        assert_eq!(truss.incident_members(3), vec![3]);
    }

    #[test]
    fn valid_truss_passes_topology_checks() {
        assert_eq!(triangle().validate(), Ok(()));
    }

    #[test]
    fn zero_length_member_is_rejected() {
        let (material, shape) = stock();
        let mut truss = triangle();
        let d = truss.add_joint(point(4.0, 3.0));
        let member = truss
            .add_member(2, d, material, shape)
            .expect("coincident joints are accepted by the editor");
        assert_eq!(truss.validate(), Err(TopologyError::ZeroLengthMember(member)));
    }

    #[test]
    fn joint_without_load_path_is_disconnected() {
        let (material, shape) = stock();
        let mut truss = triangle();
        let d = truss.add_joint(point(20.0, 5.0));
        let e = truss.add_joint(point(24.0, 5.0));
        truss.add_member(d, e, material, shape).expect("member accepted");
        assert_eq!(truss.validate(), Err(TopologyError::DisconnectedJoint(d)));
    }

    #[test]
    fn supported_joint_without_members_is_connected() {
        let mut truss = triangle();
        truss.add_fixed_joint(point(-8.0, 0.0), Restraint::PIN);
        assert_eq!(truss.validate(), Ok(()));
    }

    #[test]
    fn slenderness_check_compares_every_member() {
        let truss = triangle();
        assert!(truss.is_passing_slenderness_check(f64::INFINITY));
        assert!(truss.is_passing_slenderness_check(300.0));
        assert!(!truss.is_passing_slenderness_check(10.0));
    }
}
