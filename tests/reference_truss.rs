#![warn(clippy::pedantic)]

use approx::assert_relative_eq;
use trussim::loads::LoadVector;
use trussim::{point, Inventory, Restraint, SectionFamily, StiffnessAnalyzer, Truss};

/// Member indices of the reference truss.
#[derive(Debug, Clone, Copy)]
struct ReferenceMembers {
    left_chord: usize,
    right_chord: usize,
    left_diagonal: usize,
    right_diagonal: usize,
    hanger: usize,
}

/// Two 4 m panels under a 3 m apex: pin at the left, roller at the right, the load
/// hung from the middle of the bottom chord. Five members and three reactions make it
/// statically determinate.
fn build_reference_truss() -> (Truss, ReferenceMembers) {
    let inventory = Inventory::standard();
    let steel = inventory.material(0).cloned().expect("carbon steel");
    let tube = inventory.shape(SectionFamily::Tube, 16).expect("tube");

    let mut truss = Truss::new();
    let a = truss.add_fixed_joint(point(0.0, 0.0), Restraint::PIN);
    let b = truss.add_joint(point(4.0, 0.0));
    let c = truss.add_fixed_joint(point(8.0, 0.0), Restraint::ROLLER);
    let d = truss.add_joint(point(4.0, 3.0));

    let mut add = |from, to| {
        truss
            .add_member(from, to, steel.clone(), tube)
            .expect("member assignment succeeds")
    };
    let members = ReferenceMembers {
        left_chord: add(a, b),
        right_chord: add(b, c),
        left_diagonal: add(a, d),
        right_diagonal: add(d, c),
        hanger: add(b, d),
    };
    (truss, members)
}

#[test]
fn builds_expected_topology() {
    let (truss, members) = build_reference_truss();

    assert_eq!(truss.joint_count(), 4);
    assert_eq!(truss.member_count(), 5);
    assert_eq!(members.left_chord, 0);
    assert_eq!(members.hanger, 4);
    truss.validate().expect("every joint reaches a support");
}

#[test]
fn member_forces_match_hand_solution() {
    let (truss, members) = build_reference_truss();
    let mut loads = LoadVector::new(truss.joint_count());
    loads.add(1, 0.0, -60.0);

    let result = StiffnessAnalyzer::default()
        .analyze(&truss, &loads)
        .expect("reference truss is stable");
    let force = |member| result.member_force(member).expect("member force available");

    // 30 kN at each support; the diagonals slope 3 in 5.
    assert_relative_eq!(force(members.left_diagonal), -50.0, max_relative = 1.0e-6);
    assert_relative_eq!(force(members.right_diagonal), -50.0, max_relative = 1.0e-6);
    assert_relative_eq!(force(members.left_chord), 40.0, max_relative = 1.0e-6);
    assert_relative_eq!(force(members.right_chord), 40.0, max_relative = 1.0e-6);
    assert_relative_eq!(force(members.hanger), 60.0, max_relative = 1.0e-6);
}

#[test]
fn supports_hold_and_the_loaded_joint_sags() {
    let (truss, _) = build_reference_truss();
    let mut loads = LoadVector::new(truss.joint_count());
    loads.add(1, 0.0, -60.0);

    let result = StiffnessAnalyzer::default()
        .analyze(&truss, &loads)
        .expect("reference truss is stable");
    let pinned = result.displacement(0).expect("joint 0");
    let roller = result.displacement(2).expect("joint 2");
    let loaded = result.displacement(1).expect("joint 1");

    assert!(pinned.x.abs() < f64::EPSILON);
    assert!(pinned.y.abs() < f64::EPSILON);
    assert!(roller.y.abs() < f64::EPSILON);
    // The bottom chord stretches, so the roller slides outward.
    assert!(roller.x > 0.0);
    assert!(loaded.y < 0.0);
}

#[test]
fn repeated_analysis_is_deterministic() {
    let (truss, _) = build_reference_truss();
    let mut loads = LoadVector::new(truss.joint_count());
    loads.add(1, 5.0, -60.0);
    loads.add(3, 0.0, -10.0);

    let analyzer = StiffnessAnalyzer::default();
    let first = analyzer.analyze(&truss, &loads).expect("stable");
    let second = analyzer.analyze(&truss, &loads).expect("stable");
    assert_eq!(first, second);
}
