#![warn(clippy::pedantic)]

use approx::assert_relative_eq;
use trussim::config::AnalysisConfig;
use trussim::report::render_load_test;
use trussim::{
    strength, Analysis, AnalysisStatus, BridgeModel, ConditionsError, DesignConditions, FailureKind, Gusset,
    Inventory, SectionFamily,
};

fn warren(code: u64, material: usize, family: SectionFamily, size: usize) -> BridgeModel {
    let conditions = DesignConditions::from_code(code).expect("valid scenario");
    let inventory = Inventory::standard();
    let steel = inventory.material(material).cloned().expect("material");
    let shape = inventory.shape(family, size).expect("shape");
    BridgeModel::warren(conditions, 4.0, &steel, shape, shape).expect("valid stock")
}

#[test]
fn scenario_code_round_trips_through_text() {
    let conditions: DesignConditions = "1060804000".parse().expect("valid scenario");
    assert_eq!(conditions.to_string(), "1060804000");
    assert_eq!(conditions.panel_count(), 6);
    assert_relative_eq!(conditions.span_length(), 24.0);

    let error = "12345".parse::<DesignConditions>().expect_err("too short");
    assert!(matches!(error, ConditionsError::Malformed(_)));
}

#[test]
fn strong_warren_passes_every_load_case() {
    let bridge = warren(1_060_804_000, 2, SectionFamily::Tube, 27);
    let analysis = Analysis::run(&bridge, &AnalysisConfig::default()).expect("valid topology");

    assert_eq!(analysis.status(), AnalysisStatus::Passes);
    assert_eq!(analysis.load_case_count(), bridge.conditions().loaded_joint_count());
    for case in 0..analysis.load_case_count() {
        for member in 0..bridge.truss().member_count() {
            assert!(!analysis.member_fails(case, member));
        }
    }
    assert!(!analysis.failure_status().is_failure());
}

#[test]
fn the_truck_adds_load_to_the_dead_load_case() {
    let bridge = warren(1_060_804_000, 2, SectionFamily::Tube, 27);
    let analysis = Analysis::run(&bridge, &AnalysisConfig::default()).expect("valid topology");
    let sag = |case| {
        analysis
            .result(case)
            .and_then(|result| result.displacement(3))
            .expect("mid-span deck joint")
            .y
    };
    // Truck over mid-span sags it further than self-weight alone.
    assert!(sag(0) < 0.0);
    assert!(sag(3) < sag(0));
}

#[test]
fn light_bars_fail_under_self_weight() {
    let bridge = warren(1_060_804_000, 0, SectionFamily::Bar, 6);
    let analysis = Analysis::run(&bridge, &AnalysisConfig::default()).expect("valid topology");

    assert_eq!(analysis.status(), AnalysisStatus::FailsLoadTest);
    let status = analysis.failure_status();
    assert_eq!(status.load_case(), Some(0));
    assert!(status
        .kinds()
        .iter()
        .any(|kind| matches!(kind, FailureKind::Tension | FailureKind::Compression)));

    let report = render_load_test(&bridge, &analysis);
    assert!(report.contains("fails load test"));
}

#[test]
fn analysis_is_deterministic() {
    let bridge = warren(1_060_804_000, 1, SectionFamily::Tube, 20);
    let config = AnalysisConfig::default();
    let first = Analysis::run(&bridge, &config).expect("valid topology");
    let second = Analysis::run(&bridge, &config).expect("valid topology");
    for case in 0..first.load_case_count() {
        assert_eq!(first.result(case), second.result(case));
    }
}

#[test]
fn strength_grows_with_section_size() {
    let inventory = Inventory::standard();
    for material in inventory.materials() {
        for family in [SectionFamily::Bar, SectionFamily::Tube] {
            let shapes = inventory.shapes(family);
            for pair in shapes.windows(2) {
                assert!(pair[1].area() >= pair[0].area());
                assert!(
                    strength::tensile_strength(material, &pair[1]) >= strength::tensile_strength(material, &pair[0])
                );
                assert!(
                    strength::compressive_strength(material, &pair[1], 4.0)
                        >= strength::compressive_strength(material, &pair[0], 4.0)
                );
            }
        }
    }
}

#[test]
fn every_joint_gets_a_gusset() {
    let bridge = warren(1_060_804_000, 2, SectionFamily::Tube, 27);
    let gussets = Gusset::build_all(bridge.truss());

    assert_eq!(gussets.len(), bridge.truss().joint_count());
    for gusset in &gussets {
        assert!(gusset.area() > 0.0);
        assert!(gusset.half_depth() > 0.0);
    }
    // Top chord joints of a 4 m deep truss sit far above the truck.
    let top = gussets.last().expect("top chord joint");
    assert!(!top.is_interfering_with_load());
}
