//! Plain-text load test report.

use std::fmt::Write;

use crate::analysis::{Analysis, AnalysisStatus};
use crate::bridge::BridgeModel;

/// Render the load test results of `bridge` as a member table.
///
/// Each row gives the member's stock and length, then the worst compression and
/// tension over every load case next to the matching strength. Ratios above 1.00 are
/// marked `FAIL`.
#[must_use]
pub fn render_load_test(bridge: &BridgeModel, analysis: &Analysis) -> String {
    let mut output = String::new();
    let conditions = bridge.conditions();
    let truss = bridge.truss();

    writeln!(
        &mut output,
        "Load test for scenario {conditions} ({} panels, {:.0} m span, deck x {:.0} to {:.0} m)",
        conditions.panel_count(),
        conditions.span_length(),
        conditions.x_leftmost_deck_joint(),
        conditions.x_rightmost_deck_joint()
    )
    .expect("writing to string cannot fail");
    writeln!(
        &mut output,
        "{} joints, {} members, {} load cases",
        truss.joint_count(),
        truss.member_count(),
        analysis.load_case_count()
    )
    .expect("writing to string cannot fail");
    writeln!(&mut output, "Status: {}", analysis.status()).expect("writing to string cannot fail");

    if analysis.status() == AnalysisStatus::Unstable {
        output.push_str("No member forces: the structure is a mechanism.\n");
        return output;
    }

    writeln!(
        &mut output,
        "{:>4}  {:<28} {:>7}  {:>9} {:>9} {:>6}  {:>9} {:>9} {:>6}",
        "#", "stock", "length", "comp kN", "str kN", "ratio", "tens kN", "str kN", "ratio"
    )
    .expect("writing to string cannot fail");
    for (index, member) in truss.members().iter().enumerate() {
        let compression = analysis.compression_ratio(index);
        let tension = analysis.tension_ratio(index);
        let verdict = if compression > 1.0 || tension > 1.0 {
            "  FAIL"
        } else if analysis.detector().is_too_slender(index) {
            "  SLENDER"
        } else {
            ""
        };
        writeln!(
            &mut output,
            "{:>4}  {:<28} {:>7.2}  {:>9.1} {:>9.1} {:>6.2}  {:>9.1} {:>9.1} {:>6.2}{verdict}",
            index + 1,
            format!("{} {}", member.material().short_name(), member.shape()),
            truss.member_length(index).unwrap_or(0.0),
            analysis.max_compression(index),
            analysis.member_compressive_strength(index),
            compression,
            analysis.max_tension(index),
            analysis.member_tensile_strength(index),
            tension,
        )
        .expect("writing to string cannot fail");
    }

    let failure = analysis.failure_status();
    if let Some(case) = failure.load_case() {
        writeln!(
            &mut output,
            "First failure at load case {case} ({} members)",
            failure.member_failures().iter().filter(|f| f.kind.is_force_failure()).count()
        )
        .expect("writing to string cannot fail");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::conditions::DesignConditions;
    use crate::inventory::{Inventory, SectionFamily};

    fn report(material: usize, family: SectionFamily, size: usize) -> String {
        let conditions = DesignConditions::from_code(1_060_804_000).expect("valid scenario");
        let inventory = Inventory::standard();
        let steel = inventory.material(material).cloned().expect("material");
        let shape = inventory.shape(family, size).expect("shape");
        let bridge = BridgeModel::warren(conditions, 4.0, &steel, shape, shape).expect("valid stock");
        let analysis = Analysis::run(&bridge, &AnalysisConfig::default()).expect("valid topology");
        render_load_test(&bridge, &analysis)
    }

    #[test]
    fn passing_bridge_report() {
        let text = report(2, SectionFamily::Tube, 27);
        assert!(text.contains("Load test for scenario 1060804000 (6 panels, 24 m span, deck x 0 to 24 m)"));
        assert!(text.contains("Status: passes"));
        assert!(!text.contains("FAIL"));
        assert!(!text.contains("First failure"));
        // Header, counts, status, column titles and one row per member.
        assert_eq!(text.lines().count(), 4 + 23);
    }

    #[test]
    fn failing_bridge_report_marks_members() {
        let text = report(0, SectionFamily::Bar, 6);
        assert!(text.contains("Status: fails load test"));
        assert!(text.contains("FAIL"));
        assert!(text.contains("First failure at load case 0"));
    }
}
