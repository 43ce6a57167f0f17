//! The bridge load test: every panel-point load case solved and checked.

use std::fmt;

use tracing::debug;

use crate::bridge::BridgeModel;
use crate::config::AnalysisConfig;
use crate::errors::{AnalysisError, TopologyError};
use crate::failure::{FailureDetector, FailureStatus};
use crate::loads::{self, LoadCase};
use crate::stiffness::{AnalysisResult, StiffnessAnalyzer, StiffnessSystem};

/// Overall outcome of a load test, worst first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnalysisStatus {
    /// The structure is a mechanism.
    Unstable,
    /// Some member is too slender.
    FailsSlenderness,
    /// Some member is overloaded in some load case.
    FailsLoadTest,
    /// Every member carries every load case.
    Passes,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnalysisStatus::Unstable => "unstable",
            AnalysisStatus::FailsSlenderness => "fails slenderness check",
            AnalysisStatus::FailsLoadTest => "fails load test",
            AnalysisStatus::Passes => "passes",
        })
    }
}

/// Results of the load test of one bridge.
#[derive(Clone, Debug)]
pub struct Analysis {
    /// Worst outcome over all load cases.
    status: AnalysisStatus,
    /// Panel-point load cases, dead load only first.
    load_cases: Vec<LoadCase>,
    /// Factored stiffness system; `None` when unstable.
    system: Option<StiffnessSystem>,
    /// One solution per load case.
    results: Vec<AnalysisResult>,
    /// Member capacities.
    detector: FailureDetector,
    /// Overload flags indexed by load case, then member.
    member_fails: Vec<Vec<bool>>,
    /// Largest compression per member, positive.
    max_compression: Vec<f64>,
    /// Largest tension per member.
    max_tension: Vec<f64>,
}

impl Analysis {
    /// Run the load test.
    ///
    /// Instability is reported through [`AnalysisStatus::Unstable`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] when the truss cannot be assembled at all.
    ///
    /// # Examples
    /// ```
    /// use trussim::config::AnalysisConfig;
    /// use trussim::{Analysis, AnalysisStatus, BridgeModel, DesignConditions, Inventory, SectionFamily};
    ///
    /// let conditions = DesignConditions::from_code(1_060_804_000).expect("valid scenario");
    /// let inventory = Inventory::standard();
    /// let steel = inventory.material(2).cloned().expect("quenched steel");
    /// let tube = inventory.shape(SectionFamily::Tube, 27).expect("300 mm tube");
    /// let bridge = BridgeModel::warren(conditions, 4.0, &steel, tube, tube).expect("valid stock");
    ///
    /// let analysis = Analysis::run(&bridge, &AnalysisConfig::default()).expect("valid topology");
    /// assert_eq!(analysis.status(), AnalysisStatus::Passes);
    /// assert_eq!(analysis.load_case_count(), 7);
    /// ```
    pub fn run(bridge: &BridgeModel, config: &AnalysisConfig) -> Result<Self, TopologyError> {
        Self::run_scaled(bridge, None, config)
    }

    /// Run the load test with the members flagged in `failed` weakened to
    /// `config.failed_member_degradation` of their stiffness.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] when the truss cannot be assembled at all.
    pub fn run_degraded(
        bridge: &BridgeModel,
        failed: &[bool],
        config: &AnalysisConfig,
    ) -> Result<Self, TopologyError> {
        let scale: Vec<f64> = failed
            .iter()
            .map(|&f| if f { config.failed_member_degradation } else { 1.0 })
            .collect();
        Self::run_scaled(bridge, Some(&scale), config)
    }

    /// Shared body of [`Analysis::run`] and [`Analysis::run_degraded`].
    fn run_scaled(
        bridge: &BridgeModel,
        scale: Option<&[f64]>,
        config: &AnalysisConfig,
    ) -> Result<Self, TopologyError> {
        let truss = bridge.truss();
        let member_count = truss.member_count();
        let detector = FailureDetector::new(truss, bridge.conditions().allowable_slenderness());
        let load_cases = loads::panel_point_load_cases(bridge);
        let mut analysis = Self {
            status: AnalysisStatus::Unstable,
            load_cases,
            system: None,
            results: Vec::new(),
            detector,
            member_fails: Vec::new(),
            max_compression: vec![0.0; member_count],
            max_tension: vec![0.0; member_count],
        };

        let analyzer = StiffnessAnalyzer::new(config.pivot_tolerance);
        let solved = analyzer.factor(truss, scale).and_then(|system| {
            let vectors: Vec<_> = analysis
                .load_cases
                .iter()
                .map(|case| loads::load_vector(bridge, case))
                .collect();
            let results = system.solve_all(&vectors)?;
            Ok((system, results))
        });
        let (system, results) = match solved {
            Ok(solved) => solved,
            Err(AnalysisError::Topology(error)) => return Err(error),
            Err(AnalysisError::Unstable { pivot, tolerance }) => {
                debug!(pivot, tolerance, "load test found an unstable structure");
                return Ok(analysis);
            }
        };

        analysis.status = AnalysisStatus::Passes;
        for result in &results {
            let fails: Vec<bool> = result
                .member_forces()
                .iter()
                .enumerate()
                .map(|(member, &force)| {
                    if force < 0.0 {
                        analysis.max_compression[member] = analysis.max_compression[member].max(-force);
                    } else {
                        analysis.max_tension[member] = analysis.max_tension[member].max(force);
                    }
                    analysis.detector.member_failure(member, force).is_some()
                })
                .collect();
            if fails.iter().any(|&f| f) {
                analysis.status = AnalysisStatus::FailsLoadTest;
            }
            analysis.member_fails.push(fails);
        }
        if !bridge.is_passing_slenderness_check() {
            analysis.status = AnalysisStatus::FailsSlenderness;
        }
        analysis.system = Some(system);
        analysis.results = results;
        debug!(
            status = %analysis.status,
            load_cases = analysis.load_cases.len(),
            members = member_count,
            "load test complete"
        );
        Ok(analysis)
    }

    /// Overall outcome.
    #[must_use]
    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    /// True when the structure is a mechanism.
    #[must_use]
    pub fn is_unstable(&self) -> bool {
        self.status == AnalysisStatus::Unstable
    }

    /// Number of panel-point load cases, one per deck joint.
    #[must_use]
    pub fn load_case_count(&self) -> usize {
        self.load_cases.len()
    }

    /// The panel-point load cases; case 0 is dead load only.
    #[must_use]
    pub fn load_cases(&self) -> &[LoadCase] {
        &self.load_cases
    }

    /// Solution of one load case; `None` for unstable structures.
    #[must_use]
    pub fn result(&self, load_case: usize) -> Option<&AnalysisResult> {
        self.results.get(load_case)
    }

    /// Whether a member is overloaded in a load case.
    #[must_use]
    pub fn member_fails(&self, load_case: usize, member: usize) -> bool {
        self.member_fails
            .get(load_case)
            .and_then(|fails| fails.get(member))
            .copied()
            .unwrap_or(false)
    }

    /// Capacity checks used by this analysis.
    #[must_use]
    pub fn detector(&self) -> &FailureDetector {
        &self.detector
    }

    /// Factored compressive strength of a member; 0 for members outside the truss.
    #[must_use]
    pub fn member_compressive_strength(&self, member: usize) -> f64 {
        self.detector
            .capacities()
            .get(member)
            .map_or(0.0, |capacity| capacity.compressive)
    }

    /// Factored tensile strength of a member; 0 for members outside the truss.
    #[must_use]
    pub fn member_tensile_strength(&self, member: usize) -> f64 {
        self.detector
            .capacities()
            .get(member)
            .map_or(0.0, |capacity| capacity.tensile)
    }

    /// Largest compression over all load cases, as a positive number.
    #[must_use]
    pub fn max_compression(&self, member: usize) -> f64 {
        self.max_compression.get(member).copied().unwrap_or(0.0)
    }

    /// Largest tension over all load cases.
    #[must_use]
    pub fn max_tension(&self, member: usize) -> f64 {
        self.max_tension.get(member).copied().unwrap_or(0.0)
    }

    /// Largest compression over the compressive strength; 0 for members outside the truss.
    #[must_use]
    pub fn compression_ratio(&self, member: usize) -> f64 {
        ratio(self.max_compression(member), self.member_compressive_strength(member))
    }

    /// Largest tension over the tensile strength; 0 for members outside the truss.
    #[must_use]
    pub fn tension_ratio(&self, member: usize) -> f64 {
        ratio(self.max_tension(member), self.member_tensile_strength(member))
    }

    /// Failures at the first load case that overloads a member, or the slenderness
    /// failures alone when no load case does.
    #[must_use]
    pub fn failure_status(&self) -> FailureStatus {
        if self.is_unstable() {
            return FailureStatus::unstable(None);
        }
        let first = (0..self.member_fails.len()).find(|&case| self.member_fails[case].iter().any(|&f| f));
        match first {
            Some(case) => self.detector.detect(&self.results[case]).at_load_case(case),
            None => self
                .results
                .first()
                .map(|result| self.detector.detect(result))
                .unwrap_or_default(),
        }
    }

    /// Solve an arbitrary load case with the factored system of this analysis.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Unstable`] for unstable structures.
    pub fn solve(&self, bridge: &BridgeModel, case: &LoadCase) -> Result<AnalysisResult, AnalysisError> {
        let system = self.system.as_ref().ok_or(AnalysisError::Unstable {
            pivot: 0.0,
            tolerance: 0.0,
        })?;
        system.solve(&loads::load_vector(bridge, case))
    }
}

/// Force over strength, 0 when there is no strength to compare against.
fn ratio(force: f64, strength: f64) -> f64 {
    if strength > 0.0 {
        force / strength
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::conditions::DesignConditions;
    use crate::inventory::{Inventory, SectionFamily};

    fn warren(material: usize, family: SectionFamily, size: usize) -> BridgeModel {
        let conditions = DesignConditions::from_code(1_060_804_000).expect("valid scenario");
        let inventory = Inventory::standard();
        let steel = inventory.material(material).cloned().expect("material");
        let shape = inventory.shape(family, size).expect("shape");
        BridgeModel::warren(conditions, 4.0, &steel, shape, shape).expect("valid stock")
    }

    #[test]
    fn strong_bridge_passes() {
        let bridge = warren(2, SectionFamily::Tube, 27);
        let analysis = Analysis::run(&bridge, &AnalysisConfig::default()).expect("valid topology");
        assert_eq!(analysis.status(), AnalysisStatus::Passes);
        assert!(!analysis.failure_status().is_failure());
        for member in 0..bridge.truss().member_count() {
            assert!(analysis.compression_ratio(member) <= 1.0);
            assert!(analysis.tension_ratio(member) <= 1.0);
        }
    }

    #[test]
    fn weak_bridge_fails_under_dead_load() {
        let bridge = warren(0, SectionFamily::Bar, 6);
        let analysis = Analysis::run(&bridge, &AnalysisConfig::default()).expect("valid topology");
        assert_eq!(analysis.status(), AnalysisStatus::FailsLoadTest);
        let status = analysis.failure_status();
        assert!(status.is_load_failure());
        assert_eq!(status.load_case(), Some(0));
    }

    #[test]
    fn thin_bars_fail_slenderness() {
        let bridge = warren(0, SectionFamily::Bar, 0);
        let analysis = Analysis::run(&bridge, &AnalysisConfig::default()).expect("valid topology");
        assert_eq!(analysis.status(), AnalysisStatus::FailsSlenderness);
    }

    #[test]
    fn missing_diagonal_is_unstable() {
        let mut bridge = warren(2, SectionFamily::Tube, 27);
        let last = bridge.truss().member_count() - 1;
        bridge.truss_mut().remove_member(last).expect("member exists");
        let analysis = Analysis::run(&bridge, &AnalysisConfig::default()).expect("valid topology");
        assert!(analysis.is_unstable());
        assert!(analysis.result(0).is_none());
        assert!(analysis.failure_status().is_unstable());
    }

    #[test]
    fn panel_point_solve_matches_cached_case() {
        let bridge = warren(1, SectionFamily::Tube, 20);
        let analysis = Analysis::run(&bridge, &AnalysisConfig::default()).expect("valid topology");
        let direct = analysis
            .solve(&bridge, &LoadCase::panel_point(3))
            .expect("stable");
        let cached = analysis.result(3).expect("case 3");
        for (a, b) in direct.member_forces().iter().zip(cached.member_forces()) {
            assert_relative_eq!(*a, *b, max_relative = 1.0e-12, epsilon = 1.0e-9);
        }
    }

    #[test]
    fn degraded_analysis_softens_failed_members() {
        let bridge = warren(1, SectionFamily::Tube, 20);
        let config = AnalysisConfig::default();
        let intact = Analysis::run(&bridge, &config).expect("valid topology");
        let mut failed = vec![false; bridge.truss().member_count()];
        failed[1] = true;
        let degraded = Analysis::run_degraded(&bridge, &failed, &config).expect("valid topology");
        let sag = |a: &Analysis| a.result(0).and_then(|r| r.displacement(3)).expect("deck joint").y;
        assert!(sag(&degraded) < sag(&intact));
    }

    #[test]
    fn full_removal_of_a_failed_member_leaves_a_mechanism() {
        let bridge = warren(1, SectionFamily::Tube, 20);
        let config = AnalysisConfig::default().with_failed_member_degradation(0.0);
        let mut failed = vec![false; bridge.truss().member_count()];
        failed[1] = true;
        let removed = Analysis::run_degraded(&bridge, &failed, &config).expect("valid topology");
        // The Warren truss is statically determinate, so losing any member unlocks it.
        assert_eq!(removed.status(), AnalysisStatus::Unstable);
        assert!(removed.result(0).is_none());
        assert!(removed.failure_status().is_unstable());
    }

    #[test]
    fn members_outside_the_truss_report_nothing() {
        let bridge = warren(1, SectionFamily::Tube, 20);
        let analysis = Analysis::run(&bridge, &AnalysisConfig::default()).expect("valid topology");
        let outside = bridge.truss().member_count();
        assert!(!analysis.member_fails(0, outside));
        assert_eq!(analysis.max_compression(outside), 0.0);
        assert_eq!(analysis.max_tension(outside), 0.0);
        assert_eq!(analysis.member_compressive_strength(outside), 0.0);
        assert_eq!(analysis.member_tensile_strength(outside), 0.0);
        assert_eq!(analysis.compression_ratio(outside), 0.0);
        assert_eq!(analysis.tension_ratio(outside), 0.0);
        assert!(analysis.member_tensile_strength(outside - 1) > 0.0);
    }

    #[test]
    fn status_orders_worst_first() {
        assert!(AnalysisStatus::Unstable < AnalysisStatus::FailsSlenderness);
        assert!(AnalysisStatus::FailsLoadTest < AnalysisStatus::Passes);
    }
}
