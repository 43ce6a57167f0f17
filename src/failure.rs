//! Member capacity checks against solved forces.

use serde::{Deserialize, Serialize};

use crate::stiffness::AnalysisResult;
use crate::strength;
use crate::truss::Truss;

/// Why a member or structure failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FailureKind {
    /// Tension exceeded the tensile strength.
    Tension,
    /// Compression exceeded the buckling strength.
    Compression,
    /// Member is longer than the slenderness limit allows.
    Slenderness,
    /// The structure is a mechanism.
    Instability,
}

impl FailureKind {
    /// True for failures caused by load rather than geometry alone.
    #[must_use]
    pub const fn is_force_failure(self) -> bool {
        matches!(self, FailureKind::Tension | FailureKind::Compression)
    }
}

/// A failure of one member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberFailure {
    /// Index of the failed member.
    pub member: usize,
    /// Failure mode.
    pub kind: FailureKind,
}

/// Every failure found for one loading, plus whether the structure is unstable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureStatus {
    /// Failed members in member order.
    members: Vec<MemberFailure>,
    /// The structure is a mechanism.
    unstable: bool,
    /// Load case the failures were found in, when known.
    load_case: Option<usize>,
}

impl FailureStatus {
    /// Status of an unstable structure.
    #[must_use]
    pub fn unstable(load_case: Option<usize>) -> Self {
        Self {
            members: Vec::new(),
            unstable: true,
            load_case,
        }
    }

    /// Record the load case index at which these failures were found.
    #[must_use]
    pub fn at_load_case(mut self, load_case: usize) -> Self {
        self.load_case = Some(load_case);
        self
    }

    /// Member failures in member order.
    #[must_use]
    pub fn member_failures(&self) -> &[MemberFailure] {
        &self.members
    }

    /// True when the structure is a mechanism.
    #[must_use]
    pub fn is_unstable(&self) -> bool {
        self.unstable
    }

    /// Load case at which failure was first observed.
    #[must_use]
    pub fn load_case(&self) -> Option<usize> {
        self.load_case
    }

    /// True when anything failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.unstable || !self.members.is_empty()
    }

    /// True when the structure is unstable or some member is overloaded.
    #[must_use]
    pub fn is_load_failure(&self) -> bool {
        self.unstable || self.members.iter().any(|f| f.kind.is_force_failure())
    }

    /// True when `member` failed in the given way.
    #[must_use]
    pub fn contains(&self, member: usize, kind: FailureKind) -> bool {
        self.members
            .iter()
            .any(|f| f.member == member && f.kind == kind)
    }

    /// Every distinct failure kind present, instability included.
    #[must_use]
    pub fn kinds(&self) -> Vec<FailureKind> {
        let mut kinds: Vec<FailureKind> = self.members.iter().map(|f| f.kind).collect();
        if self.unstable {
            kinds.push(FailureKind::Instability);
        }
        kinds.sort_unstable();
        kinds.dedup();
        kinds
    }

    /// Per-member flag for members overloaded in tension or compression.
    #[must_use]
    pub fn overloaded_mask(&self, member_count: usize) -> Vec<bool> {
        let mut mask = vec![false; member_count];
        for failure in self.members.iter().filter(|f| f.kind.is_force_failure()) {
            if let Some(flag) = mask.get_mut(failure.member) {
                *flag = true;
            }
        }
        mask
    }
}

/// Strength limits of one member.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberCapacity {
    /// Factored compressive strength in kilonewtons.
    pub compressive: f64,
    /// Factored tensile strength in kilonewtons.
    pub tensile: f64,
    /// Member length in metres.
    pub length: f64,
    /// Longest length allowed by the site's slenderness limit.
    pub max_slenderness_length: f64,
}

/// Compares member forces with the strength of each member of one truss.
#[derive(Clone, Debug, PartialEq)]
pub struct FailureDetector {
    /// Capacity of each member, in member order.
    capacities: Vec<MemberCapacity>,
}

impl FailureDetector {
    /// Compute capacities for every member of `truss`.
    #[must_use]
    pub fn new(truss: &Truss, allowable_slenderness: f64) -> Self {
        let capacities = truss
            .members()
            .iter()
            .enumerate()
            .map(|(index, member)| {
                let length = truss.member_length(index).unwrap_or(0.0);
                MemberCapacity {
                    compressive: strength::compressive_strength(
                        member.material(),
                        member.shape(),
                        length,
                    ),
                    tensile: strength::tensile_strength(member.material(), member.shape()),
                    length,
                    max_slenderness_length: strength::max_slenderness_length(
                        member.shape(),
                        allowable_slenderness,
                    ),
                }
            })
            .collect();
        Self { capacities }
    }

    /// Capacities in member order.
    #[must_use]
    pub fn capacities(&self) -> &[MemberCapacity] {
        &self.capacities
    }

    /// Signed force to strength ratio of a member.
    #[must_use]
    pub fn force_ratio(&self, member: usize, force: f64) -> f64 {
        self.capacities.get(member).map_or(0.0, |c| {
            strength::force_strength_ratio(force, c.compressive, c.tensile)
        })
    }

    /// Force failure of one member, if any.
    #[must_use]
    pub fn member_failure(&self, member: usize, force: f64) -> Option<FailureKind> {
        let capacity = self.capacities.get(member)?;
        if force > capacity.tensile {
            Some(FailureKind::Tension)
        } else if -force > capacity.compressive {
            Some(FailureKind::Compression)
        } else {
            None
        }
    }

    /// True when the member is too slender for its length.
    #[must_use]
    pub fn is_too_slender(&self, member: usize) -> bool {
        self.capacities
            .get(member)
            .is_some_and(|c| c.length > c.max_slenderness_length)
    }

    /// Every force and slenderness failure for one solved load.
    ///
    /// # Examples
    /// ```
    /// use trussim::{FailureDetector, Truss};
    ///
    /// let detector = FailureDetector::new(&Truss::new(), 300.0);
    /// let status = detector.detect(&Default::default());
    /// assert!(!status.is_failure());
    /// ```
    #[must_use]
    pub fn detect(&self, result: &AnalysisResult) -> FailureStatus {
        let mut members = Vec::new();
        for member in 0..self.capacities.len() {
            let force = result.member_force(member).unwrap_or(0.0);
            if let Some(kind) = self.member_failure(member, force) {
                members.push(MemberFailure { member, kind });
            }
            if self.is_too_slender(member) {
                members.push(MemberFailure {
                    member,
                    kind: FailureKind::Slenderness,
                });
            }
        }
        FailureStatus {
            members,
            unstable: false,
            load_case: None,
        }
    }
}
