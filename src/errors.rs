//! Error types produced while building, configuring or analysing bridges.

use thiserror::Error;

/// Error describing a truss whose topology cannot be analysed at all.
///
/// These are reported before any stiffness matrix is assembled.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum TopologyError {
    /// Returned when a member refers to a joint index outside the joint arena.
    #[error("member {member} refers to missing joint {joint}")]
    UnknownJoint {
        /// Index of the offending member.
        member: usize,
        /// Joint index that does not exist.
        joint: usize,
    },
    /// Returned when both ends of a member are the same joint.
    #[error("member {0} connects a joint to itself")]
    SelfConnectedMember(usize),
    /// Returned when a member spans zero distance.
    #[error("member {0} has zero length")]
    ZeroLengthMember(usize),
    /// Returned when a joint has no load path to any support.
    #[error("joint {0} is not connected to any support")]
    DisconnectedJoint(usize),
}

/// Error returned by the stiffness analyzer.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// The truss topology is invalid.
    #[error(transparent)]
    Topology(#[from] TopologyError),
    /// The reduced stiffness matrix is singular or nearly so; the truss is a mechanism.
    #[error("stiffness matrix is singular (pivot {pivot:e} below tolerance {tolerance:e}); check supports and connectivity")]
    Unstable {
        /// Smallest pivot magnitude encountered during factorization.
        pivot: f64,
        /// Absolute tolerance the pivot was compared with.
        tolerance: f64,
    },
}

/// Error returned when stock assigned to a member is not physically meaningful.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum MemberPropertyError {
    /// Returned when the cross-sectional area is zero or negative.
    #[error("area must be positive (received {area})")]
    NonPositiveArea {
        /// Rejected cross-sectional area in square metres.
        area: f64,
    },
    /// Returned when the moment of inertia is zero or negative.
    #[error("moment of inertia must be positive (received {moment})")]
    NonPositiveMoment {
        /// Rejected moment of inertia in metres to the fourth.
        moment: f64,
    },
    /// Returned when the elastic modulus is zero or negative.
    #[error("elastic modulus must be positive (received {elastic_modulus})")]
    NonPositiveElasticModulus {
        /// Rejected elastic modulus in kilopascals.
        elastic_modulus: f64,
    },
}

/// Error returned when editing a [`Truss`](crate::Truss) with invalid indices or stock.
///
/// # Examples
///
/// ```
/// use trussim::{Truss, TrussEditError, point};
///
/// let mut truss = Truss::new();
/// let error = truss
///     .move_joint(42, point(1.0, 0.0))
///     .expect_err("unknown joint is rejected");
/// assert_eq!(error, TrussEditError::UnknownJoint(42));
/// ```
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum TrussEditError {
    /// Returned when a joint cannot be found in the truss.
    #[error("joint {0} does not exist in this truss")]
    UnknownJoint(usize),
    /// Returned when a member cannot be found in the truss.
    #[error("member {0} does not exist in this truss")]
    UnknownMember(usize),
    /// Returned when an edit would move or delete a joint prescribed by the design conditions.
    #[error("joint {0} is fixed by the design conditions")]
    FixedJoint(usize),
    /// Returned when a member would connect a joint to itself.
    #[error("a member cannot connect joint {0} to itself")]
    SelfConnectedMember(usize),
    /// Returned when the supplied member stock is invalid.
    #[error("member {member} has invalid properties: {source}")]
    InvalidMemberProperties {
        /// Index the member has or would have had.
        member: usize,
        /// Description of the invalid property.
        #[source]
        source: MemberPropertyError,
    },
}

/// Error returned when a design condition code is malformed or violates a scenario rule.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConditionsError {
    /// The code is not a string of exactly ten decimal digits.
    #[error("design condition code {0:?} must be exactly ten decimal digits")]
    Malformed(String),
    /// The code decodes, but breaks one of the scenario rules.
    #[error("design condition code {code:010} breaks rule {rule}: {reason}")]
    RuleViolation {
        /// The rejected code.
        code: u64,
        /// Number of the violated rule; digit positions for range checks, 90+ for consistency rules.
        rule: u8,
        /// Human readable description of the rule.
        reason: &'static str,
    },
}

/// Error returned when loading or validating a simulation configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid JSON for the expected schema.
    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A configuration value is outside its allowed range.
    #[error("invalid configuration value for `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}
