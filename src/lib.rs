#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

pub mod analysis;
pub mod animation;
pub mod bridge;
pub mod conditions;
pub mod config;
pub mod errors;
pub mod failure;
pub mod geometry;
pub mod gusset;
pub mod hull;
pub mod interpolation;
pub mod inventory;
pub mod loads;
pub mod report;
pub mod stiffness;
pub mod strength;
pub mod truss;

pub use analysis::{Analysis, AnalysisStatus};
pub use animation::{AnimationController, AnimationState};
pub use bridge::BridgeModel;
pub use conditions::DesignConditions;
pub use config::SimulationConfig;
pub use errors::{AnalysisError, ConditionsError, ConfigError, MemberPropertyError, TopologyError, TrussEditError};
pub use failure::{FailureDetector, FailureKind, FailureStatus};
pub use geometry::{displacement, point, Displacement, Point};
pub use gusset::Gusset;
pub use interpolation::{FlatRoadway, InterpolationSnapshot, Roadway};
pub use inventory::{Inventory, Material, SectionFamily, Shape};
pub use stiffness::{AnalysisResult, StiffnessAnalyzer};
pub use truss::{Restraint, Truss};
