//! A truss placed on a site: design conditions plus the designer's joints and members.

use crate::conditions::{DesignConditions, PANEL_SIZE};
use crate::errors::TrussEditError;
use crate::geometry::point;
use crate::inventory::{Material, Shape};
use crate::truss::Truss;

/// A bridge design ready for load testing.
///
/// The first joints of the truss are always the prescribed joints of the design
/// conditions, in the same order.
#[derive(Clone, Debug, PartialEq)]
pub struct BridgeModel {
    /// Site the bridge is designed for.
    conditions: DesignConditions,
    /// Structure, prescribed joints first.
    truss: Truss,
}

impl BridgeModel {
    /// A bridge holding only the joints prescribed by `conditions`.
    #[must_use]
    pub fn new(conditions: DesignConditions) -> Self {
        let mut truss = Truss::new();
        for &(position, restraint) in conditions.prescribed_joints() {
            truss.add_fixed_joint(position, restraint);
        }
        Self { conditions, truss }
    }

    /// A Warren deck truss of the given height over the conditions' span.
    ///
    /// Top chord joints sit midway between deck joints; chords use `chord_shape` and
    /// diagonals `web_shape`.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::InvalidMemberProperties`] when the stock has no stiffness.
    ///
    /// # Examples
    /// ```
    /// use trussim::{BridgeModel, DesignConditions, Inventory, SectionFamily};
    ///
    /// let conditions = DesignConditions::from_code(1_060_804_000).expect("valid scenario");
    /// let inventory = Inventory::standard();
    /// let steel = inventory.material(0).cloned().expect("carbon steel");
    /// let tube = inventory.shape(SectionFamily::Tube, 20).expect("180 mm tube");
    /// let bridge = BridgeModel::warren(conditions, 4.0, &steel, tube, tube).expect("valid stock");
    /// assert_eq!(bridge.truss().joint_count(), 13);
    /// assert_eq!(bridge.truss().member_count(), 23);
    /// ```
    pub fn warren(
        conditions: DesignConditions,
        height: f64,
        material: &Material,
        chord_shape: Shape,
        web_shape: Shape,
    ) -> Result<Self, TrussEditError> {
        let panels = conditions.panel_count();
        let mut bridge = Self::new(conditions);
        let truss = &mut bridge.truss;
        let top: Vec<usize> = (0..panels)
            .map(|i| truss.add_joint(point((i as f64 + 0.5) * PANEL_SIZE, height)))
            .collect();
        for i in 0..panels {
            truss.add_member(i, i + 1, material.clone(), chord_shape)?;
        }
        for pair in top.windows(2) {
            truss.add_member(pair[0], pair[1], material.clone(), chord_shape)?;
        }
        for (i, &apex) in top.iter().enumerate() {
            truss.add_member(i, apex, material.clone(), web_shape)?;
            truss.add_member(apex, i + 1, material.clone(), web_shape)?;
        }
        Ok(bridge)
    }

    /// Site description.
    #[must_use]
    pub fn conditions(&self) -> &DesignConditions {
        &self.conditions
    }

    /// Joints and members.
    #[must_use]
    pub fn truss(&self) -> &Truss {
        &self.truss
    }

    /// Mutable access for editing the design.
    pub fn truss_mut(&mut self) -> &mut Truss {
        &mut self.truss
    }

    /// True when every member is within the site's slenderness allowance.
    #[must_use]
    pub fn is_passing_slenderness_check(&self) -> bool {
        self.truss
            .is_passing_slenderness_check(self.conditions.allowable_slenderness())
    }
}
