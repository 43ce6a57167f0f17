//! Scenario description: span, supports, deck and truck for one bridge site.
//!
//! Conditions are decoded from a ten digit scenario code, for example `1060804000`:
//!
//! | digits | meaning |
//! |--------|---------|
//! | 1      | load case 1 to 4 (truck weight and deck strength) |
//! | 2-3    | number of 4 m panels |
//! | 4-5    | clearance above the deck in metres |
//! | 6-7    | clearance below the deck in metres |
//! | 8      | 0 none, 1 arch, 2 left cable anchorage, 3 both anchorages |
//! | 9      | deck joint carrying an intermediate pier, 1-based (0 = no pier) |
//! | 10     | 1 when the pier reaches the deck |

use std::fmt;
use std::str::FromStr;

use crate::errors::ConditionsError;
use crate::geometry::{point, Point};
use crate::strength::MAX_SLENDERNESS;
use crate::truss::Restraint;

/// Horizontal distance between adjacent deck joints in metres.
pub const PANEL_SIZE: f64 = 4.0;

/// Horizontal distance from an end deck joint to its cable anchorage in metres.
pub const ANCHOR_OFFSET: f64 = 8.0;

/// Depth of the river valley from grade to the lowest possible deck in metres.
pub const GAP_DEPTH: f64 = 24.0;

/// Minimum overhead room between the top of the design space and grade in metres.
pub const MIN_OVERHEAD: f64 = 8.0;

/// Height of the roadway wearing surface above the deck joints in metres.
pub const WEAR_SURFACE_HEIGHT: f64 = 0.80;

/// Height above the deck joints that the truck needs clear of structure in metres.
pub const LOAD_CLEARANCE: f64 = 2.5;

/// Weight class of the test truck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadType {
    /// 44 kN front and 181 kN rear axle.
    StandardTruck,
    /// 124 kN on each axle.
    HeavyTruck,
}

/// Concrete deck strength, which sets the deck dead load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeckType {
    /// 23 cm medium strength concrete.
    MediumStrength,
    /// 15 cm high strength concrete.
    HighStrength,
}

impl DeckType {
    /// Slab thickness in metres.
    #[must_use]
    pub const fn thickness(self) -> f64 {
        match self {
            DeckType::MediumStrength => 0.23,
            DeckType::HighStrength => 0.15,
        }
    }
}

/// Intermediate support below the deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pier {
    /// Pier top at the bottom of the design space, with its own prescribed joint.
    Low {
        /// Deck panel point above the pier, 0-based.
        panel: usize,
    },
    /// Pier reaching the deck; the deck joint itself is supported.
    High {
        /// Supported deck joint, 0-based.
        panel: usize,
    },
}

impl Pier {
    /// Deck panel point above the pier.
    #[must_use]
    pub const fn panel(self) -> usize {
        match self {
            Pier::Low { panel } | Pier::High { panel } => panel,
        }
    }
}

/// Cable anchorages beyond the abutments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Anchorages {
    /// No cable anchorages.
    None,
    /// Left anchorage only.
    Left,
    /// Both anchorages.
    Both,
}

/// Immutable description of a bridge site.
#[derive(Clone, Debug, PartialEq)]
pub struct DesignConditions {
    /// Ten-digit scenario code.
    code: u64,
    /// Test truck.
    load_type: LoadType,
    /// Deck construction.
    deck_type: DeckType,
    /// Number of deck panels.
    panel_count: usize,
    /// Headroom above the deck, metres.
    over_clearance: f64,
    /// Room below the deck, metres.
    under_clearance: f64,
    /// Deck height above the valley floor, metres.
    deck_elevation: f64,
    /// Arch abutments.
    arch: bool,
    /// Intermediate pier.
    pier: Option<Pier>,
    /// Cable anchorages.
    anchorages: Anchorages,
    /// Joints fixed by the site, with their supports.
    prescribed_joints: Vec<(Point, Restraint)>,
    /// Index of the pier joint.
    pier_joint: Option<usize>,
    /// Index of the left arch base.
    arch_joints: Option<usize>,
    /// Index of the left anchorage joint.
    left_anchorage_joint: Option<usize>,
    /// Index of the right anchorage joint.
    right_anchorage_joint: Option<usize>,
}

/// Split a code into its ten decimal digits, most significant first.
fn digits(code: u64) -> Option<[u8; 10]> {
    if code >= 10_000_000_000 {
        return None;
    }
    let mut digits = [0u8; 10];
    let mut rest = code;
    for digit in digits.iter_mut().rev() {
        // rest % 10 always fits in a u8
        *digit = (rest % 10) as u8;
        rest /= 10;
    }
    Some(digits)
}

/// Two digits starting at `at` read as one number.
fn pair(digits: &[u8; 10], at: usize) -> usize {
    10 * usize::from(digits[at]) + usize::from(digits[at + 1])
}

/// Violation of numbered validation rule `rule`.
fn rule(code: u64, rule: u8, reason: &'static str) -> ConditionsError {
    ConditionsError::RuleViolation { code, rule, reason }
}

impl DesignConditions {
    /// Decode and validate a scenario code.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionsError::Malformed`] when the number has more than ten digits and
    /// [`ConditionsError::RuleViolation`] naming the first scenario rule the code breaks.
    ///
    /// # Examples
    /// ```
    /// use trussim::DesignConditions;
    ///
    /// let conditions = DesignConditions::from_code(1_060_804_000).expect("valid scenario");
    /// assert_eq!(conditions.panel_count(), 6);
    /// assert_eq!(conditions.loaded_joint_count(), 7);
    /// ```
    pub fn from_code(code: u64) -> Result<Self, ConditionsError> {
        let d = digits(code).ok_or_else(|| ConditionsError::Malformed(code.to_string()))?;

        if !(1..=4).contains(&d[0]) {
            return Err(rule(code, 1, "load case must be 1 to 4"));
        }
        let panel_count = pair(&d, 1);
        if !(1..=20).contains(&panel_count) {
            return Err(rule(code, 2, "panel count must be 1 to 20"));
        }
        let over = pair(&d, 3);
        if over > 40 {
            return Err(rule(code, 4, "over-deck clearance must be 0 to 40 m"));
        }
        if d[9] > 1 {
            return Err(rule(code, 10, "high pier flag must be 0 or 1"));
        }
        let under = pair(&d, 5);
        if under > 32 {
            return Err(rule(code, 6, "under-deck clearance must be 0 to 32 m"));
        }
        if d[7] > 3 {
            return Err(rule(code, 8, "arch and anchorage digit must be 0 to 3"));
        }
        let arch = d[7] == 1;
        let pier_panel = usize::from(d[8]).checked_sub(1);
        let high_pier = d[9] == 1;

        if high_pier && pier_panel.is_none() {
            return Err(rule(code, 90, "a high pier needs a pier joint"));
        }
        if pier_panel.is_some_and(|p| p >= panel_count) {
            return Err(rule(code, 91, "pier joint lies beyond the span"));
        }
        if !(5..=11).contains(&panel_count) {
            return Err(rule(code, 92, "span must be 5 to 11 panels"));
        }
        let deck_elevation = if arch {
            4.0 * (panel_count as f64 - 5.0) + under as f64
        } else {
            4.0 * (panel_count as f64 - 5.0)
        };
        if !(0.0..=GAP_DEPTH).contains(&deck_elevation) {
            return Err(rule(code, 93, "deck must lie within the valley"));
        }
        if deck_elevation + over as f64 > GAP_DEPTH + MIN_OVERHEAD {
            return Err(rule(code, 94, "design space rises above the overhead limit"));
        }
        if !arch && deck_elevation - (under as f64) < 0.0 {
            return Err(rule(code, 95, "design space extends below the water"));
        }
        if pier_panel.is_some_and(|p| p == 0 || p + 1 >= panel_count) {
            return Err(rule(code, 96, "pier must be clear of both abutments"));
        }
        if arch && pier_panel.is_some() {
            return Err(rule(code, 97, "an arch cannot also have a pier"));
        }
        if let (Some(panel), false) = (pier_panel, high_pier) {
            let xp = panel as f64 * PANEL_SIZE;
            let yp = deck_elevation - under as f64;
            let rise = (deck_elevation - yp) * 0.5;
            if xp < rise {
                return Err(rule(code, 98, "low pier is buried in the left bank"));
            }
            if xp > panel_count as f64 * PANEL_SIZE - rise {
                return Err(rule(code, 99, "low pier is buried in the right bank"));
            }
        }

        let load_case = d[0] - 1;
        let load_type = if load_case & 1 == 0 {
            LoadType::StandardTruck
        } else {
            LoadType::HeavyTruck
        };
        let deck_type = if load_case & 2 == 0 {
            DeckType::MediumStrength
        } else {
            DeckType::HighStrength
        };
        let pier = pier_panel.map(|panel| {
            if high_pier {
                Pier::High { panel }
            } else {
                Pier::Low { panel }
            }
        });
        let anchorages = match d[7] {
            2 => Anchorages::Left,
            3 => Anchorages::Both,
            _ => Anchorages::None,
        };

        let mut conditions = Self {
            code,
            load_type,
            deck_type,
            panel_count,
            over_clearance: over as f64,
            under_clearance: under as f64,
            deck_elevation,
            arch,
            pier,
            anchorages,
            prescribed_joints: Vec::new(),
            pier_joint: None,
            arch_joints: None,
            left_anchorage_joint: None,
            right_anchorage_joint: None,
        };
        conditions.prescribe_joints();
        Ok(conditions)
    }

    /// Lay out the prescribed joints and their supports.
    fn prescribe_joints(&mut self) {
        let loaded = self.loaded_joint_count();
        let mut joints: Vec<(Point, Restraint)> = (0..loaded)
            .map(|i| (point(i as f64 * PANEL_SIZE, 0.0), Restraint::FREE))
            .collect();
        joints[0].1 = Restraint::PIN;
        joints[loaded - 1].1 = Restraint::ROLLER;

        match self.pier {
            Some(Pier::High { panel }) => {
                joints[panel].1 = Restraint::PIN;
                joints[0].1 = Restraint::ROLLER;
                self.pier_joint = Some(panel);
            }
            Some(Pier::Low { panel }) => {
                self.pier_joint = Some(joints.len());
                joints.push((
                    point(panel as f64 * PANEL_SIZE, -self.under_clearance),
                    Restraint::PIN,
                ));
            }
            None => {}
        }
        if self.arch {
            joints[0].1 = Restraint::FREE;
            joints[loaded - 1].1 = Restraint::FREE;
            self.arch_joints = Some(joints.len());
            joints.push((point(0.0, -self.under_clearance), Restraint::PIN));
            joints.push((point(self.span_length(), -self.under_clearance), Restraint::PIN));
        }
        if self.anchorages != Anchorages::None {
            self.left_anchorage_joint = Some(joints.len());
            joints.push((point(-ANCHOR_OFFSET, 0.0), Restraint::PIN));
        }
        if self.anchorages == Anchorages::Both {
            self.right_anchorage_joint = Some(joints.len());
            joints.push((point(self.span_length() + ANCHOR_OFFSET, 0.0), Restraint::PIN));
        }
        self.prescribed_joints = joints;
    }

    /// The scenario code these conditions were decoded from.
    #[must_use]
    pub fn code(&self) -> u64 {
        self.code
    }

    /// Truck weight class.
    #[must_use]
    pub fn load_type(&self) -> LoadType {
        self.load_type
    }

    /// Deck strength.
    #[must_use]
    pub fn deck_type(&self) -> DeckType {
        self.deck_type
    }

    /// Number of deck panels.
    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.panel_count
    }

    /// Number of deck joints carrying load, one more than the panel count.
    #[must_use]
    pub fn loaded_joint_count(&self) -> usize {
        self.panel_count + 1
    }

    /// Span between the abutment deck joints in metres.
    #[must_use]
    pub fn span_length(&self) -> f64 {
        self.panel_count as f64 * PANEL_SIZE
    }

    /// X coordinate of the left abutment deck joint.
    #[must_use]
    pub fn x_leftmost_deck_joint(&self) -> f64 {
        0.0
    }

    /// X coordinate of the right abutment deck joint.
    #[must_use]
    pub fn x_rightmost_deck_joint(&self) -> f64 {
        self.span_length()
    }

    /// Clearance above the deck available to the structure, in metres.
    #[must_use]
    pub fn over_clearance(&self) -> f64 {
        self.over_clearance
    }

    /// Clearance below the deck available to the structure, in metres.
    #[must_use]
    pub fn under_clearance(&self) -> f64 {
        self.under_clearance
    }

    /// Deck height above the valley floor in metres.
    #[must_use]
    pub fn deck_elevation(&self) -> f64 {
        self.deck_elevation
    }

    /// Whether the site has arch abutments.
    #[must_use]
    pub fn is_arch(&self) -> bool {
        self.arch
    }

    /// Intermediate pier, if any.
    #[must_use]
    pub fn pier(&self) -> Option<Pier> {
        self.pier
    }

    /// Cable anchorages.
    #[must_use]
    pub fn anchorages(&self) -> Anchorages {
        self.anchorages
    }

    /// Joints fixed by the site, deck joints first, with their supports.
    #[must_use]
    pub fn prescribed_joints(&self) -> &[(Point, Restraint)] {
        &self.prescribed_joints
    }

    /// Index of the joint on the pier.
    #[must_use]
    pub fn pier_joint(&self) -> Option<usize> {
        self.pier_joint
    }

    /// Index of the left arch base; the right base follows it.
    #[must_use]
    pub fn arch_joint(&self) -> Option<usize> {
        self.arch_joints
    }

    /// Index of the left anchorage joint.
    #[must_use]
    pub fn left_anchorage_joint(&self) -> Option<usize> {
        self.left_anchorage_joint
    }

    /// Index of the right anchorage joint.
    #[must_use]
    pub fn right_anchorage_joint(&self) -> Option<usize> {
        self.right_anchorage_joint
    }

    /// Total number of restrained degrees of freedom.
    #[must_use]
    pub fn restraint_count(&self) -> usize {
        self.prescribed_joints.iter().map(|(_, r)| r.count()).sum()
    }

    /// Largest slenderness ratio allowed; cable anchorages lift the limit.
    #[must_use]
    pub fn allowable_slenderness(&self) -> f64 {
        if self.anchorages == Anchorages::None {
            MAX_SLENDERNESS
        } else {
            f64::INFINITY
        }
    }
}

impl FromStr for DesignConditions {
    type Err = ConditionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 10 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConditionsError::Malformed(s.to_owned()));
        }
        let code = trimmed
            .parse()
            .map_err(|_| ConditionsError::Malformed(s.to_owned()))?;
        Self::from_code(code)
    }
}

impl fmt::Display for DesignConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010}", self.code)
    }
}
