//! Connection plate outlines at each joint.

use crate::conditions::{LOAD_CLEARANCE, WEAR_SURFACE_HEIGHT};
use crate::geometry::{segment_intersection, Displacement, Point};
use crate::hull::{convex_hull, polygon_area};
use crate::truss::Truss;

/// Margin added around each member's half width, in metres.
pub const GUSSET_MATERIAL_THICKNESS: f64 = 0.02;

/// Axis points and directions of one member seen from the gusset's joint.
///
/// With `w/2` the padded half width and `v` the vector to the far joint:
/// `p0 = -u`, `p1 = u` and `p2 = v - u`, where `u` is `v` shortened to `w/2`.
#[derive(Clone, Copy, Debug)]
struct MemberGeometry {
    /// Axis point behind the joint.
    p0: Point,
    /// Axis point ahead of the joint.
    p1: Point,
    /// Axis point short of the far joint.
    p2: Point,
    /// `u` turned a quarter turn counter-clockwise.
    perp: Displacement,
    /// Half the member width plus plate thickness.
    half_width: f64,
}

impl MemberGeometry {
    /// Geometry of a member of `width` reaching `to_other` from the joint.
    fn new(to_other: Displacement, width: f64) -> Self {
        let half_width = 0.5 * width + GUSSET_MATERIAL_THICKNESS;
        let u = to_other.with_length(half_width);
        let origin = Point::default();
        Self {
            p0: origin.offset(u * -1.0),
            p1: origin.offset(u),
            p2: origin.offset(to_other - u),
            perp: u.perp(),
            half_width,
        }
    }
}

/// Convex gusset plate around one joint.
#[derive(Clone, Debug, PartialEq)]
pub struct Gusset {
    /// Joint the plate surrounds.
    joint: usize,
    /// Hull relative to the joint, counter-clockwise.
    polygon: Vec<Point>,
    /// Widest padded member half width.
    half_depth: f64,
    /// Plate reaches into the truck's envelope.
    interfering_with_load: bool,
}

impl Gusset {
    /// Build the gusset of every joint, in joint order.
    ///
    /// # Examples
    /// ```
    /// use trussim::{point, Gusset, Inventory, Restraint, SectionFamily, Truss};
    ///
    /// let inventory = Inventory::standard();
    /// let steel = inventory.material(0).cloned().expect("carbon steel");
    /// let bar = inventory.shape(SectionFamily::Bar, 12).expect("100 mm bar");
    /// let mut truss = Truss::new();
    /// let a = truss.add_fixed_joint(point(0.0, 0.0), Restraint::PIN);
    /// let b = truss.add_joint(point(4.0, 0.0));
    /// truss.add_member(a, b, steel, bar).expect("valid member");
    ///
    /// let gussets = Gusset::build_all(&truss);
    /// assert_eq!(gussets.len(), 2);
    /// assert_eq!(gussets[0].polygon().len(), 4);
    /// ```
    #[must_use]
    pub fn build_all(truss: &Truss) -> Vec<Self> {
        (0..truss.joint_count())
            .map(|joint| Self::build(truss, joint))
            .collect()
    }

    /// Build the gusset of one joint. Joints without members get an empty outline.
    #[must_use]
    pub fn build(truss: &Truss, joint: usize) -> Self {
        let Some(centre) = truss.joint(joint).map(|j| j.position()) else {
            return Self {
                joint,
                polygon: Vec::new(),
                half_depth: 0.0,
                interfering_with_load: false,
            };
        };
        let geometry: Vec<MemberGeometry> = truss
            .incident_members(joint)
            .into_iter()
            .filter_map(|index| {
                let member = truss.member(index)?;
                let other = truss.joint(member.other_joint(joint)?)?.position();
                Some(MemberGeometry::new(other - centre, member.shape().width_in_meters()))
            })
            .collect();

        let mut points = Vec::with_capacity(4 * geometry.len() + 3 * geometry.len().pow(2));
        let mut half_depth = 0.0_f64;
        for (i, left) in geometry.iter().enumerate() {
            half_depth = half_depth.max(left.half_width);
            points.extend([
                left.p0.offset(left.perp),
                left.p0.offset(left.perp * -1.0),
                left.p1.offset(left.perp),
                left.p1.offset(left.perp * -1.0),
            ]);
            for (j, right) in geometry.iter().enumerate() {
                if i == j {
                    continue;
                }
                let hit = segment_intersection(
                    left.p0.offset(left.perp),
                    left.p2.offset(left.perp),
                    right.p0.offset(right.perp * -1.0),
                    right.p2.offset(right.perp * -1.0),
                );
                if let Some(isect) = hit {
                    points.extend([
                        isect,
                        isect.offset(left.perp * -2.0),
                        isect.offset(right.perp * 2.0),
                    ]);
                }
            }
        }

        let polygon = convex_hull(&points);
        let interfering_with_load = match (
            polygon.iter().map(|p| p.y).reduce(f64::max),
            polygon.iter().map(|p| p.y).reduce(f64::min),
        ) {
            (Some(top), Some(bottom)) => {
                centre.y + top > WEAR_SURFACE_HEIGHT && centre.y + bottom < LOAD_CLEARANCE
            }
            _ => false,
        };
        Self {
            joint,
            polygon,
            half_depth,
            interfering_with_load,
        }
    }

    /// Joint this gusset belongs to.
    #[must_use]
    pub fn joint(&self) -> usize {
        self.joint
    }

    /// Outline relative to the joint, counter-clockwise.
    #[must_use]
    pub fn polygon(&self) -> &[Point] {
        &self.polygon
    }

    /// Outline in world coordinates for a joint at `position`.
    #[must_use]
    pub fn world_polygon(&self, position: Point) -> Vec<Point> {
        self.polygon
            .iter()
            .map(|p| position.offset(Displacement::new(p.x, p.y)))
            .collect()
    }

    /// Plate area in square metres.
    #[must_use]
    pub fn area(&self) -> f64 {
        polygon_area(&self.polygon)
    }

    /// Half the plate depth across the truss plane, the widest padded half width.
    #[must_use]
    pub fn half_depth(&self) -> f64 {
        self.half_depth
    }

    /// True when the plate reaches into the space the truck drives through.
    #[must_use]
    pub fn is_interfering_with_load(&self) -> bool {
        self.interfering_with_load
    }
}
