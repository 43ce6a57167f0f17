//! Stock catalog: materials and cross-section shapes that can be assigned to members.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::strength::MAX_SLENDERNESS;

/// Nominal section widths in millimetres, shared by every section family.
pub const SECTION_WIDTHS_MM: [u32; 33] = [
    30, 35, 40, 45, 50, 55, 60, 65, 70, 75, 80, // 0 to 10
    90, 100, 110, 120, 130, 140, 150, 160, 170, 180, 190, 200, // 11 to 22
    220, 240, 260, 280, 300, // 23 to 27
    320, 340, 360, 400, 500, // 28 to 32
];

/// Cross-section family of a shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionFamily {
    /// Solid square bar.
    Bar,
    /// Hollow square tube.
    Tube,
}

impl SectionFamily {
    /// Every family, in catalog order.
    pub const ALL: [SectionFamily; 2] = [SectionFamily::Bar, SectionFamily::Tube];

    /// Position of the family in catalog tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            SectionFamily::Bar => 0,
            SectionFamily::Tube => 1,
        }
    }

    /// Long display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SectionFamily::Bar => "Solid Bar",
            SectionFamily::Tube => "Hollow Tube",
        }
    }

    /// Short display name.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            SectionFamily::Bar => "Bar",
            SectionFamily::Tube => "Tube",
        }
    }
}

/// Physical properties of a member material.
///
/// Moduli and stresses are in kilopascals so that forces come out in kilonewtons.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Position in the catalog.
    index: usize,
    /// Long display name.
    name: String,
    /// Short display name.
    short_name: String,
    /// Elastic modulus E in kilopascals.
    elastic_modulus: f64,
    /// Yield stress Fy in kilopascals.
    yield_stress: f64,
    /// Density in kilograms per cubic metre.
    density: f64,
    /// Unit cost in dollars per kilogram, indexed by [`SectionFamily::index`].
    unit_cost: [f64; 2],
}

impl Material {
    /// Create a material record.
    #[must_use]
    pub fn new(
        index: usize,
        name: impl Into<String>,
        short_name: impl Into<String>,
        elastic_modulus: f64,
        yield_stress: f64,
        density: f64,
        unit_cost: [f64; 2],
    ) -> Self {
        Self {
            index,
            name: name.into(),
            short_name: short_name.into(),
            elastic_modulus,
            yield_stress,
            density,
            unit_cost,
        }
    }

    /// Position in the catalog.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Long display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short display name.
    #[must_use]
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Elastic modulus in kilopascals.
    #[must_use]
    pub fn elastic_modulus(&self) -> f64 {
        self.elastic_modulus
    }

    /// Yield stress in kilopascals.
    #[must_use]
    pub fn yield_stress(&self) -> f64 {
        self.yield_stress
    }

    /// Density in kilograms per cubic metre.
    #[must_use]
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Cost in dollars per kilogram of this material rolled into `family` sections.
    #[must_use]
    pub fn unit_cost(&self, family: SectionFamily) -> f64 {
        self.unit_cost[family.index()]
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Cross-section geometry of a member.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Section family.
    family: SectionFamily,
    /// Position within the family's size table.
    size_index: usize,
    /// Outside width in millimetres.
    width: f64,
    /// Wall thickness in millimetres; equal to the width for solid bars.
    thickness: f64,
    /// Cross-sectional area in square metres.
    area: f64,
    /// Second moment of area in metres to the fourth.
    moment: f64,
    /// `sqrt(A / I)`, the reciprocal of the radius of gyration.
    inverse_radius_of_gyration: f64,
    /// Length at which the code slenderness limit is reached.
    max_slenderness_length: f64,
}

impl Shape {
    /// Create a shape from explicit section properties.
    #[must_use]
    pub fn new(
        family: SectionFamily,
        size_index: usize,
        width: f64,
        thickness: f64,
        area: f64,
        moment: f64,
    ) -> Self {
        let inverse_radius_of_gyration = (area / moment).sqrt();
        Self {
            family,
            size_index,
            width,
            thickness,
            area,
            moment,
            inverse_radius_of_gyration,
            max_slenderness_length: MAX_SLENDERNESS / inverse_radius_of_gyration,
        }
    }

    /// Solid square bar of the given width in millimetres.
    #[must_use]
    pub fn bar(size_index: usize, width_mm: u32) -> Self {
        let w = f64::from(width_mm);
        Self::new(
            SectionFamily::Bar,
            size_index,
            w,
            w,
            w.powi(2) * 1.0e-6,
            w.powi(4) / 12.0 * 1.0e-12,
        )
    }

    /// Hollow square tube of the given width in millimetres.
    ///
    /// Wall thickness is a twentieth of the width, but never less than 2 mm.
    #[must_use]
    pub fn tube(size_index: usize, width_mm: u32) -> Self {
        let thickness_mm = (width_mm / 20).max(2);
        let w = f64::from(width_mm);
        let inner = f64::from(width_mm - 2 * thickness_mm);
        Self::new(
            SectionFamily::Tube,
            size_index,
            w,
            f64::from(thickness_mm),
            (w.powi(2) - inner.powi(2)) * 1.0e-6,
            (w.powi(4) - inner.powi(4)) / 12.0 * 1.0e-12,
        )
    }

    /// Section family.
    #[must_use]
    pub fn family(&self) -> SectionFamily {
        self.family
    }

    /// Position within the family's size table.
    #[must_use]
    pub fn size_index(&self) -> usize {
        self.size_index
    }

    /// Outside width in millimetres.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Outside width in metres.
    #[must_use]
    pub fn width_in_meters(&self) -> f64 {
        self.width * 1.0e-3
    }

    /// Wall thickness in millimetres.
    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Cross-sectional area in square metres.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Second moment of area in metres to the fourth.
    #[must_use]
    pub fn moment(&self) -> f64 {
        self.moment
    }

    /// Reciprocal of the radius of gyration, per metre.
    #[must_use]
    pub fn inverse_radius_of_gyration(&self) -> f64 {
        self.inverse_radius_of_gyration
    }

    /// Slenderness ratio of a member of this shape with the given length.
    #[must_use]
    pub fn slenderness(&self, length: f64) -> f64 {
        length * self.inverse_radius_of_gyration
    }

    /// Longest member allowed by the code slenderness limit.
    #[must_use]
    pub fn max_slenderness_length(&self) -> f64 {
        self.max_slenderness_length
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.width.round();
        match self.family {
            SectionFamily::Bar => write!(f, "{w}x{w} mm {}", self.family.short_name()),
            SectionFamily::Tube => write!(
                f,
                "{w}x{w}x{} mm {}",
                self.thickness.round(),
                self.family.short_name()
            ),
        }
    }
}

/// The catalog of stock available to a bridge design.
#[derive(Clone, Debug, PartialEq)]
pub struct Inventory {
    /// Available materials.
    materials: Vec<Material>,
    /// Available shapes, indexed by [`SectionFamily::index`] then size.
    shapes: [Vec<Shape>; 2],
}

impl Default for Inventory {
    fn default() -> Self {
        Self::standard()
    }
}

impl Inventory {
    /// The standard catalog: three structural steels in bars and tubes of every
    /// width in [`SECTION_WIDTHS_MM`].
    ///
    /// # Examples
    /// ```
    /// use trussim::{Inventory, SectionFamily};
    ///
    /// let inventory = Inventory::standard();
    /// assert_eq!(inventory.materials().len(), 3);
    /// assert_eq!(inventory.shapes(SectionFamily::Tube).len(), 33);
    /// ```
    #[must_use]
    pub fn standard() -> Self {
        let materials = vec![
            Material::new(0, "Carbon Steel", "CS", 200_000_000.0, 250_000.0, 7850.0, [4.30, 6.30]),
            Material::new(
                1,
                "High-Strength Low-Alloy Steel",
                "HSS",
                200_000_000.0,
                345_000.0,
                7850.0,
                [5.60, 7.00],
            ),
            Material::new(
                2,
                "Quenched & Tempered Steel",
                "QTS",
                200_000_000.0,
                485_000.0,
                7850.0,
                [6.00, 7.70],
            ),
        ];
        let bars = SECTION_WIDTHS_MM
            .iter()
            .enumerate()
            .map(|(size, &width)| Shape::bar(size, width))
            .collect();
        let tubes = SECTION_WIDTHS_MM
            .iter()
            .enumerate()
            .map(|(size, &width)| Shape::tube(size, width))
            .collect();
        Self {
            materials,
            shapes: [bars, tubes],
        }
    }

    /// All materials in catalog order.
    #[must_use]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Material at catalog position `index`.
    #[must_use]
    pub fn material(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    /// Material with the given short name, e.g. `"HSS"`.
    #[must_use]
    pub fn material_by_short_name(&self, short_name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.short_name == short_name)
    }

    /// Every size of a section family, smallest first.
    #[must_use]
    pub fn shapes(&self, family: SectionFamily) -> &[Shape] {
        &self.shapes[family.index()]
    }

    /// Shape of a family at the given size index.
    #[must_use]
    pub fn shape(&self, family: SectionFamily, size_index: usize) -> Option<Shape> {
        self.shapes[family.index()].get(size_index).copied()
    }

    /// The shape `increment` sizes away from `reference` within its family, clamped to
    /// the ends of the size table.
    #[must_use]
    pub fn resized(&self, reference: &Shape, increment: isize) -> Shape {
        let sizes = self.shapes(reference.family());
        let last = sizes.len().saturating_sub(1);
        let target = reference
            .size_index()
            .saturating_add_signed(increment)
            .min(last);
        sizes.get(target).copied().unwrap_or(*reference)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn bar_properties_follow_square_section_formulas() {
        let bar = Shape::bar(12, 100);
        assert_relative_eq!(bar.area(), 0.01, max_relative = 1.0e-12);
        assert_relative_eq!(bar.moment(), 1.0e8 / 12.0 * 1.0e-12, max_relative = 1.0e-12);
        assert_relative_eq!(bar.thickness(), 100.0);
        assert_relative_eq!(bar.width_in_meters(), 0.1);
    }

    #[test]
    fn tube_wall_is_a_twentieth_of_the_width_with_a_minimum() {
        assert_relative_eq!(Shape::tube(0, 30).thickness(), 2.0);
        assert_relative_eq!(Shape::tube(14, 120).thickness(), 6.0);
        let tube = Shape::tube(14, 120);
        assert_relative_eq!(tube.area(), (14_400.0 - 11_664.0) * 1.0e-6, max_relative = 1.0e-12);
    }

    #[test]
    fn max_slenderness_length_uses_code_limit() {
        let bar = Shape::bar(12, 100);
        // r = w / sqrt(12) for a solid square.
        let radius = 0.1 / 12.0_f64.sqrt();
        assert_relative_eq!(bar.max_slenderness_length(), 300.0 * radius, max_relative = 1.0e-12);
        assert_relative_eq!(bar.slenderness(bar.max_slenderness_length()), 300.0, max_relative = 1.0e-12);
    }

    #[test]
    fn resizing_clamps_to_the_table() {
        let inventory = Inventory::standard();
        let smallest = inventory.shape(SectionFamily::Bar, 0).expect("smallest bar");
        assert_eq!(inventory.resized(&smallest, -1), smallest);
        assert_eq!(inventory.resized(&smallest, 2).size_index(), 2);
        let largest = inventory.shape(SectionFamily::Tube, 32).expect("largest tube");
        assert_eq!(inventory.resized(&largest, 5), largest);
    }

    #[test]
    fn materials_are_found_by_short_name() {
        let inventory = Inventory::standard();
        let qts = inventory.material_by_short_name("QTS").expect("quenched steel");
        assert_relative_eq!(qts.yield_stress(), 485_000.0);
        assert_relative_eq!(qts.unit_cost(SectionFamily::Tube), 7.70);
        assert!(inventory.material_by_short_name("XYZ").is_none());
    }

    #[test]
    fn shapes_display_with_dimensions() {
        assert_eq!(Shape::bar(12, 100).to_string(), "100x100 mm Bar");
        assert_eq!(Shape::tube(14, 120).to_string(), "120x120x6 mm Tube");
    }
}
