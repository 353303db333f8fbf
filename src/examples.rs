//! Built-in example lattices that can be quickly loaded from the UI.
//!
//! Each example is a complete [`LatticeSettings`]: basis, unit cell, a window
//! and a small Fortran mask cutting out a disc or a rectangle.

use crate::types::*;

/// Kinds of built-in examples available from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExampleKind {
    /// One site on a square grid, disc mask
    Square,
    /// One site on a triangular grid, disc mask
    Triangular,
    /// Two sites (graphene-like), rectangular mask
    Honeycomb,
    /// Three sites on a square grid, rectangular mask
    Lieb,
}

/// Metadata for a single example.
pub struct ExampleInfo {
    /// Stable identifier for the example
    pub kind: ExampleKind,
    /// Human-friendly display name
    pub name: &'static str,
}

/// Returns all examples with their display names.
pub const fn all_examples() -> &'static [ExampleInfo] {
    const EXAMPLES: &[ExampleInfo] = &[
        ExampleInfo {
            kind: ExampleKind::Square,
            name: "Square (disc)",
        },
        ExampleInfo {
            kind: ExampleKind::Triangular,
            name: "Triangular (disc)",
        },
        ExampleInfo {
            kind: ExampleKind::Honeycomb,
            name: "Honeycomb (ribbon)",
        },
        ExampleInfo {
            kind: ExampleKind::Lieb,
            name: "Lieb (rectangle)",
        },
    ];
    EXAMPLES
}

/// Builds the settings for the given example kind.
pub fn build_example(kind: ExampleKind) -> LatticeSettings {
    match kind {
        ExampleKind::Square => build_square(),
        ExampleKind::Triangular => build_triangular(),
        ExampleKind::Honeycomb => build_honeycomb(),
        ExampleKind::Lieb => build_lieb(),
    }
}

const SQRT_3: f64 = 1.732_050_807_568_877_2;

const DISC_MASK: &str = "
subroutine mask(is_in_lattice, x, y, z)
real*8, intent(in)   :: x, y, z
integer, intent(out)  :: is_in_lattice

if (x**2 + y**2 <= RADIUS**2) then
    is_in_lattice = 1
else
    is_in_lattice = 0
end if

end subroutine
";

const RECTANGLE_MASK: &str = "
subroutine mask(is_in_lattice, x, y, z)
real*8, intent(in)   :: x, y, z
integer, intent(out)  :: is_in_lattice

if (abs(x) <= HALF_WIDTH .and. abs(y) <= HALF_HEIGHT) then
    is_in_lattice = 1
else
    is_in_lattice = 0
end if

end subroutine
";

fn build_square() -> LatticeSettings {
    LatticeSettings {
        parameters: vec![ScalarParameter::new("RADIUS", "4.0")],
        lattice: LatticeDefinition {
            v1: (1.0, 0.0),
            v2: (0.0, 1.0),
            sites: vec![UnitCellSite::new("A", (0.0, 0.0))
                .with_size(0.3)
                .with_color((66, 135, 245))],
        },
        code: DISC_MASK.to_string(),
        dimensions: WindowBounds::new((-5.0, -5.0), (5.0, 5.0)),
    }
}

fn build_triangular() -> LatticeSettings {
    LatticeSettings {
        parameters: vec![ScalarParameter::new("RADIUS", "5.0")],
        lattice: LatticeDefinition {
            v1: (1.0, 0.0),
            v2: (0.5, SQRT_3 / 2.0),
            sites: vec![UnitCellSite::new("A", (0.0, 0.0))
                .with_size(0.3)
                .with_color((245, 166, 35))],
        },
        code: DISC_MASK.to_string(),
        dimensions: WindowBounds::new((-6.0, -6.0), (6.0, 6.0)),
    }
}

fn build_honeycomb() -> LatticeSettings {
    // Bond length 1: A and B sit one unit apart along x.
    LatticeSettings {
        parameters: vec![
            ScalarParameter::new("HALF_WIDTH", "8.0"),
            ScalarParameter::new("HALF_HEIGHT", "3.0"),
        ],
        lattice: LatticeDefinition {
            v1: (1.5, SQRT_3 / 2.0),
            v2: (0.0, SQRT_3),
            sites: vec![
                UnitCellSite::new("A", (0.0, 0.0))
                    .with_size(0.25)
                    .with_color((220, 50, 47)),
                UnitCellSite::new("B", (1.0, 0.0))
                    .with_size(0.25)
                    .with_color((38, 139, 210)),
            ],
        },
        code: RECTANGLE_MASK.to_string(),
        dimensions: WindowBounds::new((-9.0, -4.0), (9.0, 4.0)),
    }
}

fn build_lieb() -> LatticeSettings {
    LatticeSettings {
        parameters: vec![
            ScalarParameter::new("HALF_WIDTH", "5.0"),
            ScalarParameter::new("HALF_HEIGHT", "5.0"),
        ],
        lattice: LatticeDefinition {
            v1: (2.0, 0.0),
            v2: (0.0, 2.0),
            sites: vec![
                UnitCellSite::new("corner", (0.0, 0.0))
                    .with_size(0.3)
                    .with_color((133, 153, 0)),
                UnitCellSite::new("edge x", (1.0, 0.0))
                    .with_size(0.2)
                    .with_color((211, 54, 130)),
                UnitCellSite::new("edge y", (0.0, 1.0))
                    .with_size(0.2)
                    .with_color((108, 113, 196)),
            ],
        },
        code: RECTANGLE_MASK.to_string(),
        dimensions: WindowBounds::new((-5.0, -5.0), (5.0, 5.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::generate_source;
    use crate::lattice::enumerate_lattice;

    #[test]
    fn test_every_example_generates_source() {
        for info in all_examples() {
            let settings = build_example(info.kind);
            let source = generate_source("module_example", &settings)
                .unwrap_or_else(|e| panic!("{}: {e}", info.name));
            assert!(source.contains("subroutine mask"), "{}", info.name);
            for parameter in &settings.parameters {
                assert!(source.contains(&parameter.name), "{}", info.name);
            }
        }
    }

    #[test]
    fn test_square_disc_point_count() {
        let settings = build_example(ExampleKind::Square);
        let disc = |x: f64, y: f64, _z: f64| i32::from(x * x + y * y <= 16.0);
        let points = enumerate_lattice(&settings.lattice, &settings.dimensions, &disc);
        // Integer points with i^2 + j^2 <= 16.
        assert_eq!(points.len(), 49);
    }

    #[test]
    fn test_lieb_sites_repeat_in_order() {
        let settings = build_example(ExampleKind::Lieb);
        let all = |_x: f64, _y: f64, _z: f64| 1;
        let points = enumerate_lattice(&settings.lattice, &settings.dimensions, &all);
        // Lattice points at even coordinates in [-5, 5]: 5 x 5.
        assert_eq!(points.len(), 75);
        for (n, point) in points.iter().enumerate() {
            assert_eq!(point.site, n % 3);
        }
    }

    #[test]
    fn test_honeycomb_has_two_sites() {
        let settings = build_example(ExampleKind::Honeycomb);
        assert_eq!(settings.lattice.sites.len(), 2);
        let all = |_x: f64, _y: f64, _z: f64| 1;
        let points = enumerate_lattice(&settings.lattice, &settings.dimensions, &all);
        assert!(!points.is_empty());
        assert_eq!(points.len() % 2, 0);
    }
}
