//! Normalized sphere scene built from enumerated lattice points.

use crate::types::{LatticePoint, Rgb, UnitCellSite};

/// One rendered lattice point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSphere {
    /// Centre in normalized scene coordinates
    pub center: [f32; 3],
    /// Radius in normalized scene units
    pub radius: f32,
    /// Fill colour
    pub color: Rgb,
}

/// Spheres ready for the viewport, scaled so the bounding-box diagonal is at most one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    /// Spheres in enumeration order
    pub spheres: Vec<SceneSphere>,
}

impl Scene {
    /// Number of spheres.
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    /// True when nothing survived the mask.
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// Axis-aligned bounds of the sphere centres as `(min, max)`.
    ///
    /// # Returns
    ///
    /// `None` for an empty scene.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.spheres.first()?.center;
        let (mut min, mut max) = (first, first);
        for sphere in &self.spheres[1..] {
            for axis in 0..3 {
                min[axis] = min[axis].min(sphere.center[axis]);
                max[axis] = max[axis].max(sphere.center[axis]);
            }
        }
        Some((min, max))
    }

    /// Midpoint of [`Scene::bounds`], the orbit target of the camera.
    pub fn center(&self) -> [f32; 3] {
        match self.bounds() {
            Some((min, max)) => [
                (min[0] + max[0]) * 0.5,
                (min[1] + max[1]) * 0.5,
                (min[2] + max[2]) * 0.5,
            ],
            None => [0.0; 3],
        }
    }
}

/// Converts lattice points into spheres.
///
/// Positions are shifted so the bounding box starts at the origin and scaled by
/// `1 / max(|diagonal|, 1)`, so lattices smaller than one unit keep their size.
/// Radii are scaled by the same factor.
///
/// # Arguments
///
/// * `points` - Enumerated points, each referring to a site by index
/// * `sites` - Unit-cell sites supplying size and colour
pub fn build_scene(points: &[LatticePoint], sites: &[UnitCellSite]) -> Scene {
    let Some(first) = points.first() else {
        return Scene::default();
    };

    let first = [first.position.0, first.position.1, first.position.2];
    let (mut min, mut max) = (first, first);
    for point in points {
        let p = [point.position.0, point.position.1, point.position.2];
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    let diagonal = [0, 1, 2].map(|axis| max[axis] - min[axis]);
    let length = diagonal.iter().map(|d| d * d).sum::<f64>().sqrt();
    let norm = 1.0 / length.max(1.0);

    let spheres = points
        .iter()
        .filter_map(|point| {
            let site = sites.get(point.site)?;
            let p = [point.position.0, point.position.1, point.position.2];
            Some(SceneSphere {
                center: [0, 1, 2].map(|axis| ((p[axis] - min[axis]) * norm) as f32),
                radius: (site.size * norm) as f32,
                color: site.color,
            })
        })
        .collect();

    Scene { spheres }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64, site: usize) -> LatticePoint {
        LatticePoint {
            position: (x, y, 0.0),
            site,
        }
    }

    #[test]
    fn test_empty_input_gives_empty_scene() {
        let scene = build_scene(&[], &[UnitCellSite::default()]);
        assert!(scene.is_empty());
        assert_eq!(scene.bounds(), None);
        assert_eq!(scene.center(), [0.0; 3]);
    }

    #[test]
    fn test_large_extent_is_normalized() {
        let sites = vec![UnitCellSite::default().with_size(0.5)];
        // Diagonal of length 10.
        let points = vec![point(-2.0, 1.0, 0), point(4.0, 9.0, 0), point(1.0, 5.0, 0)];
        let scene = build_scene(&points, &sites);

        assert_eq!(scene.len(), 3);
        assert_eq!(scene.spheres[0].center, [0.0, 0.0, 0.0]);
        assert_eq!(scene.spheres[1].center, [0.6, 0.8, 0.0]);
        assert_eq!(scene.spheres[2].center, [0.3, 0.4, 0.0]);
        assert_eq!(scene.spheres[0].radius, 0.05);
        assert_eq!(scene.bounds(), Some(([0.0; 3], [0.6, 0.8, 0.0])));
    }

    #[test]
    fn test_small_extent_is_not_magnified() {
        let sites = vec![UnitCellSite::default().with_size(0.1)];
        let points = vec![point(1.0, 1.0, 0), point(1.5, 1.25, 0)];
        let scene = build_scene(&points, &sites);
        assert_eq!(scene.spheres[1].center, [0.5, 0.25, 0.0]);
        assert_eq!(scene.spheres[1].radius, 0.1);
    }

    #[test]
    fn test_site_appearance_is_carried() {
        let sites = vec![
            UnitCellSite::new("A", (0.0, 0.0)).with_color((255, 0, 0)),
            UnitCellSite::new("B", (0.5, 0.0)).with_color((0, 0, 255)),
        ];
        let points = vec![point(0.0, 0.0, 0), point(0.5, 0.0, 1)];
        let scene = build_scene(&points, &sites);
        assert_eq!(scene.spheres[0].color, (255, 0, 0));
        assert_eq!(scene.spheres[1].color, (0, 0, 255));
    }
}
