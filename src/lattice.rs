//! Lattice enumeration: index-range estimation, window clipping and mask filtering.
//!
//! A lattice point is `i * v1 + j * v2` for integer `i`, `j`. To materialize
//! the points inside a rectangular window we first estimate a rectangular
//! range of index pairs that is guaranteed to contain every in-window pair,
//! then walk that range row-major, clip against the window and evaluate the
//! mask function at every unit-cell site.

use crate::constants::DEGENERATE_BASIS_EPSILON;
use crate::error::LatticeError;
use crate::types::{LatticeDefinition, LatticePoint, Vec2, WindowBounds};

/// A predicate deciding which absolute positions belong to the lattice.
///
/// Returns `0` for positions outside the lattice and any other value for
/// positions inside, matching the compiled Fortran `mask` subroutine.
pub trait MaskFunction {
    /// Evaluates the mask at `(x, y, z)`.
    fn evaluate(&self, x: f64, y: f64, z: f64) -> i32;
}

impl<F> MaskFunction for F
where
    F: Fn(f64, f64, f64) -> i32,
{
    fn evaluate(&self, x: f64, y: f64, z: f64) -> i32 {
        self(x, y, z)
    }
}

/// Inclusive rectangular range of lattice indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    /// Smallest multiple of `v1`
    pub i_min: i64,
    /// Largest multiple of `v1`
    pub i_max: i64,
    /// Smallest multiple of `v2`
    pub j_min: i64,
    /// Largest multiple of `v2`
    pub j_max: i64,
}

impl IndexRange {
    /// True if `(i, j)` lies inside the range.
    pub fn contains(&self, i: i64, j: i64) -> bool {
        (self.i_min..=self.i_max).contains(&i) && (self.j_min..=self.j_max).contains(&j)
    }

    /// Number of index pairs covered, saturating at `u64::MAX`.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let rows = self.i_max.abs_diff(self.i_min).saturating_add(1);
        let cols = self.j_max.abs_diff(self.j_min).saturating_add(1);
        rows.saturating_mul(cols)
    }

    /// True if the range covers no pairs.
    pub fn is_empty(&self) -> bool {
        self.i_min > self.i_max || self.j_min > self.j_max
    }

    /// Grows the range so it also covers `other`.
    fn union(self, other: IndexRange) -> IndexRange {
        IndexRange {
            i_min: self.i_min.min(other.i_min),
            i_max: self.i_max.max(other.i_max),
            j_min: self.j_min.min(other.j_min),
            j_max: self.j_max.max(other.j_max),
        }
    }
}

/// Number of steps along each axis of `v` needed to reach `(x, y)`.
///
/// A zero component places no constraint on that axis and yields step `0`
/// instead of dividing by zero.
pub fn step_index_at(v: Vec2, x: f64, y: f64) -> (i64, i64) {
    let step = |coordinate: f64, component: f64| {
        if component == 0.0 {
            0
        } else {
            to_index((coordinate / component).round())
        }
    };
    (step(x, v.0), step(y, v.1))
}

/// Estimates the index range whose lattice points can fall inside `window`.
///
/// The estimate starts from per-vector step counts at the window corners
/// (x steps bound `i`, y steps bound `j`) and is then widened by the exact
/// bound obtained by mapping the window corners through the inverse basis.
/// The result may contain pairs outside the window, which enumeration rejects,
/// but it never omits an in-window pair of a non-degenerate basis.
///
/// # Arguments
///
/// * `window` - Rectangle of interest
/// * `v1` - First basis vector
/// * `v2` - Second basis vector
pub fn estimate_index_range(window: &WindowBounds, v1: Vec2, v2: Vec2) -> IndexRange {
    let (x_min, y_min) = window.v_min;
    let (x_max, y_max) = window.v_max;

    let (s1x1, s1y1) = step_index_at(v1, x_min, y_min);
    let (s1x2, s1y2) = step_index_at(v1, x_max, y_max);
    let (s2x1, s2y1) = step_index_at(v2, x_min, y_min);
    let (s2x2, s2y2) = step_index_at(v2, x_max, y_max);
    let xs = [s1x1, s1x2, s2x1, s2x2];
    let ys = [s1y1, s1y2, s2y1, s2y2];

    let heuristic = IndexRange {
        i_min: xs.iter().copied().min().unwrap_or(0),
        i_max: xs.iter().copied().max().unwrap_or(0),
        j_min: ys.iter().copied().min().unwrap_or(0),
        j_max: ys.iter().copied().max().unwrap_or(0),
    };

    match inverse_basis_bound(window, v1, v2) {
        Some(exact) => heuristic.union(exact),
        None => heuristic,
    }
}

/// Bounding box of the window corners expressed in lattice coordinates.
fn inverse_basis_bound(window: &WindowBounds, v1: Vec2, v2: Vec2) -> Option<IndexRange> {
    let det = v1.0 * v2.1 - v2.0 * v1.1;
    if det.abs() < DEGENERATE_BASIS_EPSILON || !det.is_finite() {
        return None;
    }

    let mut range = IndexRange {
        i_min: i64::MAX,
        i_max: i64::MIN,
        j_min: i64::MAX,
        j_max: i64::MIN,
    };
    for (x, y) in window.corners() {
        // Solve [v1 v2] * (a, b) = (x, y) by Cramer's rule.
        let a = (x * v2.1 - v2.0 * y) / det;
        let b = (v1.0 * y - x * v1.1) / det;
        range.i_min = range.i_min.min(to_index(a.floor()));
        range.i_max = range.i_max.max(to_index(a.ceil()));
        range.j_min = range.j_min.min(to_index(b.floor()));
        range.j_max = range.j_max.max(to_index(b.ceil()));
    }
    Some(range)
}

/// Rounds toward an integral index; non-finite values collapse to zero and
/// huge values saturate.
fn to_index(value: f64) -> i64 {
    if value.is_finite() {
        value as i64
    } else {
        0
    }
}

/// Refuses ranges with more than `max_pairs` index pairs.
pub fn enumeration_budget_check(range: &IndexRange, max_pairs: u64) -> Result<(), LatticeError> {
    let pairs = range.len();
    if pairs > max_pairs {
        return Err(LatticeError::RangeTooLarge {
            pairs,
            limit: max_pairs,
        });
    }
    Ok(())
}

/// Enumerates every site position inside `window` that the mask accepts.
///
/// Lattice points are visited row-major (`i` outer, `j` inner) over the
/// estimated index range. A lattice point outside the window is skipped
/// entirely; otherwise each site offset is added in insertion order and the
/// mask is evaluated at the absolute position with `z = 0`.
///
/// # Returns
///
/// The surviving points in deterministic order, each tagged with its site index.
pub fn enumerate_lattice(
    lattice: &LatticeDefinition,
    window: &WindowBounds,
    mask: &dyn MaskFunction,
) -> Vec<LatticePoint> {
    let range = estimate_index_range(window, lattice.v1, lattice.v2);
    enumerate_range(lattice, window, mask, &range)
}

/// Same as [`enumerate_lattice`] but fails instead of walking more than
/// `max_pairs` index pairs.
pub fn enumerate_lattice_within(
    lattice: &LatticeDefinition,
    window: &WindowBounds,
    mask: &dyn MaskFunction,
    max_pairs: u64,
) -> Result<Vec<LatticePoint>, LatticeError> {
    let range = estimate_index_range(window, lattice.v1, lattice.v2);
    enumeration_budget_check(&range, max_pairs)?;
    log::debug!(
        "enumerating i in {}..={}, j in {}..={} ({} pairs)",
        range.i_min,
        range.i_max,
        range.j_min,
        range.j_max,
        range.len()
    );
    Ok(enumerate_range(lattice, window, mask, &range))
}

fn enumerate_range(
    lattice: &LatticeDefinition,
    window: &WindowBounds,
    mask: &dyn MaskFunction,
    range: &IndexRange,
) -> Vec<LatticePoint> {
    let mut points = Vec::new();
    if range.is_empty() {
        return points;
    }

    for i in range.i_min..=range.i_max {
        for j in range.j_min..=range.j_max {
            let (x, y) = lattice.position(i, j);
            if !window.contains(x, y) {
                continue;
            }
            for (site_index, site) in lattice.sites.iter().enumerate() {
                let position = (x + site.value.0, y + site.value.1, 0.0);
                if mask.evaluate(position.0, position.1, position.2) == 0 {
                    continue;
                }
                points.push(LatticePoint {
                    position,
                    site: site_index,
                });
            }
        }
    }
    points
}
