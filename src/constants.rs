//! Shared application-wide constants.
//! Centralizes the code templates and tweakable values used by code generation,
//! enumeration and viewport rendering.

// Code templates
/// Fortran module wrapping the generated constants and the user's mask subroutine.
pub const FORTRAN_MODULE_TEMPLATE: &str = "
module {{MODULE_NAME}}
implicit none

{{PARAMETERS}}

contains

{{FUNCTIONS}}

end module {{MODULE_NAME}}
";

/// Starting point for the mask subroutine shown in the editor.
pub const FORTRAN_MASK_FN_TEMPLATE: &str = "
subroutine mask(is_in_lattice, x, y, z)
real*8, intent(in)   :: x, y, z
integer, intent(out)  :: is_in_lattice ! 0 = when outside and > 0 when inside the lattice

! -----------------------------------
! YOUR CODE HERE
! -----------------------------------
is_in_lattice = 1


end subroutine
";

/// Placeholder replaced by the module identifier.
pub const MODULE_NAME_PLACEHOLDER: &str = "{{MODULE_NAME}}";
/// Placeholder replaced by typed constant declarations and lattice geometry.
pub const PARAMETERS_PLACEHOLDER: &str = "{{PARAMETERS}}";
/// Placeholder replaced by the user-edited subroutines.
pub const FUNCTIONS_PLACEHOLDER: &str = "{{FUNCTIONS}}";

/// Name of the mask subroutine the generated module must export.
pub const MASK_ROUTINE_NAME: &str = "mask";

// Enumeration
/// Default upper bound on index pairs visited by a single enumeration.
pub const DEFAULT_MAX_INDEX_PAIRS: u64 = 4_000_000;
/// Determinant magnitude below which a basis is treated as degenerate.
pub const DEGENERATE_BASIS_EPSILON: f64 = 1e-12;

// Viewport
/// Default camera distance from the scene centre, in normalized scene units.
pub const CAMERA_DEFAULT_DISTANCE: f32 = 1.6;
/// Closest the orbit camera may get to the scene centre.
pub const CAMERA_MIN_DISTANCE: f32 = 0.25;
/// Farthest the orbit camera may get from the scene centre.
pub const CAMERA_MAX_DISTANCE: f32 = 20.0;
/// Vertical field of view of the perspective projection, in degrees.
pub const CAMERA_FOV_DEGREES: f32 = 45.0;
/// Near clipping distance; spheres closer than this are not drawn.
pub const CAMERA_NEAR_PLANE: f32 = 0.01;
/// Radians of rotation per dragged screen pixel.
pub const CAMERA_ROTATE_SPEED: f32 = 0.01;
/// Smallest on-screen sphere radius in pixels, so tiny sites stay visible.
pub const MIN_SPHERE_SCREEN_RADIUS: f32 = 1.0;

// Settings panel
/// Default width of the settings panel in logical points.
pub const SETTINGS_PANEL_WIDTH: f32 = 420.0;
/// Minimum width of the settings panel in logical points.
pub const SETTINGS_PANEL_MIN_WIDTH: f32 = 280.0;
