//! Fortran source generation.
//!
//! Builds the module handed to the compiler: typed `PARAMETER` constants for
//! every filled-in scalar parameter, the lattice geometry as array constants,
//! and the user's mask subroutine after `contains`. All validation runs before
//! the template is touched, so a failure never yields partial output.

use crate::constants::{
    FORTRAN_MODULE_TEMPLATE, FUNCTIONS_PLACEHOLDER, MODULE_NAME_PLACEHOLDER,
    PARAMETERS_PLACEHOLDER,
};
use crate::error::CodegenError;
use crate::literal::{fortran_double, parse_literal, ScalarValue};
use crate::types::{LatticeDefinition, LatticeSettings};

/// Longest identifier accepted by Fortran 2003.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Generates the Fortran module for `settings`.
///
/// # Arguments
///
/// * `module_name` - Name of the generated module; mapped through [`fortran_identifier`]
/// * `settings` - Parameters, lattice and mask code to embed
///
/// # Returns
///
/// The complete source text, or the first validation error found.
pub fn generate_source(
    module_name: &str,
    settings: &LatticeSettings,
) -> Result<String, CodegenError> {
    if module_name.trim().is_empty() {
        return Err(CodegenError::MissingPresetName);
    }

    let constants = typed_constants(settings)?;
    let geometry = geometry_declarations(&settings.lattice)?;

    let mut declarations: Vec<String> = constants
        .iter()
        .map(|(name, value)| {
            format!(
                "{}, PARAMETER :: {} = {}",
                value.fortran_type(),
                name,
                value.fortran_literal()
            )
        })
        .collect();
    declarations.extend(geometry);

    let identifier = fortran_identifier(module_name);
    let source = FORTRAN_MODULE_TEMPLATE
        .replace(MODULE_NAME_PLACEHOLDER, &identifier)
        .replace(PARAMETERS_PLACEHOLDER, &declarations.join("\n"))
        .replace(FUNCTIONS_PLACEHOLDER, &settings.code);

    log::debug!("Generated source for module {identifier}:\n{source}");
    Ok(source)
}

/// Validates and parses the scalar parameters, skipping blank rows.
fn typed_constants(settings: &LatticeSettings) -> Result<Vec<(String, ScalarValue)>, CodegenError> {
    let mut constants = Vec::new();
    for (index, parameter) in settings.parameters.iter().enumerate() {
        if parameter.is_empty() {
            continue;
        }
        if !parameter.is_valid() {
            return Err(CodegenError::InvalidParameter {
                position: index + 1,
            });
        }
        let name = parameter.name.trim().to_string();
        let value = parse_literal(&parameter.value).map_err(|source| CodegenError::Literal {
            name: name.clone(),
            source,
        })?;
        constants.push((name, value));
    }
    Ok(constants)
}

fn geometry_declarations(lattice: &LatticeDefinition) -> Result<Vec<String>, CodegenError> {
    if lattice.sites.is_empty() {
        return Err(CodegenError::NoSites);
    }

    let vector = |name: &str, (x, y): (f64, f64)| {
        format!(
            "DOUBLE PRECISION, DIMENSION(2), PARAMETER :: {name} = (/{}, {}/)",
            fortran_double(x),
            fortran_double(y)
        )
    };

    // RESHAPE fills column-major: all x offsets first, then all y offsets.
    // One value per line keeps every line under the free-form limit of 132 columns.
    let count = lattice.sites.len();
    let values: Vec<String> = lattice
        .sites
        .iter()
        .map(|site| fortran_double(site.value.0))
        .chain(lattice.sites.iter().map(|site| fortran_double(site.value.1)))
        .collect();

    Ok(vec![
        vector("UNIT_CELL_V1", lattice.v1),
        vector("UNIT_CELL_V2", lattice.v2),
        format!(
            "DOUBLE PRECISION, DIMENSION({count}, 2), PARAMETER :: UNIT_CELL_POSITIONS = RESHAPE((/ &\n    {} /), (/{count}, 2/))",
            values.join(", &\n    ")
        ),
    ])
}

/// Maps arbitrary text to a valid Fortran identifier.
///
/// Non-alphanumeric characters become `_`, a leading non-letter gets an `m_`
/// prefix, and the result is truncated to 63 characters.
pub fn fortran_identifier(name: &str) -> String {
    let mut identifier: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !identifier.starts_with(|c: char| c.is_ascii_alphabetic()) {
        identifier.insert_str(0, "m_");
    }
    identifier.truncate(MAX_IDENTIFIER_LEN);
    identifier
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LiteralErrorKind;
    use crate::types::{ScalarParameter, UnitCellSite};

    fn settings_with(parameters: Vec<ScalarParameter>) -> LatticeSettings {
        LatticeSettings {
            parameters,
            code: "subroutine mask(is_in_lattice, x, y, z)\nend subroutine".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let settings = settings_with(vec![
            ScalarParameter::new("a", "1"),
            ScalarParameter::new("", ""),
        ]);
        let source = generate_source("module_x", &settings).unwrap();
        assert!(source.contains("INTEGER, PARAMETER :: a = 1"));
        assert_eq!(source.matches(", PARAMETER ::").count(), 4);
    }

    #[test]
    fn test_missing_value_reports_position() {
        let settings = settings_with(vec![
            ScalarParameter::new("a", "1"),
            ScalarParameter::new("b", ""),
        ]);
        assert_eq!(
            generate_source("module_x", &settings),
            Err(CodegenError::InvalidParameter { position: 2 })
        );
    }

    #[test]
    fn test_missing_name_reports_position() {
        let settings = settings_with(vec![ScalarParameter::new("", "1")]);
        assert_eq!(
            generate_source("module_x", &settings),
            Err(CodegenError::InvalidParameter { position: 1 })
        );
    }

    #[test]
    fn test_empty_module_name_is_rejected() {
        let settings = settings_with(vec![]);
        assert_eq!(
            generate_source("  ", &settings),
            Err(CodegenError::MissingPresetName)
        );
    }

    #[test]
    fn test_invalid_literal_is_reported_with_name() {
        let settings = settings_with(vec![ScalarParameter::new("r", "1 + 1")]);
        match generate_source("module_x", &settings) {
            Err(CodegenError::Literal { name, source }) => {
                assert_eq!(name, "r");
                assert_eq!(source.kind, LiteralErrorKind::InvalidSyntax);
            }
            other => panic!("expected literal error, got {other:?}"),
        }
    }

    #[test]
    fn test_every_literal_kind_is_typed() {
        let settings = settings_with(vec![
            ScalarParameter::new("n", "3"),
            ScalarParameter::new("r", "1.5"),
            ScalarParameter::new("flag", "True"),
            ScalarParameter::new("c", "1-2j"),
        ]);
        let source = generate_source("module_x", &settings).unwrap();
        assert!(source.contains("INTEGER, PARAMETER :: n = 3"));
        assert!(source.contains("DOUBLE PRECISION, PARAMETER :: r = 1.5D0"));
        assert!(source.contains("LOGICAL, PARAMETER :: flag = .TRUE."));
        assert!(source.contains("COMPLEX*16, PARAMETER :: c = (1.0D0, -2.0D0)"));
    }

    #[test]
    fn test_geometry_layout() {
        let mut settings = settings_with(vec![]);
        settings.lattice.v1 = (1.0, 0.0);
        settings.lattice.v2 = (0.5, 0.75);
        settings.lattice.sites = vec![
            UnitCellSite::new("A", (0.0, 0.25)),
            UnitCellSite::new("B", (0.5, 0.75)),
        ];
        let source = generate_source("module_x", &settings).unwrap();
        assert!(source.contains(
            "DOUBLE PRECISION, DIMENSION(2), PARAMETER :: UNIT_CELL_V1 = (/1.0D0, 0.0D0/)"
        ));
        assert!(source.contains(
            "DOUBLE PRECISION, DIMENSION(2), PARAMETER :: UNIT_CELL_V2 = (/5.0D-1, 7.5D-1/)"
        ));
        assert!(source.contains(
            "DOUBLE PRECISION, DIMENSION(2, 2), PARAMETER :: UNIT_CELL_POSITIONS = RESHAPE((/ &\n    \
             0.0D0, &\n    5.0D-1, &\n    2.5D-1, &\n    7.5D-1 /), (/2, 2/))"
        ));
        assert!(source.lines().all(|line| line.len() <= 132));
    }

    #[test]
    fn test_no_sites_is_rejected() {
        let mut settings = settings_with(vec![]);
        settings.lattice.sites.clear();
        assert_eq!(
            generate_source("module_x", &settings),
            Err(CodegenError::NoSites)
        );
    }

    #[test]
    fn test_module_wraps_user_code() {
        let settings = settings_with(vec![]);
        let source = generate_source("module_abc", &settings).unwrap();
        let module_line = source.find("module module_abc").unwrap();
        let contains = source.find("contains").unwrap();
        let code = source.find("subroutine mask").unwrap();
        let end = source.find("end module module_abc").unwrap();
        assert!(module_line < contains && contains < code && code < end);
        assert!(!source.contains("{{"));
    }

    #[test]
    fn test_fortran_identifier() {
        assert_eq!(fortran_identifier("module_0a1b"), "module_0a1b");
        assert_eq!(fortran_identifier("my lattice-2"), "my_lattice_2");
        assert_eq!(fortran_identifier("2d"), "m_2d");
        assert_eq!(fortran_identifier(&"x".repeat(80)).len(), 63);
    }
}
