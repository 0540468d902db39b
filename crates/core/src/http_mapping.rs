//! Pure functions for mapping data-access errors to HTTP status codes.
//!
//! The edge layer (route handlers) owns the actual responses; this module only
//! fixes which status each error kind corresponds to.

use crate::Error;

/// Maps an [`Error`] to an HTTP status code.
///
/// - `NotFound` -> 404 (Not Found)
/// - `Validation` -> 400 (Bad Request)
/// - `Configuration` -> 500 (Internal Server Error)
/// - `System` -> 500 (Internal Server Error)
///
/// # Examples
///
/// ```
/// use repokit_core::{error_to_status_code, Error};
///
/// let error = Error::not_found("User", 7);
/// assert_eq!(error_to_status_code(&error), 404);
/// ```
pub fn error_to_status_code(error: &Error) -> u16 {
    match error {
        Error::NotFound(_) => 404,
        Error::Validation(_) => 400,
        Error::Configuration(_) => 500,
        Error::System(_) => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let error = Error::not_found("User", "abc");
        assert_eq!(error_to_status_code(&error), 404);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let error = Error::validation("Order params must be string or dict");
        assert_eq!(error_to_status_code(&error), 400);
    }

    #[test]
    fn test_configuration_maps_to_500() {
        let error = Error::configuration("no join resolver registered for 'author'");
        assert_eq!(error_to_status_code(&error), 500);
    }

    #[test]
    fn test_system_maps_to_500() {
        let error = Error::system("connection reset");
        assert_eq!(error_to_status_code(&error), 500);
    }
}
