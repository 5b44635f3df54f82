//! Error handling foundation for the draftsmith platform.
//!
//! Domain error enums live in the crate that owns the failing
//! operation; this module only provides the shared `Result` alias over
//! rootcause's `Report`, so call sites can attach layer-appropriate
//! context as errors cross crate boundaries.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
///
/// The context parameter names the domain error the report wraps;
/// fallible operations return `Result<T, TheirError>` and convert
/// domain errors with `.into()` or `?`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_defaults_to_unit_context() {
        let ok: Result<&str> = Ok("ready");
        assert_eq!(ok.expect("should be ok"), "ready");
    }
}
