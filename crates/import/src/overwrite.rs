//! Overwrite flag reconciliation.
use tracing::debug;

use crate::params;

/// Parameter-blob key that carries an overwrite flag.
pub const OVERWRITE_KEY: &str = "overwrite";

/// Decides whether an import may replace an existing artifact.
///
/// The explicit flag is read first (`"true"` in any case is true, anything
/// else or absence is false). When the parameter blob carries an `overwrite`
/// key, its value replaces the explicit flag unconditionally, even when the
/// explicit flag said the opposite.
pub fn resolve_overwrite(explicit: Option<&str>, parameters: &str) -> bool {
    let explicit_flag = explicit.is_some_and(is_true);
    match params::get_value(parameters, OVERWRITE_KEY) {
        Some(value) => {
            let flag = is_true(&value);
            if explicit.is_some() && flag != explicit_flag {
                debug!(
                    explicit = explicit_flag,
                    from_parameters = flag,
                    "overwrite flag taken from parameters"
                );
            }
            flag
        }
        None => explicit_flag,
    }
}

fn is_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}
