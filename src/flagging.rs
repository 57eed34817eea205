/*!
 * Method flagging for dynamically bound handles
 *
 * A dynamically bound host object offers no type information, so the binding reads every
 * member as a property first. For members that are really operations the host answers
 * that read with the wrong error, so they are flagged up front.
 */

use psbridge_dispatch::{BindingMode, RemoteHandle};
use tracing::debug;

/// Outcome of flagging one handle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagReport {
    /// Names now treated as operations
    pub flagged: Vec<String>,
    /// Names the handle refused
    pub skipped: Vec<String>,
}

/// Flag each of `methods` on `handle` as an invocable operation.
///
/// No-op for reflective bindings. Each name is independent; a refusal is logged and the
/// remaining names are still flagged.
pub fn flag_methods(handle: &RemoteHandle, methods: &[&str]) -> FlagReport {
    let mut report = FlagReport::default();
    if handle.binding_mode() != BindingMode::Dynamic {
        return report;
    }

    for name in methods {
        match handle.flag_as_method(name) {
            Ok(()) => report.flagged.push(name.to_string()),
            Err(e) => {
                debug!("Not a method: {} | {} ({})", name, handle.describe(), e);
                report.skipped.push(name.to_string());
            }
        }
    }

    report
}
