/*!
 * Capability probing
 *
 * Several object kinds come back from the host as the same opaque handle. They are told
 * apart by reading a member only one of them exposes. Each probe names which boundary
 * failures count as "member absent"; any other failure is a real error.
 */

use crate::error::{AutomationError, Result};
use psbridge_dispatch::{DispatchError, RemoteHandle};
use tracing::trace;

/// Decides whether a failed probe read means the member is absent
pub type Absence = fn(&DispatchError) -> bool;

/// Only "unknown name" means absent
pub fn unknown_name(err: &DispatchError) -> bool {
    err.is_unknown_name()
}

/// "Unknown name" or a failure the host raised while answering
///
/// Some members exist on every object but only answer on one kind; the others reject the
/// read with an invocation error. A lost connection or a malformed answer still propagates.
pub fn rejected(err: &DispatchError) -> bool {
    matches!(
        err,
        DispatchError::UnknownName { .. } | DispatchError::Invocation { .. }
    )
}

/// Whether `handle` exposes `member`
pub fn probe(handle: &RemoteHandle, member: &str, absent: Absence) -> Result<bool> {
    match handle.get(member) {
        Ok(_) => Ok(true),
        Err(e) if absent(&e) => {
            trace!("{} has no member {} ({})", handle.describe(), member, e);
            Ok(false)
        }
        Err(e) => Err(AutomationError::operation(member, e)),
    }
}

/// Build one of two wrappers depending on whether `handle` exposes `member`
pub fn classify<T>(
    handle: RemoteHandle,
    member: &str,
    absent: Absence,
    on_present: impl FnOnce(RemoteHandle) -> Result<T>,
    on_absent: impl FnOnce(RemoteHandle) -> Result<T>,
) -> Result<T> {
    if probe(&handle, member, absent)? {
        on_present(handle)
    } else {
        on_absent(handle)
    }
}
