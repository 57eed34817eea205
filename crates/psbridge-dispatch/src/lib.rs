//! psbridge Dispatch: the dynamic-invocation boundary
//!
//! This crate defines the `RemoteObject` trait, which abstracts an object living in an
//! external automation host (reached through a platform dynamic-invocation protocol) so the
//! wrapper layer in `psbridge` never touches the platform directly.
//!
//! # Architecture
//!
//! The protocol is reflection-free: a remote object is addressed purely by member name.
//!
//! 1. **Properties**: `get` / `set` by name
//! 2. **Operations**: `invoke` by name with positional arguments
//! 3. **Collections**: 1-origin `item`, keyed `item_by_name`, and live `elements`
//! 4. **Binding**: `flag_as_method` for bindings that cannot tell properties from methods
//!
//! A `Connector` turns a program identifier (`Vendor.Class[.Version]`) into a live handle.
//! On Windows, [`com::ComConnector`] speaks the protocol over `IDispatch`; [`stub`] is an
//! in-memory backend for every platform.
//!
//! # Example
//!
//! ```rust
//! use psbridge_dispatch::stub::StubObject;
//! use psbridge_dispatch::{RemoteObject, RemoteObjectExt, Variant};
//!
//! let layer = StubObject::new("ArtLayer")
//!     .with_property("name", "Background")
//!     .into_handle();
//!
//! let name: String = layer.read("name").unwrap();
//! assert_eq!(name, "Background");
//!
//! layer.set("name", Variant::from("Sky")).unwrap();
//! assert_eq!(layer.read::<String>("name").unwrap(), "Sky");
//! ```

use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

#[cfg(windows)]
pub mod com;
pub mod stub;
mod variant;

pub use variant::{FromVariant, Variant};

/// HRESULT reported by the protocol when a 1-origin index or key is not in the collection.
pub const DISP_E_BADINDEX: i32 = 0x8002_000B_u32 as i32;

/// HRESULT reported when an invoked member raised an application-level exception.
pub const DISP_E_EXCEPTION: i32 = 0x8002_0009_u32 as i32;

pub const DISP_E_MEMBERNOTFOUND: i32 = 0x8002_0003_u32 as i32;
pub const DISP_E_UNKNOWNNAME: i32 = 0x8002_0006_u32 as i32;
/// Marks an omitted optional argument
pub const DISP_E_PARAMNOTFOUND: i32 = 0x8002_0004_u32 as i32;

const DISP_E_TYPEMISMATCH: i32 = 0x8002_0005_u32 as i32;
const DISP_E_BADPARAMCOUNT: i32 = 0x8002_000E_u32 as i32;
const DISP_E_PARAMNOTOPTIONAL: i32 = 0x8002_000F_u32 as i32;
const RPC_E_SERVER_DIED: i32 = 0x8001_0007_u32 as i32;
const RPC_E_SERVER_DIED_DNE: i32 = 0x8001_0012_u32 as i32;
const RPC_E_DISCONNECTED: i32 = 0x8001_0108_u32 as i32;
const RPC_S_SERVER_UNAVAILABLE: i32 = 0x8007_06BA_u32 as i32;
const CO_E_OBJNOTCONNECTED: i32 = 0x8004_01FD_u32 as i32;

/// Errors raised by the dynamic-invocation protocol itself.
///
/// These never cross the wrapper surface in `psbridge`; every wrapper converts them into
/// its own typed errors at the call site.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// The remote object does not recognize this member name.
    #[error("Unknown name: {name}")]
    UnknownName { name: String },

    /// The call reached the remote object but it reported a failure.
    #[error("Invocation failed ({code:#010X}): {description}")]
    Invocation { code: i32, description: String },

    /// The remote process went away; the handle is no longer usable.
    #[error("Remote object disconnected")]
    Disconnected,

    /// No object could be created for a program identifier.
    #[error("Cannot create object for {program_id}: {reason}")]
    Create { program_id: String, reason: String },

    /// A value came back in a shape the caller did not expect.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl DispatchError {
    /// Shorthand for an unknown-member failure
    pub fn unknown_name(name: impl Into<String>) -> Self {
        DispatchError::UnknownName { name: name.into() }
    }

    /// Shorthand for an application-level invocation failure
    pub fn invocation(description: impl Into<String>) -> Self {
        DispatchError::Invocation {
            code: DISP_E_EXCEPTION,
            description: description.into(),
        }
    }

    /// Check if this is the protocol's "member not supported" signal
    pub fn is_unknown_name(&self) -> bool {
        matches!(self, DispatchError::UnknownName { .. })
    }

    /// Classify a failed HRESULT from a call on `member`
    ///
    /// `description` is the host's own exception text, when it supplied one.
    pub fn from_hresult(code: i32, member: &str, description: Option<String>) -> Self {
        match code {
            DISP_E_UNKNOWNNAME | DISP_E_MEMBERNOTFOUND => DispatchError::unknown_name(member),
            RPC_E_DISCONNECTED
            | RPC_E_SERVER_DIED
            | RPC_E_SERVER_DIED_DNE
            | RPC_S_SERVER_UNAVAILABLE
            | CO_E_OBJNOTCONNECTED => DispatchError::Disconnected,
            _ => DispatchError::Invocation {
                code,
                description: description.unwrap_or_else(|| default_description(code).to_string()),
            },
        }
    }
}

fn default_description(code: i32) -> &'static str {
    match code {
        DISP_E_BADINDEX => "Invalid index",
        DISP_E_EXCEPTION => "Exception occurred",
        DISP_E_PARAMNOTFOUND => "Parameter not found",
        DISP_E_TYPEMISMATCH => "Type mismatch",
        DISP_E_BADPARAMCOUNT => "Invalid number of parameters",
        DISP_E_PARAMNOTOPTIONAL => "Parameter not optional",
        _ => "Unspecified error",
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;

/// How member access is bound on a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingMode {
    /// Fully dynamic: names are resolved per call with no type information, so a
    /// member is read as a property unless it was flagged as a method.
    #[default]
    Dynamic,

    /// The object exposes type information; properties and methods are told apart
    /// by the protocol and flagging is unnecessary.
    Reflective,
}

/// Shared handle to a live remote object.
///
/// Cloning the handle does not clone the remote object. The remote application owns the
/// object lifetime; a handle may outlive it, in which case calls fail with
/// [`DispatchError::Disconnected`].
pub type RemoteHandle = Arc<dyn RemoteObject>;

/// A reflection-free remote object
///
/// Every call blocks until the remote application answers.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so handles can live inside a shared session cache.
pub trait RemoteObject: Send + Sync {
    /// Short description for diagnostics (never used for classification)
    fn describe(&self) -> String {
        "remote object".to_string()
    }

    /// How member names are bound on this handle
    fn binding_mode(&self) -> BindingMode {
        BindingMode::Dynamic
    }

    /// Read a property by name
    fn get(&self, name: &str) -> Result<Variant>;

    /// Write a property by name
    fn set(&self, name: &str, value: Variant) -> Result<()>;

    /// Invoke an operation by name with positional arguments
    fn invoke(&self, name: &str, args: &[Variant]) -> Result<Variant>;

    /// Mark a member so later access is an invocation rather than a field read
    fn flag_as_method(&self, name: &str) -> Result<()>;

    /// Fetch a collection element by its 1-origin position
    fn item(&self, index: i64) -> Result<RemoteHandle>;

    /// Fetch a collection element by key
    fn item_by_name(&self, name: &str) -> Result<RemoteHandle>;

    /// Enumerate the collection as it currently stands
    fn elements(&self) -> Result<Vec<RemoteHandle>>;

    /// Concrete backend object, for backends that must recognize their own handles
    /// when they are passed back as arguments
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

/// Convenience methods derived from the core trait
pub trait RemoteObjectExt: RemoteObject {
    /// Read a property and convert it
    fn read<T: FromVariant>(&self, name: &str) -> Result<T> {
        T::from_variant(self.get(name)?)
    }

    /// Read a property that must hold an object
    fn get_object(&self, name: &str) -> Result<RemoteHandle> {
        self.read(name)
    }

    /// Invoke an operation that must return an object
    fn invoke_object(&self, name: &str, args: &[Variant]) -> Result<RemoteHandle> {
        RemoteHandle::from_variant(self.invoke(name, args)?)
    }
}

// Blanket implementation for all RemoteObject implementations
impl<T: RemoteObject + ?Sized> RemoteObjectExt for T {}

/// Resolve-by-identifier half of the protocol
pub trait Connector: Send + Sync {
    /// Create (or attach to) the object registered under `program_id`
    fn create(&self, program_id: &str) -> Result<RemoteHandle>;
}

/// Compare two handles by identity
pub fn same_object(a: &RemoteHandle, b: &RemoteHandle) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_display() {
        let err = DispatchError::unknown_name("kind");
        assert_eq!(err.to_string(), "Unknown name: kind");
        assert!(err.is_unknown_name());

        let err = DispatchError::Invocation {
            code: DISP_E_BADINDEX,
            description: "Invalid index".to_string(),
        };
        assert_eq!(err.to_string(), "Invocation failed (0x8002000B): Invalid index");
        assert!(!err.is_unknown_name());
    }

    #[test]
    fn test_hresult_classification() {
        assert_eq!(
            DispatchError::from_hresult(DISP_E_UNKNOWNNAME, "kind", None),
            DispatchError::unknown_name("kind")
        );
        assert_eq!(
            DispatchError::from_hresult(DISP_E_MEMBERNOTFOUND, "path", None),
            DispatchError::unknown_name("path")
        );
        assert_eq!(
            DispatchError::from_hresult(RPC_S_SERVER_UNAVAILABLE, "name", None),
            DispatchError::Disconnected
        );

        let err = DispatchError::from_hresult(
            DISP_E_EXCEPTION,
            "open",
            Some("The file could not be found".to_string()),
        );
        assert_eq!(err, DispatchError::invocation("The file could not be found"));

        match DispatchError::from_hresult(DISP_E_BADINDEX, "Item", None) {
            DispatchError::Invocation { code, description } => {
                assert_eq!(code, DISP_E_BADINDEX);
                assert_eq!(description, "Invalid index");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_same_object() {
        let a = stub::StubObject::new("Layer").into_handle();
        let b = a.clone();
        let c = stub::StubObject::new("Layer").into_handle();

        assert!(same_object(&a, &b));
        assert!(!same_object(&a, &c));
    }
}
