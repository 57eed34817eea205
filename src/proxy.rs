/*!
 * Delegating proxy
 *
 * Every wrapper owns one `Proxy`. Its typed methods are the declared surface; anything
 * else goes through the single forwarder here (`get` / `set` / `invoke` by name), which
 * hands the call to the target handle and returns the result as-is.
 */

use crate::error::{AutomationError, Result};
use crate::flagging;
use crate::session::{ConnectMode, Session};
use psbridge_dispatch::{FromVariant, RemoteHandle, RemoteObjectExt, Variant};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Object class every wrapper resolves unless it is a top-level object of its own
pub const APPLICATION_CLASS: &str = "Application";

/// Forwarding core shared by every wrapper
#[derive(Clone)]
pub struct Proxy {
    session: Arc<Session>,
    /// Where property reads, writes and invocations go
    target: RemoteHandle,
    /// The wrapper's own resolved handle; the application connection for attached wrappers
    helper: RemoteHandle,
    attached: bool,
}

impl Proxy {
    /// Open a fresh top-level connection to `object_class` and flag its operations
    pub fn connect(
        session: &Arc<Session>,
        object_class: &str,
        hint: Option<&str>,
        methods: &[&str],
    ) -> Result<Self> {
        let handle = session.resolve(object_class, hint, ConnectMode::Fresh)?;
        flagging::flag_methods(&handle, methods);

        Ok(Self {
            session: session.clone(),
            target: handle.clone(),
            helper: handle,
            attached: false,
        })
    }

    /// Mediate `parent`, a handle obtained from another remote object
    ///
    /// The wrapper's own connection to `object_class` is resolved through the session's
    /// shared cache and kept only as a helper.
    pub fn attach(session: &Arc<Session>, object_class: &str, parent: RemoteHandle) -> Result<Self> {
        let helper = session.resolve(object_class, None, ConnectMode::Shared)?;

        Ok(Self {
            session: session.clone(),
            target: parent,
            helper,
            attached: true,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The handle accesses are forwarded to
    pub fn target(&self) -> &RemoteHandle {
        &self.target
    }

    /// The wrapper's own resolved handle
    pub fn helper(&self) -> &RemoteHandle {
        &self.helper
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Forward a property read
    pub fn get(&self, name: &str) -> Result<Variant> {
        trace!("get {}", name);
        self.target
            .get(name)
            .map_err(|e| AutomationError::operation(name, e))
    }

    /// Forward a property write
    pub fn set(&self, name: &str, value: Variant) -> Result<()> {
        trace!("set {}", name);
        self.target
            .set(name, value)
            .map_err(|e| AutomationError::operation(name, e))
    }

    /// Forward an operation
    pub fn invoke(&self, name: &str, args: &[Variant]) -> Result<Variant> {
        trace!("invoke {} ({} args)", name, args.len());
        self.target
            .invoke(name, args)
            .map_err(|e| AutomationError::operation(name, e))
    }

    /// Read a property and convert it
    pub fn read<T: FromVariant>(&self, name: &str) -> Result<T> {
        self.target
            .read(name)
            .map_err(|e| AutomationError::operation(name, e))
    }

    /// Write a property from any convertible value
    pub fn write(&self, name: &str, value: impl Into<Variant>) -> Result<()> {
        self.set(name, value.into())
    }

    /// Read a property holding an object
    pub fn read_object(&self, name: &str) -> Result<RemoteHandle> {
        self.read(name)
    }

    /// Invoke an operation and convert its result
    pub fn invoke_as<T: FromVariant>(&self, name: &str, args: &[Variant]) -> Result<T> {
        let value = self.invoke(name, args)?;
        T::from_variant(value).map_err(|e| AutomationError::operation(name, e))
    }

    /// Invoke an operation returning an object
    pub fn invoke_object(&self, name: &str, args: &[Variant]) -> Result<RemoteHandle> {
        self.target
            .invoke_object(name, args)
            .map_err(|e| AutomationError::operation(name, e))
    }

    /// Invoke an operation, discarding its result
    pub fn call(&self, name: &str, args: &[Variant]) -> Result<()> {
        self.invoke(name, args).map(|_| ())
    }

    /// Run a script in the host through the helper handle
    pub fn eval_javascript(&self, script: &str) -> Result<Variant> {
        self.helper
            .invoke(
                "doJavaScript",
                &[Variant::from(script), Variant::Empty, Variant::Empty],
            )
            .map_err(|e| AutomationError::operation("doJavaScript", e))
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("target", &self.target.describe())
            .field("attached", &self.attached)
            .finish()
    }
}

/// Access to the forwarding core of a wrapper
///
/// The provided methods are the fallthrough for members a wrapper does not declare.
pub trait Wrapper {
    fn proxy(&self) -> &Proxy;

    /// The remote handle this wrapper forwards to
    fn handle(&self) -> &RemoteHandle {
        self.proxy().target()
    }

    fn get(&self, name: &str) -> Result<Variant> {
        self.proxy().get(name)
    }

    fn set(&self, name: &str, value: Variant) -> Result<()> {
        self.proxy().set(name, value)
    }

    fn invoke(&self, name: &str, args: &[Variant]) -> Result<Variant> {
        self.proxy().invoke(name, args)
    }
}

/// A wrapper that can be built directly from a proxy
pub trait RemoteClass: Wrapper + Sized {
    /// Object class whose connection backs this wrapper
    const OBJECT_CLASS: &'static str = APPLICATION_CLASS;

    fn from_proxy(proxy: Proxy) -> Self;

    /// Wrap a handle obtained from another remote object
    fn attach(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
        Proxy::attach(session, Self::OBJECT_CLASS, handle).map(Self::from_proxy)
    }
}

/// A wrapper the host can create directly by program identifier
pub trait TopLevel: RemoteClass {
    /// Members flagged as operations on a fresh connection
    const METHODS: &'static [&'static str] = &[];

    /// Open a fresh connection to `OBJECT_CLASS`
    fn connect(session: &Arc<Session>, hint: Option<&str>) -> Result<Self> {
        Proxy::connect(session, Self::OBJECT_CLASS, hint, Self::METHODS).map(Self::from_proxy)
    }
}

/// Generate forwarding accessors for declared properties.
///
/// ```ignore
/// properties! {
///     "name" => name, set_name: String;
///     "bounds" => bounds: Vec<f64>;
/// }
/// ```
macro_rules! properties {
    ($( $(#[$meta:meta])* $remote:literal => $getter:ident $(, $setter:ident)? : $ty:ty; )*) => {
        $(
            $(#[$meta])*
            pub fn $getter(&self) -> $crate::error::Result<$ty> {
                $crate::proxy::Wrapper::proxy(self).read($remote)
            }

            $(
                pub fn $setter(&self, value: $ty) -> $crate::error::Result<()> {
                    $crate::proxy::Wrapper::proxy(self).write($remote, value)
                }
            )?
        )*
    };
}

pub(crate) use properties;
