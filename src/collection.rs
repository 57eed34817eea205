/*!
 * Live collections
 *
 * A `Collection` mediates a remote collection object. Nothing is cached: length,
 * membership and element kinds are read from the host on every access. Callers index from
 * zero, the host from one; the translation happens only in [`Collection::item`].
 */

use crate::error::{AutomationError, Result};
use crate::proxy::{Proxy, Wrapper, APPLICATION_CLASS};
use crate::session::Session;
use psbridge_dispatch::{DispatchError, RemoteHandle, RemoteObjectExt, Variant};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::vec;
use tracing::{debug, warn};

/// A wrapper that can be produced from a collection element
pub trait Member: Sized {
    /// Label used in lookup errors
    const KIND: &'static str;

    /// Whether the host supports keyed access by name on this collection
    const KEYED: bool = true;

    /// Wrap (and if needed classify) one element handle
    fn from_element(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self>;
}

/// Live view of a remote collection of `M`
pub struct Collection<M> {
    proxy: Proxy,
    _member: PhantomData<fn() -> M>,
}

impl<M: Member> Collection<M> {
    /// Mediate the remote collection `handle`
    pub fn attach(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
        Ok(Self {
            proxy: Proxy::attach(session, APPLICATION_CLASS, handle)?,
            _member: PhantomData,
        })
    }

    fn session(&self) -> &Arc<Session> {
        self.proxy.session()
    }

    /// Current element handles, in host order
    pub fn elements(&self) -> Result<Vec<RemoteHandle>> {
        self.proxy
            .target()
            .elements()
            .map_err(|e| AutomationError::operation("elements", e))
    }

    /// Number of elements right now
    pub fn len(&self) -> Result<usize> {
        self.elements().map(|elements| elements.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// Element at 0-origin position `index`
    pub fn item(&self, index: i64) -> Result<M> {
        let out_of_range = AutomationError::Index {
            kind: M::KIND,
            index,
        };
        if index < 0 {
            return Err(out_of_range);
        }
        let Some(remote_index) = index.checked_add(1) else {
            return Err(out_of_range);
        };

        let handle = match self.proxy.target().item(remote_index) {
            Ok(handle) => handle,
            Err(DispatchError::Disconnected) => {
                return Err(AutomationError::operation("item", DispatchError::Disconnected))
            }
            Err(e) => {
                debug!("{} [{}] lookup failed: {}", M::KIND, index, e);
                return Err(out_of_range);
            }
        };

        M::from_element(self.session(), handle)
    }

    /// First element named `name`
    pub fn get_by_name(&self, name: &str) -> Result<M> {
        let not_found = || AutomationError::NotFound {
            kind: M::KIND,
            name: name.to_string(),
        };

        let handle = if M::KEYED {
            match self.proxy.target().item_by_name(name) {
                Ok(handle) => handle,
                Err(DispatchError::Disconnected) => {
                    return Err(AutomationError::operation(
                        "item",
                        DispatchError::Disconnected,
                    ))
                }
                Err(e) => {
                    debug!("{} '{}' lookup failed: {}", M::KIND, name, e);
                    return Err(not_found());
                }
            }
        } else {
            self.scan(name)?.ok_or_else(not_found)?
        };

        M::from_element(self.session(), handle)
    }

    fn scan(&self, name: &str) -> Result<Option<RemoteHandle>> {
        for element in self.elements()? {
            let element_name: String = element
                .read("name")
                .map_err(|e| AutomationError::operation("name", e))?;
            if element_name == name {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// Like [`Collection::get_by_name`], with a missing name as `None`
    pub fn find(&self, name: &str) -> Result<Option<M>> {
        match self.get_by_name(name) {
            Ok(member) => Ok(Some(member)),
            Err(AutomationError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Names of the current elements, in host order
    pub fn names(&self) -> Result<Vec<String>> {
        self.elements()?
            .iter()
            .map(|element| {
                element
                    .read("name")
                    .map_err(|e| AutomationError::operation("name", e))
            })
            .collect()
    }

    /// Lazily wrap each element of the live enumeration
    pub fn iter(&self) -> Members<'_, M> {
        Members {
            collection: self,
            pending: None,
        }
    }

    /// Invoke the host's `add` and wrap the new element
    pub(crate) fn add_with(&self, args: &[Variant]) -> Result<M> {
        let handle = self.proxy.invoke_object("add", args)?;
        M::from_element(self.session(), handle)
    }

    /// Invoke the host's bulk `removeAll`
    pub(crate) fn remove_all_remote(&self) -> Result<()> {
        self.proxy.call("removeAll", &[])
    }

    /// Invoke `operation` on every element, ignoring per-element failures
    ///
    /// Returns how many elements accepted the call.
    pub(crate) fn for_each_ignoring(&self, operation: &str) -> Result<usize> {
        let mut done = 0;
        for element in self.elements()? {
            match element.invoke(operation, &[]) {
                Ok(_) => done += 1,
                Err(e) => warn!("{} on {} failed: {}", operation, element.describe(), e),
            }
        }
        Ok(done)
    }
}

impl<M> Wrapper for Collection<M> {
    fn proxy(&self) -> &Proxy {
        &self.proxy
    }
}

impl<M> Clone for Collection<M> {
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
            _member: PhantomData,
        }
    }
}

impl<M> fmt::Debug for Collection<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("proxy", &self.proxy)
            .finish()
    }
}

impl<'a, M: Member> IntoIterator for &'a Collection<M> {
    type Item = Result<M>;
    type IntoIter = Members<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the members of a [`Collection`]
///
/// The enumeration is read when iteration starts; each element is classified as it is
/// reached. A failed enumeration yields one error and ends.
pub struct Members<'a, M> {
    collection: &'a Collection<M>,
    pending: Option<vec::IntoIter<RemoteHandle>>,
}

impl<M: Member> Iterator for Members<'_, M> {
    type Item = Result<M>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_none() {
            match self.collection.elements() {
                Ok(elements) => self.pending = Some(elements.into_iter()),
                Err(e) => {
                    self.pending = Some(Vec::new().into_iter());
                    return Some(Err(e));
                }
            }
        }

        let handle = self.pending.as_mut()?.next()?;
        Some(M::from_element(self.collection.session(), handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::StaticInstallIndex;
    use crate::AutomationConfig;
    use psbridge_dispatch::stub::{StubConnector, StubObject};

    struct Named(String);

    impl Member for Named {
        const KIND: &'static str = "named";

        fn from_element(_session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
            handle
                .read("name")
                .map(Named)
                .map_err(|e| AutomationError::operation("name", e))
        }
    }

    struct Scanned(String);

    impl Member for Scanned {
        const KIND: &'static str = "scanned";
        const KEYED: bool = false;

        fn from_element(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
            Named::from_element(session, handle).map(|named| Scanned(named.0))
        }
    }

    fn session() -> Arc<Session> {
        let connector = StubConnector::new().with_program("Photoshop.Application", || {
            StubObject::new("Application").into_handle()
        });
        Session::new(
            Arc::new(connector),
            Box::new(StaticInstallIndex::empty()),
            AutomationConfig::default(),
        )
    }

    fn element(name: &str) -> RemoteHandle {
        StubObject::new("Element")
            .with_property("name", name)
            .with_method("delete", |_| {
                Err(DispatchError::invocation("General Photoshop error"))
            })
            .into_handle()
    }

    fn remote(names: &[&str]) -> Arc<StubObject> {
        let collection = StubObject::new("Collection").into_shared();
        for name in names {
            collection.push_element(element(name));
        }
        collection
    }

    #[test]
    fn test_item_translates_to_one_origin() {
        let remote = remote(&["a", "b", "c"]);
        let collection: Collection<Named> = Collection::attach(&session(), remote).unwrap();

        assert_eq!(collection.item(0).unwrap().0, "a");
        assert_eq!(collection.item(2).unwrap().0, "c");
    }

    #[test]
    fn test_item_out_of_range() {
        let remote = remote(&["a", "b", "c"]);
        let collection: Collection<Named> = Collection::attach(&session(), remote).unwrap();

        for index in [3, -1] {
            let err = collection.item(index).err().unwrap();
            assert_eq!(err, AutomationError::Index { kind: "named", index });
            assert!(err.to_string().contains(&format!("[{}]", index)));
        }
    }

    #[test]
    fn test_item_at_largest_index() {
        let remote = remote(&["a"]);
        let collection: Collection<Named> = Collection::attach(&session(), remote).unwrap();

        let err = collection.item(i64::MAX).err().unwrap();
        assert_eq!(
            err,
            AutomationError::Index {
                kind: "named",
                index: i64::MAX
            }
        );
        assert!(err.to_string().contains(&i64::MAX.to_string()));
    }

    #[test]
    fn test_lost_connection_is_not_an_index_error() {
        let remote = remote(&["a"]);
        let collection: Collection<Named> =
            Collection::attach(&session(), remote.clone()).unwrap();
        remote.disconnect();

        let err = collection.item(0).err().unwrap();
        assert!(matches!(err, AutomationError::Operation { .. }));
    }

    #[test]
    fn test_get_by_name() {
        let remote = remote(&["a", "b"]);
        let collection: Collection<Named> = Collection::attach(&session(), remote).unwrap();

        assert_eq!(collection.get_by_name("b").unwrap().0, "b");

        let err = collection.get_by_name("missing").err().unwrap();
        assert!(matches!(err, AutomationError::NotFound { .. }));
        assert!(err.to_string().contains("missing"));
        assert!(collection.find("missing").unwrap().is_none());
    }

    #[test]
    fn test_scanning_lookup() {
        let remote = remote(&["Red", "Green"]);
        let collection: Collection<Scanned> = Collection::attach(&session(), remote).unwrap();

        assert_eq!(collection.get_by_name("Green").unwrap().0, "Green");
        assert!(matches!(
            collection.get_by_name("Alpha 1"),
            Err(AutomationError::NotFound { kind: "scanned", .. })
        ));
    }

    #[test]
    fn test_length_is_live() {
        let remote = remote(&["a"]);
        let collection: Collection<Named> =
            Collection::attach(&session(), remote.clone()).unwrap();

        assert_eq!(collection.len().unwrap(), 1);
        remote.push_element(element("b"));
        assert_eq!(collection.len().unwrap(), 2);
        assert_eq!(collection.names().unwrap(), vec!["a", "b"]);
        assert!(!collection.is_empty().unwrap());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let remote = remote(&["a", "b"]);
        let collection: Collection<Named> = Collection::attach(&session(), remote).unwrap();

        let first: Vec<String> = collection.iter().map(|m| m.unwrap().0).collect();
        let second: Vec<String> = (&collection).into_iter().map(|m| m.unwrap().0).collect();
        assert_eq!(first, vec!["a", "b"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_enumeration_yields_one_error() {
        let remote = remote(&["a"]);
        let collection: Collection<Named> =
            Collection::attach(&session(), remote.clone()).unwrap();
        remote.disconnect();

        let results: Vec<_> = collection.iter().collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn test_for_each_ignoring_failures() {
        let remote = remote(&["a", "b"]);
        let collection: Collection<Named> = Collection::attach(&session(), remote).unwrap();

        assert_eq!(collection.for_each_ignoring("delete").unwrap(), 0);
    }
}
