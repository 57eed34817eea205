/*!
 * Event notifiers
 *
 * A notifier runs a script or action file when the host raises an event. Notifiers only
 * fire while the application's `notifiersEnabled` is set, so adding one switches it on and
 * clearing the collection switches it off.
 */

use super::Application;
use crate::collection::{Collection, Member};
use crate::error::Result;
use crate::proxy::{properties, Proxy, RemoteClass, Wrapper};
use crate::session::Session;
use psbridge_dispatch::{RemoteHandle, Variant};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Live collection of the application's notifiers
pub type Notifiers = Collection<Notifier>;

#[derive(Debug, Clone)]
pub struct Notifier {
    proxy: Proxy,
}

impl Notifier {
    properties! {
        /// Four-character event identifier or event string
        "event" => event: String;
        /// Class of object the event applies to, when the event is shared by several
        "eventClass" => event_class: String;
    }

    /// Script or action file run when the event fires
    pub fn event_file(&self) -> Result<PathBuf> {
        self.proxy.read::<String>("eventFile").map(PathBuf::from)
    }

    pub fn remove(&self) -> Result<()> {
        self.proxy.call("remove", &[])
    }
}

impl Wrapper for Notifier {
    fn proxy(&self) -> &Proxy {
        &self.proxy
    }
}

impl RemoteClass for Notifier {
    fn from_proxy(proxy: Proxy) -> Self {
        Self { proxy }
    }
}

impl Member for Notifier {
    const KIND: &'static str = "notifier";
    const KEYED: bool = false;

    fn from_element(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
        Notifier::attach(session, handle)
    }
}

impl Collection<Notifier> {
    /// Register a notifier and enable notifiers on the application
    pub fn add(
        &self,
        event: &str,
        event_file: Option<&Path>,
        event_class: Option<&str>,
    ) -> Result<Notifier> {
        self.parent()?.set_notifiers_enabled(true)?;
        self.add_with(&[
            Variant::from(event),
            Variant::from(event_file.map(|path| path.to_string_lossy().into_owned())),
            Variant::from(event_class),
        ])
    }

    /// Remove every notifier and disable notifiers on the application
    pub fn remove_all(&self) -> Result<()> {
        self.remove_all_remote()?;
        debug!("notifiers cleared, disabling");
        self.parent()?.set_notifiers_enabled(false)
    }

    pub fn parent(&self) -> Result<Application> {
        let handle = self.proxy().read_object("parent")?;
        Application::attach(self.proxy().session(), handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::StaticInstallIndex;
    use crate::AutomationConfig;
    use psbridge_dispatch::stub::{StubConnector, StubObject};
    use psbridge_dispatch::{DispatchError, RemoteObject};

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

    fn notifiers() -> (Arc<StubObject>, Arc<StubObject>) {
        let app = StubObject::new("Application")
            .with_property("notifiersEnabled", false)
            .into_shared();
        let notifiers = StubObject::new("Notifiers")
            .with_property("parent", app.clone() as RemoteHandle)
            .into_shared();
        let target = notifiers.clone();
        notifiers.add_method("add", move |args| {
            let created = StubObject::new("Notifier")
                .with_property("event", args[0].clone())
                .with_property("eventFile", args[1].clone())
                .with_property("eventClass", args[2].clone())
                .into_handle();
            target.push_element(created.clone());
            Ok(Variant::Object(created))
        });
        (app, notifiers)
    }

    #[test]
    fn test_add_enables_notifiers() {
        let (app, remote) = notifiers();
        let notifiers = Notifiers::attach(&session(), remote.clone() as RemoteHandle).unwrap();

        let created = notifiers
            .add("Opn ", Some(Path::new("C:/scripts/on_open.jsx")), None)
            .unwrap();

        assert_eq!(app.property("notifiersEnabled"), Some(Variant::Bool(true)));
        assert_eq!(created.event().unwrap(), "Opn ");
        assert_eq!(
            created.event_file().unwrap(),
            PathBuf::from("C:/scripts/on_open.jsx")
        );
        assert_eq!(created.get("eventClass").unwrap(), Variant::Empty);
        assert_eq!(notifiers.len().unwrap(), 1);
    }

    #[test]
    fn test_remove_all_disables_notifiers() {
        let (app, remote) = notifiers();
        let cleared = remote.clone();
        remote.add_method("removeAll", move |_| {
            for element in cleared.elements()? {
                cleared.remove_element(&element);
            }
            Ok(Variant::Empty)
        });
        let notifiers = Notifiers::attach(&session(), remote.clone() as RemoteHandle).unwrap();
        notifiers.add("Cls ", None, Some("Dcmn")).unwrap();

        notifiers.remove_all().unwrap();

        assert_eq!(app.property("notifiersEnabled"), Some(Variant::Bool(false)));
        assert!(notifiers.is_empty().unwrap());
    }

    #[test]
    fn test_failed_clear_keeps_notifiers_enabled() {
        let (app, remote) = notifiers();
        app.set_property("notifiersEnabled", true);
        remote.add_method("removeAll", |_| {
            Err(DispatchError::invocation("Notifiers are locked"))
        });
        let notifiers = Notifiers::attach(&session(), remote as RemoteHandle).unwrap();

        assert!(notifiers.remove_all().is_err());
        assert_eq!(app.property("notifiersEnabled"), Some(Variant::Bool(true)));
    }
}
