/*!
 * The application object: root of the object model
 */

use super::{object_arg, Document, Documents, MeasurementLog, Notifiers};
use crate::collection::Collection;
use crate::error::Result;
use crate::proxy::{properties, Proxy, RemoteClass, TopLevel, Wrapper};
use crate::session::Session;
use psbridge_dispatch::Variant;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Top-level connection to the host application
#[derive(Debug, Clone)]
pub struct Application {
    proxy: Proxy,
}

impl Application {
    /// Connect to the host application
    ///
    /// `version` may be a release label (`"2024"`) or an identifier suffix (`"180"`); it
    /// only applies when the session has not settled on a version yet.
    pub fn new(session: &Arc<Session>, version: Option<&str>) -> Result<Self> {
        Self::connect(session, version)
    }

    properties! {
        "name" => name: String;
        "version" => version: String;
        "build" => build: String;
        "locale" => locale: String;
        "scriptingVersion" => scripting_version: String;
        "scriptingBuildDate" => scripting_build_date: String;
        "systemInformation" => system_information: String;
        /// Unused memory available to the application, in bytes
        "freeMemory" => free_memory: f64;
        "currentTool" => current_tool, set_current_tool: String;
        /// Dialog mode as the host's raw enumeration value
        "displayDialogs" => display_dialogs, set_display_dialogs: i64;
        "notifiersEnabled" => notifiers_enabled, set_notifiers_enabled: bool;
        "playbackParameters" => playback_parameters, set_playback_parameters: Variant;
        "windowsFileTypes" => windows_file_types: Vec<String>;
        "macintoshFileTypes" => macintosh_file_types: Vec<String>;
    }

    /// Program identifier of the connected application
    pub fn program_name(&self) -> String {
        self.proxy.session().program_id(Self::OBJECT_CLASS)
    }

    /// Release label of the connected version, when it is one of the known releases
    pub fn year(&self) -> Option<&'static str> {
        self.proxy.session().year()
    }

    /// Installation folder
    pub fn path(&self) -> Result<PathBuf> {
        self.proxy.read::<String>("path").map(PathBuf::from)
    }

    pub fn preferences_folder(&self) -> Result<PathBuf> {
        self.proxy
            .read::<String>("preferencesFolder")
            .map(PathBuf::from)
    }

    pub fn plugin_path(&self) -> Result<PathBuf> {
        Ok(self.path()?.join("Plug-ins"))
    }

    pub fn presets_path(&self) -> Result<PathBuf> {
        Ok(self.path()?.join("Presets"))
    }

    pub fn scripts_path(&self) -> Result<PathBuf> {
        Ok(self.presets_path()?.join("Scripts"))
    }

    pub fn recent_files(&self) -> Result<Vec<PathBuf>> {
        let files: Vec<String> = self.proxy.read("recentFiles")?;
        Ok(files.into_iter().map(PathBuf::from).collect())
    }

    pub fn documents(&self) -> Result<Documents> {
        Collection::attach(self.proxy.session(), self.proxy.read_object("documents")?)
    }

    /// Notifiers configured in the Scripts Events Manager
    pub fn notifiers(&self) -> Result<Notifiers> {
        Collection::attach(self.proxy.session(), self.proxy.read_object("notifiers")?)
    }

    pub fn measurement_log(&self) -> Result<MeasurementLog> {
        let handle = self.proxy.read_object("measurementLog")?;
        MeasurementLog::attach(self.proxy.session(), handle)
    }

    /// The front-most document
    pub fn active_document(&self) -> Result<Document> {
        let handle = self.proxy.read_object("activeDocument")?;
        Document::attach(self.proxy.session(), handle)
    }

    pub fn set_active_document(&self, document: &Document) -> Result<()> {
        self.proxy.set("activeDocument", object_arg(document))
    }

    /// Open a file as a new document
    pub fn open(&self, path: &Path) -> Result<Document> {
        let handle = self.proxy.invoke_object(
            "open",
            &[
                Variant::from(path.to_string_lossy().into_owned()),
                Variant::Empty,
                Variant::from(false),
            ],
        )?;
        Document::attach(self.proxy.session(), handle)
    }

    /// Load a file and return the document it became
    pub fn load(&self, path: &Path) -> Result<Document> {
        self.proxy
            .call("load", &[Variant::from(path.to_string_lossy().into_owned())])?;
        self.active_document()
    }

    /// Run a script on the host
    pub fn do_javascript(&self, script: &str) -> Result<Variant> {
        self.proxy.eval_javascript(script)
    }

    pub fn beep(&self) -> Result<()> {
        self.do_javascript("app.beep()").map(|_| ())
    }

    pub fn bring_to_front(&self) -> Result<()> {
        self.do_javascript("app.bringToFront()").map(|_| ())
    }

    /// Play an action from an action set
    pub fn do_action(&self, action: &str, action_set: &str) -> Result<()> {
        self.proxy.call(
            "doAction",
            &[Variant::from(action), Variant::from(action_set)],
        )
    }

    /// Check whether a feature such as `"photoshop/extended"` is enabled
    pub fn feature_enabled(&self, name: &str) -> Result<bool> {
        self.proxy.invoke_as("featureEnabled", &[Variant::from(name)])
    }

    pub fn purge(&self, target: i64) -> Result<()> {
        self.proxy.call("purge", &[Variant::from(target)])
    }

    pub fn refresh(&self) -> Result<()> {
        self.proxy.call("refresh", &[])
    }

    pub fn char_id_to_type_id(&self, char_id: &str) -> Result<i64> {
        self.proxy
            .invoke_as("charIDToTypeID", &[Variant::from(char_id)])
    }

    pub fn string_id_to_type_id(&self, string_id: &str) -> Result<i64> {
        self.proxy
            .invoke_as("stringIDToTypeID", &[Variant::from(string_id)])
    }

    pub fn type_id_to_char_id(&self, type_id: i64) -> Result<String> {
        self.proxy
            .invoke_as("typeIDToCharID", &[Variant::from(type_id)])
    }

    pub fn type_id_to_string_id(&self, type_id: i64) -> Result<String> {
        self.proxy
            .invoke_as("typeIDToStringID", &[Variant::from(type_id)])
    }
}

impl Wrapper for Application {
    fn proxy(&self) -> &Proxy {
        &self.proxy
    }
}

impl RemoteClass for Application {
    fn from_proxy(proxy: Proxy) -> Self {
        Self { proxy }
    }
}

impl TopLevel for Application {
    const METHODS: &'static [&'static str] = &[
        "batch",
        "charIDToTypeID",
        "doAction",
        "doJavaScript",
        "eraseCustomOptions",
        "executeAction",
        "executeActionGet",
        "featureEnabled",
        "getCustomOptions",
        "isQuicktimeAvailable",
        "load",
        "open",
        "openDialog",
        "purge",
        "putCustomOptions",
        "refresh",
        "stringIDToTypeID",
        "toolSupportsBrushes",
        "toolSupportsBrushPresets",
        "typeIDToCharID",
        "typeIDToStringID",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::StaticInstallIndex;
    use crate::AutomationConfig;
    use psbridge_dispatch::stub::{StubConnector, StubObject};
    use psbridge_dispatch::RemoteHandle;

    fn session(app: Arc<StubObject>) -> Arc<Session> {
        let connector = StubConnector::new().with_object("Photoshop.Application.180", app);
        Session::new(
            Arc::new(connector),
            Box::new(StaticInstallIndex::new(["180.0"])),
            AutomationConfig::default(),
        )
    }

    #[test]
    fn test_connect_flags_methods() {
        let remote = StubObject::new("Application")
            .with_method("open", |_| Ok(Variant::Empty))
            .with_method("doJavaScript", |_| Ok(Variant::Empty))
            .into_shared();
        let app = Application::new(&session(remote.clone()), None).unwrap();

        assert!(remote.is_flagged("open"));
        assert!(remote.is_flagged("doJavaScript"));
        assert!(!remote.is_flagged("batch"));
        assert_eq!(app.program_name(), "Photoshop.Application.180");
        assert_eq!(app.year(), Some("2024"));
    }

    #[test]
    fn test_attach_leaves_flags_alone() {
        let host = StubObject::new("Application")
            .with_method("open", |_| Ok(Variant::Empty))
            .into_shared();
        let remote = StubObject::new("Application")
            .with_method("open", |_| Ok(Variant::Empty))
            .into_shared();

        let app =
            Application::attach(&session(host.clone()), remote.clone() as RemoteHandle).unwrap();

        assert!(remote.flagged().is_empty());
        assert!(host.flagged().is_empty());
        assert_eq!(app.program_name(), "Photoshop.Application.180");
    }

    #[test]
    fn test_measurement_log_reached_from_application() {
        let log = StubObject::new("MeasurementLog")
            .with_method("deleteMeasurements", |args| {
                assert_eq!(args, &[Variant::Empty]);
                Ok(Variant::Empty)
            })
            .into_handle();
        let remote = StubObject::new("Application")
            .with_property("measurementLog", log)
            .into_shared();
        let app = Application::new(&session(remote), None).unwrap();

        assert!(app.measurement_log().unwrap().delete_measurements(None).is_ok());
    }

    #[test]
    fn test_path_helpers() {
        let remote = StubObject::new("Application")
            .with_property("path", "C:/Program Files/Adobe/Adobe Photoshop 2024")
            .into_shared();
        let app = Application::new(&session(remote), None).unwrap();

        let scripts = app.scripts_path().unwrap();
        assert!(scripts.ends_with("Presets/Scripts"));
        assert!(app.plugin_path().unwrap().ends_with("Plug-ins"));
    }

    #[test]
    fn test_type_id_conversions() {
        let remote = StubObject::new("Application")
            .with_method("charIDToTypeID", |_| Ok(Variant::Int(1_131_180_616)))
            .with_method("typeIDToStringID", |_| Ok(Variant::from("layer")))
            .into_shared();
        let app = Application::new(&session(remote), None).unwrap();

        assert_eq!(app.char_id_to_type_id("Lyr ").unwrap(), 1_131_180_616);
        assert_eq!(app.type_id_to_string_id(1).unwrap(), "layer");
    }
}
