/*!
 * Session: dispatch resolution and the connection cache
 *
 * A `Session` is the context object every wrapper is built from. It owns the platform
 * connector, the installed-version index, the configuration, and the only shared
 * mutable state in the crate: the remembered version and the memoized connections.
 */

use crate::config::AutomationConfig;
use crate::error::{AutomationError, Result};
use crate::install::{self, InstallIndex};
use crate::version;
use psbridge_dispatch::{Connector, RemoteHandle};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// How a resolved handle is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMode {
    /// Always create a new handle (top-level wrappers)
    Fresh,
    /// Reuse a handle memoized by program identifier (wrappers mediating a sub-object)
    Shared,
}

#[derive(Default)]
struct SessionState {
    /// Identifier suffix of the first version that connected
    version: Option<String>,
    /// Program identifier -> memoized handle
    shared: HashMap<String, RemoteHandle>,
}

/// Connection context shared by every wrapper of one host application
///
/// # Example
///
/// ```
/// use psbridge::install::StaticInstallIndex;
/// use psbridge::{AutomationConfig, ConnectMode, Session};
/// use psbridge_dispatch::stub::{StubConnector, StubObject};
/// use std::sync::Arc;
///
/// let connector = StubConnector::new().with_program("Photoshop.Application.180", || {
///     StubObject::new("Application").into_handle()
/// });
/// let session = Session::new(
///     Arc::new(connector),
///     Box::new(StaticInstallIndex::new(["180.0"])),
///     AutomationConfig::default(),
/// );
///
/// session.resolve("Application", None, ConnectMode::Fresh).unwrap();
/// assert_eq!(session.version().as_deref(), Some("180"));
/// assert_eq!(session.year(), Some("2024"));
/// ```
pub struct Session {
    connector: Arc<dyn Connector>,
    index: Box<dyn InstallIndex>,
    config: AutomationConfig,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(
        connector: Arc<dyn Connector>,
        index: Box<dyn InstallIndex>,
        config: AutomationConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            connector,
            index,
            config,
            state: Mutex::new(SessionState::default()),
        })
    }

    /// Session using the platform install index and environment configuration
    pub fn with_connector(connector: Arc<dyn Connector>) -> Arc<Self> {
        let config = AutomationConfig::from_env();
        let index = install::default_install_index(&config.registry_path);
        Self::new(connector, index, config)
    }

    /// Session backed by the platform's `IDispatch` connector
    #[cfg(windows)]
    pub fn platform() -> Arc<Self> {
        Self::with_connector(Arc::new(psbridge_dispatch::com::ComConnector::new()))
    }

    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Identifier suffix remembered for this session, if any connection succeeded
    pub fn version(&self) -> Option<String> {
        self.state().version.clone()
    }

    /// Release label of the remembered version
    pub fn year(&self) -> Option<&'static str> {
        self.version().as_deref().and_then(version::year_for_suffix)
    }

    /// Program identifier for `object_class` at the remembered version
    pub fn program_id(&self, object_class: &str) -> String {
        let cached = self.version();
        version::program_id(&self.config.vendor_root, object_class, cached.as_deref())
    }

    /// Number of memoized shared connections
    pub fn shared_connections(&self) -> usize {
        self.state().shared.len()
    }

    /// Resolve a live handle for `object_class`.
    ///
    /// Candidates are tried in order, stopping at the first success:
    /// 1. the remembered version, if any;
    /// 2. the configured override or `hint`, normalized through the version table;
    /// 3. every installed version, newest first;
    /// 4. no version qualifier at all.
    ///
    /// The first version that connects is remembered for the rest of the session.
    /// The state lock is held for the whole resolution so concurrent first-time callers
    /// agree on one version.
    pub fn resolve(
        &self,
        object_class: &str,
        hint: Option<&str>,
        mode: ConnectMode,
    ) -> Result<RemoteHandle> {
        let mut state = self.state();
        let mut tried = Vec::new();

        if let Some(cached) = state.version.clone() {
            if let Some(handle) =
                self.attempt(&mut state, object_class, Some(&cached), mode, &mut tried)
            {
                return Ok(handle);
            }
        }

        let requested = self.config.version.as_deref().or(hint).map(version::normalize);
        if let Some(requested) = requested.filter(|v| !v.is_empty()) {
            if let Some(handle) =
                self.attempt(&mut state, object_class, Some(&requested), mode, &mut tried)
            {
                remember(&mut state, &requested);
                return Ok(handle);
            }
        }

        for installed in self.installed_versions() {
            if let Some(handle) =
                self.attempt(&mut state, object_class, Some(&installed), mode, &mut tried)
            {
                remember(&mut state, &installed);
                return Ok(handle);
            }
        }

        if let Some(handle) = self.attempt(&mut state, object_class, None, mode, &mut tried) {
            return Ok(handle);
        }

        Err(AutomationError::Connection {
            object_class: object_class.to_string(),
            tried,
        })
    }

    /// Installed versions, newest first; an unreadable index counts as empty
    fn installed_versions(&self) -> Vec<String> {
        match self.index.installed_versions() {
            Ok(keys) => install::version_prefixes(&keys),
            Err(e) => {
                debug!("Unable to read installed versions: {}", e);
                Vec::new()
            }
        }
    }

    fn attempt(
        &self,
        state: &mut SessionState,
        object_class: &str,
        suffix: Option<&str>,
        mode: ConnectMode,
        tried: &mut Vec<String>,
    ) -> Option<RemoteHandle> {
        let program_id = version::program_id(&self.config.vendor_root, object_class, suffix);
        if tried.contains(&program_id) {
            return None;
        }
        tried.push(program_id.clone());

        if mode == ConnectMode::Shared {
            if let Some(handle) = state.shared.get(&program_id) {
                debug!("Reusing shared connection: {}", program_id);
                return Some(handle.clone());
            }
        }

        match self.connector.create(&program_id) {
            Ok(handle) => {
                info!("Connected to {}", program_id);
                if mode == ConnectMode::Shared {
                    state.shared.insert(program_id, handle.clone());
                }
                Some(handle)
            }
            Err(e) => {
                debug!("Unable to create {}: {}", program_id, e);
                None
            }
        }
    }
}

fn remember(state: &mut SessionState, suffix: &str) {
    if state.version.is_none() {
        debug!("Remembering version {}", suffix);
        state.version = Some(suffix.to_string());
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Session")
            .field("version", &state.version)
            .field("shared", &state.shared.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::StaticInstallIndex;
    use psbridge_dispatch::same_object;
    use psbridge_dispatch::stub::{StubConnector, StubObject};

    fn app() -> RemoteHandle {
        StubObject::new("Application").into_handle()
    }

    fn session(connector: Arc<StubConnector>, installed: &[&str]) -> Arc<Session> {
        Session::new(
            connector,
            Box::new(StaticInstallIndex::new(installed.iter().copied())),
            AutomationConfig::default(),
        )
    }

    struct BrokenIndex;

    impl InstallIndex for BrokenIndex {
        fn installed_versions(&self) -> std::io::Result<Vec<String>> {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "registry key missing",
            ))
        }
    }

    #[test]
    fn test_installed_versions_newest_first() {
        let connector = Arc::new(
            StubConnector::new()
                .with_program("Photoshop.Application.170", app)
                .with_program("Photoshop.Application.190", app),
        );
        let session = session(connector.clone(), &["170.0", "190.0"]);

        session
            .resolve("Application", None, ConnectMode::Fresh)
            .unwrap();

        assert_eq!(session.version().as_deref(), Some("190"));
        assert_eq!(connector.attempts(), vec!["Photoshop.Application.190"]);
    }

    #[test]
    fn test_hint_beats_installed_versions() {
        let connector = Arc::new(
            StubConnector::new()
                .with_program("Photoshop.Application.180", app)
                .with_program("Photoshop.Application.190", app),
        );
        let session = session(connector.clone(), &["190.0"]);

        session
            .resolve("Application", Some("2024"), ConnectMode::Fresh)
            .unwrap();

        assert_eq!(connector.attempts(), vec!["Photoshop.Application.180"]);
        assert_eq!(session.program_id("Application"), "Photoshop.Application.180");
    }

    #[test]
    fn test_config_override_beats_hint() {
        let connector = Arc::new(
            StubConnector::new()
                .with_program("Photoshop.Application.170", app)
                .with_program("Photoshop.Application.180", app),
        );
        let config = AutomationConfig {
            version: Some("2023".to_string()),
            ..Default::default()
        };
        let session = Session::new(connector.clone(), Box::new(StaticInstallIndex::empty()), config);

        session
            .resolve("Application", Some("2024"), ConnectMode::Fresh)
            .unwrap();

        assert_eq!(session.version().as_deref(), Some("170"));
    }

    #[test]
    fn test_first_version_wins() {
        let connector = Arc::new(
            StubConnector::new()
                .with_program("Photoshop.Application.180", app)
                .with_program("Photoshop.Application.190", app),
        );
        let session = session(connector.clone(), &[]);

        session
            .resolve("Application", Some("180"), ConnectMode::Fresh)
            .unwrap();
        session
            .resolve("Application", Some("190"), ConnectMode::Fresh)
            .unwrap();

        assert_eq!(session.version().as_deref(), Some("180"));
        assert_eq!(
            connector.attempts(),
            vec!["Photoshop.Application.180", "Photoshop.Application.180"]
        );
    }

    #[test]
    fn test_falls_back_to_unversioned() {
        let connector =
            Arc::new(StubConnector::new().with_program("Photoshop.Application", app));
        let session = session(connector.clone(), &["180.0"]);

        session
            .resolve("Application", None, ConnectMode::Fresh)
            .unwrap();

        assert_eq!(session.version(), None);
        assert_eq!(
            connector.attempts(),
            vec!["Photoshop.Application.180", "Photoshop.Application"]
        );
    }

    #[test]
    fn test_broken_index_is_not_fatal() {
        let connector =
            Arc::new(StubConnector::new().with_program("Photoshop.Application", app));
        let session = Session::new(
            connector.clone(),
            Box::new(BrokenIndex),
            AutomationConfig::default(),
        );

        assert!(session
            .resolve("Application", None, ConnectMode::Fresh)
            .is_ok());
        assert_eq!(connector.attempts(), vec!["Photoshop.Application"]);
    }

    #[test]
    fn test_total_failure_lists_candidates() {
        let connector = Arc::new(StubConnector::new());
        let session = session(connector, &["180.0"]);

        let err = session
            .resolve("Application", Some("2025"), ConnectMode::Fresh)
            .err().unwrap();

        assert_eq!(
            err,
            AutomationError::Connection {
                object_class: "Application".to_string(),
                tried: vec![
                    "Photoshop.Application.190".to_string(),
                    "Photoshop.Application.180".to_string(),
                    "Photoshop.Application".to_string(),
                ],
            }
        );
        assert_eq!(session.version(), None);
    }

    #[test]
    fn test_shared_connections_are_memoized() {
        let connector =
            Arc::new(StubConnector::new().with_program("Photoshop.Application.180", app));
        let session = session(connector.clone(), &["180.0"]);

        let a = session
            .resolve("Application", None, ConnectMode::Shared)
            .unwrap();
        let b = session
            .resolve("Application", None, ConnectMode::Shared)
            .unwrap();

        assert!(same_object(&a, &b));
        assert_eq!(connector.attempts().len(), 1);
        assert_eq!(session.shared_connections(), 1);
    }

    #[test]
    fn test_fresh_connections_are_not_memoized() {
        let connector =
            Arc::new(StubConnector::new().with_program("Photoshop.Application.180", app));
        let session = session(connector.clone(), &["180.0"]);

        let a = session
            .resolve("Application", None, ConnectMode::Fresh)
            .unwrap();
        let b = session
            .resolve("Application", None, ConnectMode::Fresh)
            .unwrap();

        assert!(!same_object(&a, &b));
        assert_eq!(session.shared_connections(), 0);
    }

    #[test]
    fn test_cached_version_applies_to_other_classes() {
        let connector = Arc::new(
            StubConnector::new()
                .with_program("Photoshop.Application.180", app)
                .with_program("Photoshop.BMPSaveOptions.180", || {
                    StubObject::new("BMPSaveOptions").into_handle()
                }),
        );
        let session = session(connector.clone(), &["190.0", "180.0"]);

        session
            .resolve("Application", Some("2024"), ConnectMode::Fresh)
            .unwrap();
        session
            .resolve("BMPSaveOptions", None, ConnectMode::Fresh)
            .unwrap();

        assert_eq!(
            connector.attempts(),
            vec!["Photoshop.Application.180", "Photoshop.BMPSaveOptions.180"]
        );
    }
}
