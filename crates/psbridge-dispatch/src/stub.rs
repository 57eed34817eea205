//! In-memory implementation of the dispatch boundary
//!
//! `StubObject` behaves like a dynamically bound automation object: it knows nothing but
//! the member names it was given, answers unknown names with
//! [`DispatchError::UnknownName`], and addresses its elements 1-origin. `StubConnector`
//! maps program identifiers to object factories and records every creation attempt.
//!
//! Used by the `psbridge` test-suite and by embedders that want to exercise wrapper code
//! without a running host application.

use crate::{
    same_object, BindingMode, Connector, DispatchError, RemoteHandle, RemoteObject, Result,
    Variant, DISP_E_BADINDEX,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

/// Operation body for a stub member
pub type StubMethod = Arc<dyn Fn(&[Variant]) -> Result<Variant> + Send + Sync>;

/// Factory producing a fresh object for a program identifier
pub type StubFactory = Arc<dyn Fn() -> RemoteHandle + Send + Sync>;

#[derive(Default)]
struct StubState {
    properties: BTreeMap<String, Variant>,
    methods: HashMap<String, StubMethod>,
    elements: Vec<RemoteHandle>,
    failing: HashMap<String, DispatchError>,
    flagged: BTreeSet<String>,
    disconnected: bool,
}

/// An in-memory remote object
pub struct StubObject {
    class: String,
    binding: BindingMode,
    state: Mutex<StubState>,
}

impl StubObject {
    /// Create an empty, dynamically bound object
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            binding: BindingMode::Dynamic,
            state: Mutex::new(StubState::default()),
        }
    }

    pub fn with_binding(mut self, binding: BindingMode) -> Self {
        self.binding = binding;
        self
    }

    pub fn with_property(self, name: impl Into<String>, value: impl Into<Variant>) -> Self {
        self.set_property(name, value);
        self
    }

    /// Make every read of `name` fail with `error`
    pub fn with_failing_property(self, name: impl Into<String>, error: DispatchError) -> Self {
        self.fail_property(name, error);
        self
    }

    pub fn with_method<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&[Variant]) -> Result<Variant> + Send + Sync + 'static,
    {
        self.add_method(name, body);
        self
    }

    pub fn with_element(self, element: RemoteHandle) -> Self {
        self.push_element(element);
        self
    }

    /// Finish building and share the object
    pub fn into_shared(self) -> Arc<StubObject> {
        Arc::new(self)
    }

    /// Finish building and return a type-erased handle
    pub fn into_handle(self) -> RemoteHandle {
        Arc::new(self)
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    fn state(&self) -> MutexGuard<'_, StubState> {
        // A panicking test body must not wedge every later call on the same stub
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create or overwrite a property, bypassing the strict `set` semantics
    pub fn set_property(&self, name: impl Into<String>, value: impl Into<Variant>) {
        let name = name.into();
        let mut state = self.state();
        state.failing.remove(&name);
        state.properties.insert(name, value.into());
    }

    /// Current value of a property, if defined
    pub fn property(&self, name: &str) -> Option<Variant> {
        self.state().properties.get(name).cloned()
    }

    pub fn remove_property(&self, name: &str) -> Option<Variant> {
        self.state().properties.remove(name)
    }

    /// Reads of `name` fail with `error` until the property is set through `set_property`
    pub fn fail_property(&self, name: impl Into<String>, error: DispatchError) {
        self.state().failing.insert(name.into(), error);
    }

    pub fn add_method<F>(&self, name: impl Into<String>, body: F)
    where
        F: Fn(&[Variant]) -> Result<Variant> + Send + Sync + 'static,
    {
        self.state().methods.insert(name.into(), Arc::new(body));
    }

    pub fn push_element(&self, element: RemoteHandle) {
        self.state().elements.push(element);
    }

    /// Remove an element by identity; returns whether it was present
    pub fn remove_element(&self, element: &RemoteHandle) -> bool {
        let mut state = self.state();
        let before = state.elements.len();
        state.elements.retain(|e| !same_object(e, element));
        state.elements.len() != before
    }

    pub fn element_count(&self) -> usize {
        self.state().elements.len()
    }

    /// Names flagged as methods so far, sorted
    pub fn flagged(&self) -> Vec<String> {
        self.state().flagged.iter().cloned().collect()
    }

    pub fn is_flagged(&self, name: &str) -> bool {
        self.state().flagged.contains(name)
    }

    /// Simulate the host process going away
    pub fn disconnect(&self) {
        self.state().disconnected = true;
    }

    fn live(&self) -> Result<MutexGuard<'_, StubState>> {
        let state = self.state();
        if state.disconnected {
            return Err(DispatchError::Disconnected);
        }
        Ok(state)
    }
}

impl RemoteObject for StubObject {
    fn describe(&self) -> String {
        self.class.clone()
    }

    fn binding_mode(&self) -> BindingMode {
        self.binding
    }

    fn get(&self, name: &str) -> Result<Variant> {
        trace!("stub {} get {}", self.class, name);
        let state = self.live()?;
        if let Some(error) = state.failing.get(name) {
            return Err(error.clone());
        }
        state
            .properties
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::unknown_name(name))
    }

    fn set(&self, name: &str, value: Variant) -> Result<()> {
        trace!("stub {} set {}", self.class, name);
        let mut state = self.live()?;
        match state.properties.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(DispatchError::unknown_name(name)),
        }
    }

    fn invoke(&self, name: &str, args: &[Variant]) -> Result<Variant> {
        trace!("stub {} invoke {} ({} args)", self.class, name, args.len());
        // Release the lock before running the body; it may call back into this object
        let body = self
            .live()?
            .methods
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::unknown_name(name))?;
        body(args)
    }

    fn flag_as_method(&self, name: &str) -> Result<()> {
        let mut state = self.live()?;
        if self.binding == BindingMode::Reflective {
            return Ok(());
        }
        if !state.methods.contains_key(name) {
            return Err(DispatchError::unknown_name(name));
        }
        state.flagged.insert(name.to_string());
        Ok(())
    }

    fn item(&self, index: i64) -> Result<RemoteHandle> {
        let state = self.live()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| state.elements.get(i).cloned())
            .ok_or_else(|| DispatchError::Invocation {
                code: DISP_E_BADINDEX,
                description: "Invalid index".to_string(),
            })
    }

    fn item_by_name(&self, name: &str) -> Result<RemoteHandle> {
        let elements = self.live()?.elements.clone();
        for element in elements {
            if let Ok(Variant::Str(candidate)) = element.get("name") {
                if candidate == name {
                    return Ok(element);
                }
            }
        }
        Err(DispatchError::Invocation {
            code: DISP_E_BADINDEX,
            description: "No such element".to_string(),
        })
    }

    fn elements(&self) -> Result<Vec<RemoteHandle>> {
        Ok(self.live()?.elements.clone())
    }
}

/// Program-identifier registry backed by factories
#[derive(Default)]
pub struct StubConnector {
    programs: Mutex<HashMap<String, StubFactory>>,
    attempts: Mutex<Vec<String>>,
}

impl StubConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory; every `create` call gets a fresh object
    pub fn with_program<F>(self, program_id: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> RemoteHandle + Send + Sync + 'static,
    {
        self.register(program_id, factory);
        self
    }

    /// Register a single existing object under an identifier
    pub fn with_object(self, program_id: impl Into<String>, object: RemoteHandle) -> Self {
        self.with_program(program_id, move || object.clone())
    }

    pub fn register<F>(&self, program_id: impl Into<String>, factory: F)
    where
        F: Fn() -> RemoteHandle + Send + Sync + 'static,
    {
        self.programs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(program_id.into(), Arc::new(factory));
    }

    /// Every identifier `create` was called with, in call order
    pub fn attempts(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Connector for StubConnector {
    fn create(&self, program_id: &str) -> Result<RemoteHandle> {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(program_id.to_string());

        let factory = self
            .programs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(program_id)
            .cloned();

        match factory {
            Some(factory) => Ok(factory()),
            None => Err(DispatchError::Create {
                program_id: program_id.to_string(),
                reason: "class not registered".to_string(),
            }),
        }
    }
}
