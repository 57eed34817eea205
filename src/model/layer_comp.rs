/*!
 * Layer comps: saved snapshots of layer state
 */

use super::Document;
use crate::collection::{Collection, Member};
use crate::error::Result;
use crate::proxy::{properties, Proxy, RemoteClass, Wrapper};
use crate::session::Session;
use psbridge_dispatch::{RemoteHandle, Variant};
use std::sync::Arc;

pub type LayerComps = Collection<LayerComp>;

#[derive(Debug, Clone)]
pub struct LayerComp {
    proxy: Proxy,
}

impl LayerComp {
    properties! {
        "name" => name, set_name: String;
        "comment" => comment, set_comment: String;
        /// Whether the comp records layer styles
        "appearance" => appearance, set_appearance: bool;
        "position" => position, set_position: bool;
        "visibility" => visibility, set_visibility: bool;
        "childLayerCompState" => child_layer_comp_state, set_child_layer_comp_state: bool;
        "selected" => selected, set_selected: bool;
    }

    pub fn parent(&self) -> Result<Document> {
        let handle = self.proxy.read_object("parent")?;
        Document::attach(self.proxy.session(), handle)
    }

    /// Apply the comp to the document
    pub fn apply(&self) -> Result<()> {
        self.proxy.call("apply", &[])
    }

    /// Record the document's current state into the comp
    pub fn recapture(&self) -> Result<()> {
        self.proxy.call("recapture", &[])
    }

    pub fn remove(&self) -> Result<()> {
        self.proxy.call("remove", &[])
    }

    /// Reset the layers to the state stored in the comp
    pub fn reset_from_comp(&self) -> Result<()> {
        self.proxy.call("resetfromComp", &[])
    }
}

impl Wrapper for LayerComp {
    fn proxy(&self) -> &Proxy {
        &self.proxy
    }
}

impl RemoteClass for LayerComp {
    fn from_proxy(proxy: Proxy) -> Self {
        Self { proxy }
    }
}

impl Member for LayerComp {
    const KIND: &'static str = "layer comp";

    fn from_element(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
        LayerComp::attach(session, handle)
    }
}

/// What a new layer comp records
#[derive(Debug, Clone, PartialEq)]
pub struct LayerCompOptions {
    pub comment: String,
    pub appearance: bool,
    pub position: bool,
    pub visibility: bool,
    pub child_layer_comp_state: bool,
}

impl Default for LayerCompOptions {
    fn default() -> Self {
        Self {
            comment: "No Comment.".to_string(),
            appearance: true,
            position: true,
            visibility: true,
            child_layer_comp_state: false,
        }
    }
}

impl Collection<LayerComp> {
    /// Record a new comp of the document's current state
    pub fn add(&self, name: &str, options: &LayerCompOptions) -> Result<LayerComp> {
        self.add_with(&[
            Variant::from(name),
            Variant::from(options.comment.as_str()),
            Variant::from(options.appearance),
            Variant::from(options.position),
            Variant::from(options.visibility),
            Variant::from(options.child_layer_comp_state),
        ])
    }

    pub fn remove_all(&self) -> Result<()> {
        self.remove_all_remote()
    }

    pub fn parent(&self) -> Result<Document> {
        let handle = self.proxy().read_object("parent")?;
        Document::attach(self.proxy().session(), handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::StaticInstallIndex;
    use crate::AutomationConfig;
    use psbridge_dispatch::stub::{StubConnector, StubObject};

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

    #[test]
    fn test_add_passes_options_in_order() {
        let remote = StubObject::new("LayerComps")
            .with_method("add", |args| {
                assert_eq!(args.len(), 6);
                assert_eq!(args[1], Variant::from("No Comment."));
                assert_eq!(args[5], Variant::from(false));
                Ok(Variant::Object(
                    StubObject::new("LayerComp")
                        .with_property("name", args[0].clone())
                        .into_handle(),
                ))
            })
            .into_handle();
        let comps: LayerComps = Collection::attach(&session(), remote).unwrap();

        let comp = comps.add("Layout A", &LayerCompOptions::default()).unwrap();
        assert_eq!(comp.name().unwrap(), "Layout A");
    }
}
