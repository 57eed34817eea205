/*!
 * Parent resolution for layers and layer collections
 *
 * A layer's container is either a document or a layer set, and the host hands back the
 * same opaque handle for both. Only documents answer `path`; a layer set either lacks the
 * member or rejects the read.
 */

use crate::error::Result;
use crate::model::{Document, LayerSet};
use crate::probe;
use crate::proxy::{Proxy, RemoteClass, Wrapper};
use crate::session::Session;
use psbridge_dispatch::RemoteHandle;
use std::sync::Arc;

/// Member only a document exposes
pub const DOCUMENT_PROBE: &str = "path";

/// The object that contains a layer
#[derive(Debug, Clone)]
pub enum Container {
    Document(Document),
    LayerSet(LayerSet),
}

impl Container {
    /// Classify an already-fetched container handle
    pub fn classify(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
        probe::classify(
            handle,
            DOCUMENT_PROBE,
            probe::rejected,
            |h| Document::attach(session, h).map(Container::Document),
            |h| LayerSet::attach(session, h).map(Container::LayerSet),
        )
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Container::Document(_))
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Container::Document(document) => Some(document),
            Container::LayerSet(_) => None,
        }
    }

    pub fn as_layer_set(&self) -> Option<&LayerSet> {
        match self {
            Container::LayerSet(layer_set) => Some(layer_set),
            Container::Document(_) => None,
        }
    }

    pub fn name(&self) -> Result<String> {
        match self {
            Container::Document(document) => document.name(),
            Container::LayerSet(layer_set) => layer_set.name(),
        }
    }
}

impl Wrapper for Container {
    fn proxy(&self) -> &Proxy {
        match self {
            Container::Document(document) => document.proxy(),
            Container::LayerSet(layer_set) => layer_set.proxy(),
        }
    }
}

/// Read `child.parent` and classify it
pub fn resolve_parent(proxy: &Proxy) -> Result<Container> {
    let parent = proxy.read_object("parent")?;
    Container::classify(proxy.session(), parent)
}
