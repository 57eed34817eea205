/*!
 * Mixed layer collections
 *
 * A document's `layers` holds art layers and layer sets side by side. Each element is
 * classified when it is reached by probing `kind`, which only art layers expose.
 */

use super::{ArtLayer, LayerSet};
use crate::collection::{Collection, Member};
use crate::error::Result;
use crate::parent::{self, Container};
use crate::probe;
use crate::proxy::{Proxy, RemoteClass, Wrapper};
use crate::session::Session;
use psbridge_dispatch::RemoteHandle;
use std::sync::Arc;

/// Member only an art layer exposes
pub const ART_LAYER_PROBE: &str = "kind";

/// Live collection of art layers and layer sets
pub type Layers = Collection<Layer>;

/// One element of a mixed layer collection
#[derive(Debug, Clone)]
pub enum Layer {
    Art(ArtLayer),
    Set(LayerSet),
}

impl Layer {
    /// Classify a layer handle
    pub fn classify(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
        probe::classify(
            handle,
            ART_LAYER_PROBE,
            probe::unknown_name,
            |h| ArtLayer::attach(session, h).map(Layer::Art),
            |h| LayerSet::attach(session, h).map(Layer::Set),
        )
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Layer::Set(_))
    }

    pub fn as_art_layer(&self) -> Option<&ArtLayer> {
        match self {
            Layer::Art(layer) => Some(layer),
            Layer::Set(_) => None,
        }
    }

    pub fn as_layer_set(&self) -> Option<&LayerSet> {
        match self {
            Layer::Set(layer_set) => Some(layer_set),
            Layer::Art(_) => None,
        }
    }

    pub fn name(&self) -> Result<String> {
        match self {
            Layer::Art(layer) => layer.name(),
            Layer::Set(layer_set) => layer_set.name(),
        }
    }

    pub fn set_name(&self, name: String) -> Result<()> {
        match self {
            Layer::Art(layer) => layer.set_name(name),
            Layer::Set(layer_set) => layer_set.set_name(name),
        }
    }

    pub fn visible(&self) -> Result<bool> {
        match self {
            Layer::Art(layer) => layer.visible(),
            Layer::Set(layer_set) => layer_set.visible(),
        }
    }

    pub fn set_visible(&self, visible: bool) -> Result<()> {
        match self {
            Layer::Art(layer) => layer.set_visible(visible),
            Layer::Set(layer_set) => layer_set.set_visible(visible),
        }
    }

    pub fn parent(&self) -> Result<Container> {
        parent::resolve_parent(self.proxy())
    }

    /// Delete the layer; art layers tolerate the host's spurious delete failure
    pub fn remove(&self) -> Result<()> {
        match self {
            Layer::Art(layer) => layer.remove(),
            Layer::Set(layer_set) => layer_set.remove(),
        }
    }
}

impl Wrapper for Layer {
    fn proxy(&self) -> &Proxy {
        match self {
            Layer::Art(layer) => layer.proxy(),
            Layer::Set(layer_set) => layer_set.proxy(),
        }
    }
}

impl Member for Layer {
    const KIND: &'static str = "layer";

    fn from_element(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
        Layer::classify(session, handle)
    }
}

impl Collection<Layer> {
    /// Delete every layer, ignoring per-layer failures
    pub fn remove_all(&self) -> Result<()> {
        self.for_each_ignoring("delete").map(|_| ())
    }

    pub fn parent(&self) -> Result<Container> {
        parent::resolve_parent(self.proxy())
    }
}
