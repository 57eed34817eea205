/*!
 * Layer sets (groups)
 */

use super::{object_arg, optional_object_arg, ArtLayer, ArtLayers, Layer, Layers};
use crate::collection::{Collection, Member};
use crate::error::Result;
use crate::parent::{self, Container};
use crate::proxy::{properties, Proxy, RemoteClass, Wrapper};
use crate::session::Session;
use psbridge_dispatch::{RemoteHandle, Variant};
use std::sync::Arc;

/// Live collection of layer sets
pub type LayerSets = Collection<LayerSet>;

/// A group of layers
#[derive(Debug, Clone)]
pub struct LayerSet {
    proxy: Proxy,
}

impl LayerSet {
    properties! {
        "name" => name, set_name: String;
        "visible" => visible, set_visible: bool;
        "allLocked" => all_locked, set_all_locked: bool;
        "blendMode" => blend_mode, set_blend_mode: i64;
        "bounds" => bounds: Vec<f64>;
        "enabledChannels" => enabled_channels, set_enabled_channels: Vec<f64>;
    }

    /// Master opacity, rounded to a whole percentage
    pub fn opacity(&self) -> Result<i64> {
        let raw: f64 = self.proxy.read("opacity")?;
        Ok(raw.round() as i64)
    }

    pub fn set_opacity(&self, value: f64) -> Result<()> {
        self.proxy.write("opacity", value)
    }

    pub fn art_layers(&self) -> Result<ArtLayers> {
        Collection::attach(self.proxy.session(), self.proxy.read_object("artLayers")?)
    }

    pub fn layer_sets(&self) -> Result<LayerSets> {
        Collection::attach(self.proxy.session(), self.proxy.read_object("layerSets")?)
    }

    /// All direct children, art layers and groups alike
    pub fn layers(&self) -> Result<Layers> {
        Collection::attach(self.proxy.session(), self.proxy.read_object("layers")?)
    }

    /// Number of direct children
    pub fn len(&self) -> Result<usize> {
        self.layers()?.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.layers()?.is_empty()
    }

    pub fn parent(&self) -> Result<Container> {
        parent::resolve_parent(&self.proxy)
    }

    pub fn linked_layers(&self) -> Result<Vec<Layer>> {
        let linked: Vec<RemoteHandle> = self.proxy.read("linkedLayers")?;
        linked
            .into_iter()
            .map(|handle| Layer::from_element(self.proxy.session(), handle))
            .collect()
    }

    /// Add a child: a nested group when `group` is set, otherwise an art layer
    pub fn add(&self, group: bool) -> Result<Layer> {
        if group {
            self.layer_sets()?.add().map(Layer::Set)
        } else {
            self.art_layers()?.add().map(Layer::Art)
        }
    }

    /// Flatten the group into a single art layer
    pub fn merge(&self) -> Result<ArtLayer> {
        let handle = self.proxy.invoke_object("merge", &[])?;
        ArtLayer::attach(self.proxy.session(), handle)
    }

    pub fn duplicate(
        &self,
        relative_to: Option<&dyn Wrapper>,
        placement: Option<i64>,
    ) -> Result<LayerSet> {
        let handle = self.proxy.invoke_object(
            "duplicate",
            &[optional_object_arg(relative_to), Variant::from(placement)],
        )?;
        LayerSet::attach(self.proxy.session(), handle)
    }

    pub fn move_to(&self, relative_to: &dyn Wrapper, placement: i64) -> Result<()> {
        self.proxy
            .call("move", &[object_arg(relative_to), Variant::from(placement)])
    }

    /// Delete the group and its contents
    pub fn remove(&self) -> Result<()> {
        self.proxy.call("delete", &[])
    }

    pub fn link(&self, with: &dyn Wrapper) -> Result<()> {
        self.proxy.call("link", &[object_arg(with)])
    }

    pub fn unlink(&self) -> Result<()> {
        self.proxy.call("unlink", &[])
    }

    pub fn resize(
        &self,
        horizontal: Option<f64>,
        vertical: Option<f64>,
        anchor: Option<i64>,
    ) -> Result<()> {
        self.proxy.call(
            "resize",
            &[
                Variant::from(horizontal),
                Variant::from(vertical),
                Variant::from(anchor),
            ],
        )
    }

    pub fn rotate(&self, angle: f64, anchor: Option<i64>) -> Result<()> {
        self.proxy
            .call("rotate", &[Variant::from(angle), Variant::from(anchor)])
    }

    /// Move by an offset from the current position
    pub fn translate(&self, delta_x: f64, delta_y: f64) -> Result<()> {
        self.proxy
            .call("translate", &[Variant::from(delta_x), Variant::from(delta_y)])
    }
}

impl Wrapper for LayerSet {
    fn proxy(&self) -> &Proxy {
        &self.proxy
    }
}

impl RemoteClass for LayerSet {
    fn from_proxy(proxy: Proxy) -> Self {
        Self { proxy }
    }
}

impl Member for LayerSet {
    const KIND: &'static str = "layer set";

    fn from_element(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
        LayerSet::attach(session, handle)
    }
}

impl Collection<LayerSet> {
    /// Add an empty layer set
    pub fn add(&self) -> Result<LayerSet> {
        self.add_with(&[])
    }

    pub fn remove_all(&self) -> Result<()> {
        self.remove_all_remote()
    }

    pub fn parent(&self) -> Result<Container> {
        parent::resolve_parent(self.proxy())
    }
}
