/*!
 * Documents and the open-documents collection
 */

use super::{object_arg, ArtLayers, Channels, Layer, LayerComps, LayerSets, Layers};
use crate::collection::{Collection, Member};
use crate::error::Result;
use crate::proxy::{properties, Proxy, RemoteClass, Wrapper};
use crate::session::Session;
use psbridge_dispatch::{RemoteHandle, Variant};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Live collection of open documents
pub type Documents = Collection<Document>;

/// An open document
#[derive(Debug, Clone)]
pub struct Document {
    proxy: Proxy,
}

impl Document {
    properties! {
        "name" => name: String;
        "width" => width: f64;
        "height" => height: f64;
        /// Pixels per inch
        "resolution" => resolution: f64;
        "saved" => saved: bool;
        "mode" => mode: i64;
        "bitsPerChannel" => bits_per_channel, set_bits_per_channel: i64;
        "info" => info: Variant;
        "quickMaskMode" => quick_mask_mode, set_quick_mask_mode: bool;
    }

    /// Folder the document was saved to
    ///
    /// The host raises an error for documents that were never saved.
    pub fn path(&self) -> Result<PathBuf> {
        self.proxy.read::<String>("path").map(PathBuf::from)
    }

    /// Full path including file name
    pub fn full_name(&self) -> Result<PathBuf> {
        self.proxy.read::<String>("fullName").map(PathBuf::from)
    }

    pub fn art_layers(&self) -> Result<ArtLayers> {
        Collection::attach(self.proxy.session(), self.proxy.read_object("artLayers")?)
    }

    pub fn layer_sets(&self) -> Result<LayerSets> {
        Collection::attach(self.proxy.session(), self.proxy.read_object("layerSets")?)
    }

    /// Top-level layers, art layers and groups alike
    pub fn layers(&self) -> Result<Layers> {
        Collection::attach(self.proxy.session(), self.proxy.read_object("layers")?)
    }

    pub fn channels(&self) -> Result<Channels> {
        Collection::attach(self.proxy.session(), self.proxy.read_object("channels")?)
    }

    pub fn layer_comps(&self) -> Result<LayerComps> {
        Collection::attach(self.proxy.session(), self.proxy.read_object("layerComps")?)
    }

    /// The selected layer
    pub fn active_layer(&self) -> Result<Layer> {
        let handle = self.proxy.read_object("activeLayer")?;
        Layer::classify(self.proxy.session(), handle)
    }

    pub fn set_active_layer(&self, layer: &dyn Wrapper) -> Result<()> {
        self.proxy.set("activeLayer", object_arg(layer))
    }

    pub fn save(&self) -> Result<()> {
        self.proxy.call("save", &[])
    }

    /// Save to `path` with a format options object
    pub fn save_as(
        &self,
        path: &Path,
        options: &dyn Wrapper,
        as_copy: bool,
        extension_type: Option<i64>,
    ) -> Result<()> {
        self.proxy.call(
            "saveAs",
            &[
                Variant::from(path.to_string_lossy().into_owned()),
                object_arg(options),
                Variant::from(as_copy),
                Variant::from(extension_type),
            ],
        )
    }

    /// Close the document; `saving` is the host's save-options enumeration value
    pub fn close(&self, saving: i64) -> Result<()> {
        self.proxy.call("close", &[Variant::from(saving)])
    }

    pub fn duplicate(&self, name: Option<&str>, merge_layers_only: bool) -> Result<Document> {
        let handle = self.proxy.invoke_object(
            "duplicate",
            &[Variant::from(name), Variant::from(merge_layers_only)],
        )?;
        Document::attach(self.proxy.session(), handle)
    }

    pub fn flatten(&self) -> Result<()> {
        self.proxy.call("flatten", &[])
    }

    pub fn merge_visible_layers(&self) -> Result<()> {
        self.proxy.call("mergeVisibleLayers", &[])
    }

    pub fn resize_canvas(&self, width: f64, height: f64, anchor: Option<i64>) -> Result<()> {
        self.proxy.call(
            "resizeCanvas",
            &[Variant::from(width), Variant::from(height), Variant::from(anchor)],
        )
    }

    pub fn resize_image(
        &self,
        width: Option<f64>,
        height: Option<f64>,
        resolution: Option<f64>,
        resample: Option<i64>,
    ) -> Result<()> {
        self.proxy.call(
            "resizeImage",
            &[
                Variant::from(width),
                Variant::from(height),
                Variant::from(resolution),
                Variant::from(resample),
            ],
        )
    }

    pub fn rotate_canvas(&self, angle: f64) -> Result<()> {
        self.proxy.call("rotateCanvas", &[Variant::from(angle)])
    }

    /// Crop to `[left, top, right, bottom]`
    pub fn crop(&self, bounds: [f64; 4]) -> Result<()> {
        self.proxy.call("crop", &[Variant::from(bounds.to_vec())])
    }

    pub fn trim(&self, trim_type: Option<i64>) -> Result<()> {
        self.proxy.call("trim", &[Variant::from(trim_type)])
    }
}

impl Wrapper for Document {
    fn proxy(&self) -> &Proxy {
        &self.proxy
    }
}

impl RemoteClass for Document {
    fn from_proxy(proxy: Proxy) -> Self {
        Self { proxy }
    }
}

impl Member for Document {
    const KIND: &'static str = "document";

    fn from_element(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
        Document::attach(session, handle)
    }
}

/// Settings for a new document
///
/// Enumerated settings are the host's raw values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewDocument {
    pub width: i64,
    pub height: i64,
    /// Pixels per inch
    pub resolution: f64,
    pub name: Option<String>,
    pub mode: i64,
    pub initial_fill: i64,
    pub pixel_aspect_ratio: f64,
    pub bits_per_channel: i64,
    pub color_profile_name: Option<String>,
}

impl Default for NewDocument {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            resolution: 72.0,
            name: None,
            // RGB
            mode: 2,
            // White
            initial_fill: 1,
            pixel_aspect_ratio: 1.0,
            // 8 bits
            bits_per_channel: 8,
            color_profile_name: None,
        }
    }
}

impl Collection<Document> {
    /// Create a document and add it to the open documents
    pub fn add(&self, options: &NewDocument) -> Result<Document> {
        self.add_with(&[
            Variant::from(options.width),
            Variant::from(options.height),
            Variant::from(options.resolution),
            Variant::from(options.name.clone()),
            Variant::from(options.mode),
            Variant::from(options.initial_fill),
            Variant::from(options.pixel_aspect_ratio),
            Variant::from(options.bits_per_channel),
            Variant::from(options.color_profile_name.clone()),
        ])
    }
}
