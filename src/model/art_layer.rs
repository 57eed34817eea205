/*!
 * Art layers: the pixel, text and adjustment leaves of a layer tree
 */

use super::{object_arg, optional_object_arg};
use crate::collection::{Collection, Member};
use crate::error::{AutomationError, Result};
use crate::parent::{self, Container};
use crate::proxy::{properties, Proxy, RemoteClass, Wrapper};
use crate::session::Session;
use psbridge_dispatch::{RemoteHandle, Variant};
use std::sync::Arc;
use tracing::warn;

/// Live collection of the art layers in a document or layer set
pub type ArtLayers = Collection<ArtLayer>;

/// A leaf layer
#[derive(Debug, Clone)]
pub struct ArtLayer {
    proxy: Proxy,
}

impl ArtLayer {
    properties! {
        "name" => name, set_name: String;
        "visible" => visible, set_visible: bool;
        /// Layer kind as the host's raw enumeration value
        "kind" => kind, set_kind: i64;
        "blendMode" => blend_mode, set_blend_mode: i64;
        "fillOpacity" => fill_opacity, set_fill_opacity: f64;
        /// Bounding rectangle as `[left, top, right, bottom]`
        "bounds" => bounds: Vec<f64>;
        "isBackgroundLayer" => is_background_layer, set_background_layer: bool;
        "grouped" => grouped, set_grouped: bool;
        "allLocked" => all_locked, set_all_locked: bool;
        "pixelsLocked" => pixels_locked, set_pixels_locked: bool;
        "positionLocked" => position_locked, set_position_locked: bool;
        "transparentPixelsLocked" => transparent_pixels_locked, set_transparent_pixels_locked: bool;
        "layerMaskDensity" => layer_mask_density, set_layer_mask_density: f64;
        "layerMaskFeather" => layer_mask_feather, set_layer_mask_feather: f64;
        "vectorMaskDensity" => vector_mask_density, set_vector_mask_density: f64;
        "vectorMaskFeather" => vector_mask_feather, set_vector_mask_feather: f64;
    }

    /// Master opacity, rounded to a whole percentage
    pub fn opacity(&self) -> Result<i64> {
        let raw: f64 = self.proxy.read("opacity")?;
        Ok(raw.round() as i64)
    }

    pub fn set_opacity(&self, value: f64) -> Result<()> {
        self.proxy.write("opacity", value)
    }

    /// The document or layer set holding this layer
    pub fn parent(&self) -> Result<Container> {
        parent::resolve_parent(&self.proxy)
    }

    /// Layers linked to this one
    pub fn linked_layers(&self) -> Result<Vec<ArtLayer>> {
        let linked: Vec<RemoteHandle> = self.proxy.read("linkedLayers")?;
        linked
            .into_iter()
            .map(|handle| ArtLayer::attach(self.proxy.session(), handle))
            .collect()
    }

    /// Delete the layer from its document
    ///
    /// The host reports a failure from `delete` even when the layer was removed, so the
    /// failure is logged and dropped.
    pub fn remove(&self) -> Result<()> {
        match self.proxy.call("delete", &[]) {
            Err(AutomationError::Operation { diagnostic, .. }) => {
                warn!("Ignoring delete failure on art layer: {}", diagnostic);
                Ok(())
            }
            other => other,
        }
    }

    /// Copy this layer, optionally placing it relative to another object
    pub fn duplicate(
        &self,
        relative_to: Option<&dyn Wrapper>,
        placement: Option<i64>,
    ) -> Result<ArtLayer> {
        let handle = self.proxy.invoke_object(
            "duplicate",
            &[optional_object_arg(relative_to), Variant::from(placement)],
        )?;
        ArtLayer::attach(self.proxy.session(), handle)
    }

    /// Move this layer relative to another object
    pub fn move_to(&self, relative_to: &dyn Wrapper, placement: i64) -> Result<()> {
        self.proxy
            .call("move", &[object_arg(relative_to), Variant::from(placement)])
    }

    /// Merge this layer into the one below it
    pub fn merge(&self) -> Result<ArtLayer> {
        let handle = self.proxy.invoke_object("merge", &[])?;
        ArtLayer::attach(self.proxy.session(), handle)
    }

    pub fn link(&self, with: &dyn Wrapper) -> Result<()> {
        self.proxy.call("link", &[object_arg(with)])
    }

    pub fn unlink(&self) -> Result<()> {
        self.proxy.call("unlink", &[])
    }

    pub fn invert(&self) -> Result<()> {
        self.proxy.call("invert", &[])
    }

    pub fn rasterize(&self, target: i64) -> Result<()> {
        self.proxy.call("rasterize", &[Variant::from(target)])
    }

    pub fn posterize(&self, levels: i64) -> Result<()> {
        self.proxy.call("posterize", &[Variant::from(levels)])
    }

    pub fn adjust_brightness_contrast(&self, brightness: i64, contrast: i64) -> Result<()> {
        self.proxy.call(
            "adjustBrightnessContrast",
            &[Variant::from(brightness), Variant::from(contrast)],
        )
    }

    pub fn apply_gaussian_blur(&self, radius: f64) -> Result<()> {
        self.proxy.call("applyGaussianBlur", &[Variant::from(radius)])
    }

    pub fn apply_motion_blur(&self, angle: i64, radius: f64) -> Result<()> {
        self.proxy.call(
            "applyMotionBlur",
            &[Variant::from(angle), Variant::from(radius)],
        )
    }

    pub fn apply_high_pass(&self, radius: f64) -> Result<()> {
        self.proxy.call("applyHighPass", &[Variant::from(radius)])
    }

    pub fn apply_add_noise(&self, amount: f64, distribution: i64, monochromatic: bool) -> Result<()> {
        self.proxy.call(
            "applyAddNoise",
            &[
                Variant::from(amount),
                Variant::from(distribution),
                Variant::from(monochromatic),
            ],
        )
    }

    pub fn apply_offset(&self, horizontal: i64, vertical: i64, undefined_areas: i64) -> Result<()> {
        self.proxy.call(
            "applyOffset",
            &[
                Variant::from(horizontal),
                Variant::from(vertical),
                Variant::from(undefined_areas),
            ],
        )
    }
}

impl Wrapper for ArtLayer {
    fn proxy(&self) -> &Proxy {
        &self.proxy
    }
}

impl RemoteClass for ArtLayer {
    fn from_proxy(proxy: Proxy) -> Self {
        Self { proxy }
    }
}

impl Member for ArtLayer {
    const KIND: &'static str = "art layer";

    fn from_element(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
        ArtLayer::attach(session, handle)
    }
}

impl Collection<ArtLayer> {
    /// Add an empty art layer
    pub fn add(&self) -> Result<ArtLayer> {
        self.add_with(&[])
    }

    /// Remove every art layer, ignoring per-layer failures
    pub fn remove_all(&self) -> Result<()> {
        self.for_each_ignoring("delete").map(|_| ())
    }

    /// The document or layer set holding this collection
    pub fn parent(&self) -> Result<Container> {
        parent::resolve_parent(self.proxy())
    }
}
