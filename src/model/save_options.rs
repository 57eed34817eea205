/*!
 * Save-format option objects
 *
 * Option objects are top-level host classes of their own, created fresh through the
 * session at the version the application connected with.
 */

use crate::error::Result;
use crate::proxy::{properties, Proxy, RemoteClass, TopLevel, Wrapper};
use crate::session::Session;
use std::sync::Arc;

/// Options for saving a document as BMP
#[derive(Debug, Clone)]
pub struct BmpSaveOptions {
    proxy: Proxy,
}

impl BmpSaveOptions {
    /// Create a new options object on the host
    pub fn new(session: &Arc<Session>) -> Result<Self> {
        Self::connect(session, None)
    }

    properties! {
        /// Whether to save the alpha channels
        "alphaChannels" => alpha_channels, set_alpha_channels: bool;
        /// Bits per pixel as the host's raw enumeration value
        "depth" => depth, set_depth: i64;
        "flipRowOrder" => flip_row_order, set_flip_row_order: bool;
        "osType" => os_type, set_os_type: i64;
        "rleCompression" => rle_compression, set_rle_compression: bool;
    }
}

impl Wrapper for BmpSaveOptions {
    fn proxy(&self) -> &Proxy {
        &self.proxy
    }
}

impl RemoteClass for BmpSaveOptions {
    const OBJECT_CLASS: &'static str = "BMPSaveOptions";

    fn from_proxy(proxy: Proxy) -> Self {
        Self { proxy }
    }
}

impl TopLevel for BmpSaveOptions {}
