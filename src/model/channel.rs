/*!
 * Color and alpha channels
 */

use super::Document;
use crate::collection::{Collection, Member};
use crate::error::Result;
use crate::proxy::{properties, Proxy, RemoteClass, Wrapper};
use crate::session::Session;
use psbridge_dispatch::{RemoteHandle, Variant};
use std::sync::Arc;

/// Live collection of a document's channels
///
/// The host has no keyed access on channels; name lookups scan the current elements.
pub type Channels = Collection<Channel>;

#[derive(Debug, Clone)]
pub struct Channel {
    proxy: Proxy,
}

impl Channel {
    properties! {
        "name" => name, set_name: String;
        "visible" => visible, set_visible: bool;
        /// Component, masked-area or selected-area channel, as a raw enumeration value
        "kind" => kind, set_kind: i64;
        "opacity" => opacity, set_opacity: f64;
        /// Pixel counts per level
        "histogram" => histogram: Vec<f64>;
    }

    /// The document holding this channel
    pub fn parent(&self) -> Result<Document> {
        let handle = self.proxy.read_object("parent")?;
        Document::attach(self.proxy.session(), handle)
    }

    pub fn duplicate(&self, target: Option<&Document>) -> Result<Channel> {
        let target = target.map(|document| Variant::Object(document.handle().clone()));
        let handle = self
            .proxy
            .invoke_object("duplicate", &[target.unwrap_or_default()])?;
        Channel::attach(self.proxy.session(), handle)
    }

    /// Merge a spot channel into the component channels
    pub fn merge(&self) -> Result<()> {
        self.proxy.call("merge", &[])
    }

    pub fn remove(&self) -> Result<()> {
        self.proxy.call("remove", &[])
    }
}

impl Wrapper for Channel {
    fn proxy(&self) -> &Proxy {
        &self.proxy
    }
}

impl RemoteClass for Channel {
    fn from_proxy(proxy: Proxy) -> Self {
        Self { proxy }
    }
}

impl Member for Channel {
    const KIND: &'static str = "channel";
    const KEYED: bool = false;

    fn from_element(session: &Arc<Session>, handle: RemoteHandle) -> Result<Self> {
        Channel::attach(session, handle)
    }
}

impl Collection<Channel> {
    /// Add an alpha channel
    pub fn add(&self) -> Result<Channel> {
        self.add_with(&[])
    }

    pub fn remove_all(&self) -> Result<()> {
        self.remove_all_remote()
    }
}
