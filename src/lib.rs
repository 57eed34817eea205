/*!
 * psbridge - Photoshop automation bridge
 *
 * Typed wrappers over the host application's automation object model:
 * - Versioned connection resolution with a per-session cache
 * - Method flagging for dynamically bound handles
 * - Pass-through access to any member the wrappers do not declare
 * - Live collections with 0-origin indexing and runtime element classification
 * - Parent resolution for layers (document or layer set)
 *
 * The platform connector is pluggable; `psbridge_dispatch::stub` provides an in-memory one.
 */

pub mod collection;
pub mod config;
pub mod error;
pub mod flagging;
pub mod install;
pub mod logging;
pub mod model;
pub mod parent;
pub mod probe;
pub mod proxy;
pub mod session;
pub mod version;

// Re-export commonly used types
pub use collection::{Collection, Member, Members};
pub use config::{AutomationConfig, LogLevel};
pub use error::{AutomationError, ErrorCategory, Result};
pub use model::{
    Application, ArtLayer, ArtLayers, BmpSaveOptions, Channel, Channels, Document, Documents,
    Layer, LayerComp, LayerCompOptions, LayerComps, LayerSet, LayerSets, Layers, MeasurementLog,
    NewDocument, Notifier, Notifiers,
};
pub use parent::Container;
pub use proxy::{Proxy, RemoteClass, TopLevel, Wrapper};
pub use session::{ConnectMode, Session};
pub use version::VersionToken;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
