/*!
 * Object model wrappers
 *
 * Each wrapper declares the typed surface it knows about; anything else is reachable
 * through [`Wrapper`](crate::proxy::Wrapper) by name.
 */

pub mod application;
pub mod art_layer;
pub mod channel;
pub mod document;
pub mod layer;
pub mod layer_comp;
pub mod layer_set;
pub mod measurement_log;
pub mod notifier;
pub mod save_options;

pub use application::Application;
pub use art_layer::{ArtLayer, ArtLayers};
pub use channel::{Channel, Channels};
pub use document::{Document, Documents, NewDocument};
pub use layer::{Layer, Layers};
pub use layer_comp::{LayerComp, LayerCompOptions, LayerComps};
pub use layer_set::{LayerSet, LayerSets};
pub use measurement_log::MeasurementLog;
pub use notifier::{Notifier, Notifiers};
pub use save_options::BmpSaveOptions;

use crate::proxy::Wrapper;
use psbridge_dispatch::Variant;

/// Pass another wrapper's remote object as an argument
pub(crate) fn object_arg(wrapper: &dyn Wrapper) -> Variant {
    Variant::Object(wrapper.handle().clone())
}

/// Optional wrapper argument; absent arguments go over the wire empty
pub(crate) fn optional_object_arg(wrapper: Option<&dyn Wrapper>) -> Variant {
    wrapper.map(object_arg).unwrap_or_default()
}
