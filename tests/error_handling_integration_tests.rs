/*!
 * Integration tests for error handling
 *
 * Verifies how protocol failures surface through the wrappers: which ones are
 * suppressed, which become lookup errors and which propagate as operation errors.
 */

use std::sync::Arc;

use psbridge::install::StaticInstallIndex;
use psbridge::{
    ArtLayer, AutomationConfig, AutomationError, ErrorCategory, LayerSet, Layers, RemoteClass,
    Session,
};
use psbridge_dispatch::stub::{StubConnector, StubObject};
use psbridge_dispatch::{DispatchError, RemoteHandle, Variant};

fn session() -> Arc<Session> {
    let connector = StubConnector::new().with_program("Photoshop.Application.180", || {
        StubObject::new("Application").into_handle()
    });
    Session::new(
        Arc::new(connector),
        Box::new(StaticInstallIndex::new(["180.0"])),
        AutomationConfig::default(),
    )
}

fn failing_delete(class: &str) -> Arc<StubObject> {
    StubObject::new(class)
        .with_property("name", "Layer 1")
        .with_method("delete", |_| {
            Err(DispatchError::invocation("General Photoshop error"))
        })
        .into_shared()
}

#[test]
fn test_art_layer_delete_failure_is_suppressed() {
    let session = session();
    let remote = failing_delete("ArtLayer");

    let layer = ArtLayer::attach(&session, remote as RemoteHandle).unwrap();

    assert!(layer.remove().is_ok());
}

#[test]
fn test_layer_set_delete_failure_propagates() {
    let session = session();
    let remote = failing_delete("LayerSet");

    let group = LayerSet::attach(&session, remote as RemoteHandle).unwrap();
    let err = group.remove().unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Remote);
    assert!(err.to_string().contains("General Photoshop error"));
}

#[test]
fn test_disconnected_collection_is_not_an_index_error() {
    let session = session();
    let remote = StubObject::new("Layers")
        .with_element(StubObject::new("ArtLayer").with_property("kind", 1).into_handle())
        .into_shared();
    let layers = Layers::attach(&session, remote.clone() as RemoteHandle).unwrap();

    remote.disconnect();
    let err = layers.item(0).unwrap_err();

    assert!(matches!(err, AutomationError::Operation { .. }));
    assert!(err.to_string().contains("disconnected"));
}

#[test]
fn test_wrong_value_shape_is_an_operation_error() {
    let session = session();
    let remote = StubObject::new("ArtLayer")
        .with_property("name", 42)
        .into_shared();
    let layer = ArtLayer::attach(&session, remote as RemoteHandle).unwrap();

    let err = layer.name().unwrap_err();

    match err {
        AutomationError::Operation { member, diagnostic } => {
            assert_eq!(member, "name");
            assert!(diagnostic.contains("Type mismatch"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_remote_failure_keeps_description() {
    let session = session();
    let remote = StubObject::new("ArtLayer")
        .with_method("rasterize", |_| {
            Err(DispatchError::invocation("The layer is locked"))
        })
        .into_shared();
    let layer = ArtLayer::attach(&session, remote as RemoteHandle).unwrap();

    let err = layer.rasterize(1).unwrap_err();

    assert!(!err.is_fatal());
    assert!(err.to_string().contains("rasterize"));
    assert!(err.to_string().contains("The layer is locked"));
}

#[test]
fn test_remove_all_continues_past_failures() {
    let session = session();
    let removed = StubObject::new("ArtLayer")
        .with_method("delete", |_| Ok(Variant::Empty))
        .into_shared();
    let remote = StubObject::new("Layers")
        .with_element(failing_delete("ArtLayer") as RemoteHandle)
        .with_element(removed.clone() as RemoteHandle)
        .into_shared();
    let layers = Layers::attach(&session, remote as RemoteHandle).unwrap();

    assert!(layers.remove_all().is_ok());
}

#[test]
fn test_error_categories() {
    let lookup = AutomationError::NotFound {
        kind: "layer",
        name: "missing".to_string(),
    };
    let index = AutomationError::Index {
        kind: "layer",
        index: 3,
    };
    let remote = AutomationError::operation("opacity", DispatchError::Disconnected);

    assert_eq!(lookup.category(), ErrorCategory::Lookup);
    assert_eq!(index.category(), ErrorCategory::Lookup);
    assert_eq!(remote.category(), ErrorCategory::Remote);
    assert_eq!(remote.category().to_string(), "remote");
}
