//! Behaviour every `CadEngine` must share, checked against both engines.

use std::path::{Path, PathBuf};

use cad_engine::primitives::{make_box, write_step};
use cad_engine::{CadEngine, DocumentSession, EngineError, MockEngine, TruckEngine};

// ── Contract ─────────────────────────────────────────────────────────────

/// `source` must hold exactly one unit box.
fn check_contract(engine: &mut dyn CadEngine, source: &Path) {
    // Names are exclusive while a document is open.
    let doc = engine.open_document(source, "doc").unwrap();
    assert!(matches!(
        engine.open_document(source, "doc"),
        Err(EngineError::DuplicateDocument { .. })
    ));
    assert_eq!(engine.open_documents(), vec!["doc".to_string()]);

    let shapes: Vec<_> = engine
        .objects(&doc)
        .unwrap()
        .into_iter()
        .filter_map(|o| o.shape)
        .collect();
    assert_eq!(shapes.len(), 1);
    assert!(matches!(
        engine.make_compound(&doc, &[]),
        Err(EngineError::EmptyCompound)
    ));

    let mesh = engine.tessellate(&shapes[0], 0.1).unwrap();
    assert!(mesh.validate().is_ok());
    assert!(mesh.has_normals());
    let size = mesh.bounds().unwrap().size();
    for extent in size {
        assert!((extent - 1.0).abs() < 1e-6, "size {size:?}");
    }

    // Closing invalidates the handle and its shapes; the name is free again.
    engine.close_document(&doc).unwrap();
    assert!(engine.open_documents().is_empty());
    assert!(matches!(
        engine.close_document(&doc),
        Err(EngineError::DocumentNotFound { .. })
    ));
    assert!(engine.objects(&doc).is_err());
    assert!(engine.tessellate(&shapes[0], 0.1).is_err());
    let again = engine.open_document(source, "doc").unwrap();
    engine.close_document(&again).unwrap();
}

/// A session dropped halfway leaves no document behind.
fn check_session_cleanup(engine: &mut dyn CadEngine, source: &Path) {
    {
        let mut session = DocumentSession::open(engine, source, "scoped").unwrap();
        let shape = session.merged_shape().unwrap().unwrap();
        assert!(session.tessellate(&shape, f64::NAN).is_err());
    }
    assert!(engine.open_documents().is_empty());

    assert!(DocumentSession::open(engine, Path::new("missing.step"), "scoped").is_err());
    assert!(engine.open_documents().is_empty());
}

// ── Engines ──────────────────────────────────────────────────────────────

fn truck_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("unit_box.step");
    write_step(&make_box([0.0; 3], [1.0; 3]), &path).unwrap();
    path
}

#[test]
fn mock_engine_honours_contract() {
    let source = Path::new("unit_box.step");
    let mut engine = MockEngine::new().with_box(source, [0.0; 3], [1.0; 3]);
    check_contract(&mut engine, source);
    check_session_cleanup(&mut engine, source);
}

#[test]
fn truck_engine_honours_contract() {
    let dir = tempfile::tempdir().unwrap();
    let source = truck_fixture(dir.path());
    let mut engine = TruckEngine::new();
    check_contract(&mut engine, &source);
    check_session_cleanup(&mut engine, &source);
}
