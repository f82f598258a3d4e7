//! 注册表集成测试：外部后端注册、未注册名称、构造失败

mod common;

use common::MockParser;
use dftio::parsers::ParserRegistry;
use dftio::{DftioError, Parser, Result, Root, Sources};
use std::path::PathBuf;

fn mock(sources: Sources) -> Result<Box<dyn Parser>> {
    let mut parser = MockParser::new(sources.len(), 1);
    parser.with_basis = false;
    Ok(Box::new(parser))
}

#[test]
fn test_register_external_backend() {
    let mut registry = ParserRegistry::with_defaults();
    registry.register("mock", mock).unwrap();
    assert_eq!(registry.names(), vec!["mock", "vasp"]);

    let root = Root::from(vec![PathBuf::from("a"), PathBuf::from("b")]);
    let parser = registry.build("mock", root, "").unwrap();
    assert_eq!(parser.len(), 2);
    assert_eq!(parser.name(), "mock");
    assert_eq!(parser.formula(1).unwrap(), "Si2");
}

#[test]
fn test_unregistered_backend_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ParserRegistry::with_defaults();

    let err = registry
        .build("siesta", Root::from(dir.path()), "")
        .err()
        .unwrap();
    assert!(matches!(err, DftioError::UnsupportedParser { ref name, .. } if name == "siesta"));
    assert!(err.to_string().contains("siesta"));
    assert!(err.to_string().contains("vasp"));
    assert!(common::entries(dir.path()).is_empty());
}

#[test]
fn test_duplicate_registration() {
    let mut registry = ParserRegistry::new();
    registry.register("mock", mock).unwrap();
    assert!(matches!(
        registry.register("mock", mock),
        Err(DftioError::DuplicateParser(_))
    ));
}

#[test]
fn test_missing_root_directory() {
    let registry = ParserRegistry::with_defaults();
    let err = registry
        .build("vasp", Root::from(PathBuf::from("/no/such/dir").as_path()), "")
        .err()
        .unwrap();
    assert!(matches!(err, DftioError::DirectoryNotFound { .. }));
}
