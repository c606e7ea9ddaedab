use std::fs;

use postmill_engine::{
    ensure_output_dir, write_document, AtomicFileWriter, OutputLayout, PersistError,
};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_and_is_atomic() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("doc.md", "hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "doc.md");
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    // Replace existing
    let second = writer.write("doc.md", "world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("doc.md", "data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("doc.md").exists());
}

#[test]
fn nested_layout_writes_index_under_slug_dir() {
    let temp = TempDir::new().unwrap();
    let path = write_document(temp.path(), "hello-world", &OutputLayout::Nested, "md", "content")
        .unwrap();
    assert_eq!(path, temp.path().join("hello-world").join("index.md"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "content");
}

#[test]
fn flat_layout_writes_slug_file() {
    let temp = TempDir::new().unwrap();
    let layout = OutputLayout::flat_default();
    let path = write_document(temp.path(), "hello-world", &layout, "md", "content").unwrap();
    assert_eq!(path, temp.path().join("hello-world.md"));
}

#[test]
fn rejects_unsafe_slugs() {
    let temp = TempDir::new().unwrap();
    for slug in ["../evil", "a/b", "a\\b", "..", ""] {
        let result = write_document(temp.path(), slug, &OutputLayout::Nested, "md", "x");
        assert!(
            matches!(result, Err(PersistError::UnsafeSlug(_))),
            "slug {slug:?} was accepted"
        );
    }
    assert!(!temp.path().join("..").join("evil").exists());
}

#[test]
fn existence_check_mirrors_layout() {
    let temp = TempDir::new().unwrap();
    let nested = OutputLayout::Nested;
    let flat = OutputLayout::flat_default();

    assert!(!nested.is_converted(temp.path(), "post", "md"));
    assert!(!flat.is_converted(temp.path(), "post", "md"));

    write_document(temp.path(), "post", &nested, "md", "x").unwrap();
    assert!(nested.is_converted(temp.path(), "post", "md"));
    // Flat mode keys on the file, which nested mode did not create.
    assert!(!flat.is_converted(temp.path(), "post", "md"));

    write_document(temp.path(), "post", &flat, "md", "x").unwrap();
    assert!(flat.is_converted(temp.path(), "post", "md"));
}
