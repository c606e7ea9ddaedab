use postmill_engine::{
    build_document, clean_body, extract_metadata, validate_slug, MetadataError, RawPost, SlugError,
};
use pretty_assertions::assert_eq;

fn raw_post() -> RawPost {
    RawPost {
        slug: Some("hello-world".to_string()),
        title: Some("Hello, World".to_string()),
        published_at: Some("2024-01-15T10:30:00Z".to_string()),
        description: Some("A first post".to_string()),
        body: Some("Some *markdown* body".to_string()),
        cover_image: None,
        tags: Some(vec!["intro".to_string(), "meta".to_string()]),
    }
}

#[test]
fn extracts_complete_metadata() {
    let meta = extract_metadata(&raw_post(), 1).unwrap();
    assert_eq!(meta.slug, "hello-world");
    assert_eq!(meta.title, "Hello, World");
    assert_eq!(meta.description, "A first post");
    assert_eq!(meta.tags, vec!["intro", "meta"]);
}

#[test]
fn each_required_field_is_enforced() {
    for field in ["slug", "title", "published_at", "body"] {
        let mut raw = raw_post();
        match field {
            "slug" => raw.slug = None,
            "title" => raw.title = Some("   ".to_string()),
            "published_at" => raw.published_at = None,
            "body" => raw.body = Some(String::new()),
            _ => unreachable!(),
        }
        let err = extract_metadata(&raw, 3).unwrap_err();
        assert_eq!(
            err,
            MetadataError::MissingField { index: 3, field },
            "field {field}"
        );
    }
}

#[test]
fn malformed_timestamp_is_rejected_with_context() {
    let mut raw = raw_post();
    raw.published_at = Some("January 15th".to_string());
    let err = extract_metadata(&raw, 2).unwrap_err();
    assert_eq!(
        err,
        MetadataError::InvalidTimestamp {
            index: 2,
            slug: "hello-world".to_string(),
            value: "January 15th".to_string(),
        }
    );
    assert!(err.to_string().contains("January 15th"));
}

#[test]
fn optional_fields_default_cleanly() {
    let raw = RawPost {
        slug: Some("bare".to_string()),
        title: Some("Bare".to_string()),
        published_at: Some("2024-01-15T10:30:00Z".to_string()),
        body: Some("text".to_string()),
        ..RawPost::default()
    };
    let meta = extract_metadata(&raw, 1).unwrap();
    assert_eq!(meta.description, "");
    assert_eq!(meta.cover_image, None);
    assert!(meta.tags.is_empty());
}

#[test]
fn cleanup_normalizes_line_endings_and_blank_runs() {
    let raw = "\u{feff}First line\r\n\r\n\r\n\r\nSecond line   \r\nThird\n\n\n";
    assert_eq!(clean_body(raw), "First line\n\nSecond line\nThird\n");
}

#[test]
fn cleanup_preserves_image_references() {
    let raw = "![img](https://substackcdn.com/image/abc12345-aaaa-bbbb-cccc-0123456789ab.png)\n";
    assert_eq!(clean_body(raw), raw);
}

#[test]
fn cleanup_is_deterministic() {
    let raw = "a\r\n\r\nb";
    assert_eq!(clean_body(raw), clean_body(&clean_body(raw)));
}

#[test]
fn document_carries_frontmatter_then_body() {
    let meta = extract_metadata(&raw_post(), 1).unwrap();
    let doc = build_document(&meta, "Body text\n");
    let expected = "---\n\
        title: \"Hello, World\"\n\
        date: 2024-01-15T10:30:00Z\n\
        description: \"A first post\"\n\
        tags:\n  - \"intro\"\n  - \"meta\"\n\
        ---\n\nBody text\n";
    assert_eq!(doc, expected);
}

#[test]
fn frontmatter_escapes_quotes_and_drops_empty_fields() {
    let raw = RawPost {
        slug: Some("quoting".to_string()),
        title: Some("She said \"hi\"".to_string()),
        published_at: Some("2024-01-15T10:30:00+02:00".to_string()),
        body: Some("text".to_string()),
        ..RawPost::default()
    };
    let meta = extract_metadata(&raw, 1).unwrap();
    let doc = build_document(&meta, "text");
    assert!(doc.contains(r#"title: "She said \"hi\"""#));
    assert!(doc.contains("date: 2024-01-15T10:30:00+02:00"));
    assert!(!doc.contains("description:"));
    assert!(!doc.contains("tags:"));
}

#[test]
fn frontmatter_keeps_cover_image_url() {
    let raw = RawPost {
        cover_image: Some("https://substackcdn.com/image/cover.png".to_string()),
        ..raw_post()
    };
    let meta = extract_metadata(&raw, 1).unwrap();
    let doc = build_document(&meta, "text");
    assert!(doc.contains("cover_image: https://substackcdn.com/image/cover.png"));
}

#[test]
fn safe_slugs_pass_validation() {
    for slug in ["hello-world", "2024-notes", "a_b.c", "UPPER-case"] {
        assert_eq!(validate_slug(slug), Ok(()), "slug {slug:?}");
    }
}

#[test]
fn unsafe_slugs_are_rejected() {
    assert_eq!(validate_slug(""), Err(SlugError::Empty));
    assert_eq!(
        validate_slug("a/b"),
        Err(SlugError::Separator("a/b".to_string()))
    );
    assert_eq!(
        validate_slug("a\\b"),
        Err(SlugError::Separator("a\\b".to_string()))
    );
    assert_eq!(validate_slug(".."), Err(SlugError::Traversal("..".to_string())));
    assert_eq!(
        validate_slug("a:b"),
        Err(SlugError::ForbiddenChar("a:b".to_string()))
    );
    assert_eq!(
        validate_slug("CON.md"),
        Err(SlugError::Reserved("CON.md".to_string()))
    );
}
