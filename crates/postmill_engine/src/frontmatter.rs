use chrono::SecondsFormat;

use crate::metadata::PostMeta;

/// Assemble the final document: a YAML frontmatter block followed by the
/// localized body.
pub fn build_document(meta: &PostMeta, body: &str) -> String {
    let mut frontmatter = String::new();
    frontmatter.push_str("---\n");
    frontmatter.push_str(&format!("title: \"{}\"\n", escape(&meta.title)));
    frontmatter.push_str(&format!(
        "date: {}\n",
        meta.published_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    if !meta.description.is_empty() {
        frontmatter.push_str(&format!("description: \"{}\"\n", escape(&meta.description)));
    }
    if let Some(cover) = &meta.cover_image {
        frontmatter.push_str(&format!("cover_image: {cover}\n"));
    }
    if !meta.tags.is_empty() {
        frontmatter.push_str("tags:\n");
        for tag in &meta.tags {
            frontmatter.push_str(&format!("  - \"{}\"\n", escape(tag)));
        }
    }
    frontmatter.push_str("---\n\n");

    format!("{frontmatter}{body}")
}

// Double-quoted YAML scalar escaping; newlines become spaces since titles
// and descriptions are single-line fields.
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\n', '\r'], " ")
}
