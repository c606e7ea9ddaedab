use chrono::{DateTime, FixedOffset};

use crate::export::RawPost;

/// Validated, immutable post metadata plus the raw body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMeta {
    pub slug: String,
    pub title: String,
    pub published_at: DateTime<FixedOffset>,
    pub description: String,
    pub body: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("post {index}: missing or empty required field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("post {index} ({slug}): published_at `{value}` is not a valid RFC 3339 timestamp")]
    InvalidTimestamp {
        index: usize,
        slug: String,
        value: String,
    },
}

/// Extracts and validates metadata for the post at 1-based `index`.
pub fn extract_metadata(raw: &RawPost, index: usize) -> Result<PostMeta, MetadataError> {
    let slug = required(raw.slug.as_deref(), "slug", index)?;
    let title = required(raw.title.as_deref(), "title", index)?;
    let body = required(raw.body.as_deref(), "body", index)?;
    let timestamp = required(raw.published_at.as_deref(), "published_at", index)?;

    let published_at = DateTime::parse_from_rfc3339(&timestamp).map_err(|_| {
        MetadataError::InvalidTimestamp {
            index,
            slug: slug.clone(),
            value: timestamp.clone(),
        }
    })?;

    Ok(PostMeta {
        slug,
        title,
        published_at,
        description: raw
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        body,
        cover_image: raw
            .cover_image
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
        tags: raw.tags.clone().unwrap_or_default(),
    })
}

fn required(
    value: Option<&str>,
    field: &'static str,
    index: usize,
) -> Result<String, MetadataError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(MetadataError::MissingField { index, field }),
    }
}
