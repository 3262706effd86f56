use serde_json::Value;

use crate::rendering::richtext::DocumentReference;

/// Placeholder URL for internal links whose target cannot be resolved.
pub const UNRESOLVED_LINK: &str = "#";

/// Resolves the URL of a record referenced by an internal rich-text link.
///
/// The renderer has no knowledge of site routing; the embedding
/// application supplies this.
pub trait LinkResolver: Send + Sync {
    fn resolve_document_url(&self, doc: &DocumentReference) -> String;
}

/// Resolver that maps every reference to [`UNRESOLVED_LINK`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderLinkResolver;

impl LinkResolver for PlaceholderLinkResolver {
    fn resolve_document_url(&self, _doc: &DocumentReference) -> String {
        UNRESOLVED_LINK.to_string()
    }
}

/// Resolver for the public site's routes.
///
/// Populated `posts` references resolve to `/posts/{slug}`. Anything else
/// (unpopulated ids, other collections, posts without a slug) falls back to
/// [`UNRESOLVED_LINK`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteLinkResolver;

impl LinkResolver for SiteLinkResolver {
    fn resolve_document_url(&self, doc: &DocumentReference) -> String {
        let slug = match (doc.relation_to.as_str(), &doc.value) {
            ("posts", Value::Object(fields)) => fields.get("slug").and_then(Value::as_str),
            _ => None,
        };

        match slug {
            Some(slug) if !slug.is_empty() => format!("/posts/{slug}"),
            _ => {
                tracing::debug!(
                    relation_to = %doc.relation_to,
                    "cannot resolve internal link target, using placeholder"
                );
                UNRESOLVED_LINK.to_string()
            }
        }
    }
}
