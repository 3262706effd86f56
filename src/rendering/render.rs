use crate::db::models::DOCUMENTS_COLLECTION;
use crate::rendering::html::{escape_html, to_html, Element, RenderNode};
use crate::rendering::links::LinkResolver;
use crate::rendering::richtext::{
    LinkNode, LinkType, ListType, RichTextDocument, RichTextNode, TextFormat, TextNode,
    UploadNode, UploadValue,
};

/// Class applied to both list kinds, matching the site stylesheet.
const LIST_CLASS: &str = "list-disc mb-4 pl-8";
const DOWNLOAD_LINK_CLASS: &str = "download-link";

/// Inline wrappers in priority order. Only the first one whose flag is set
/// on a text run is applied, even if the run carries several flags.
const TEXT_WRAPPERS: [(TextFormat, &str, Option<&str>); 7] = [
    (TextFormat::BOLD, "strong", None),
    (TextFormat::ITALIC, "em", None),
    (TextFormat::STRIKETHROUGH, "span", Some("line-through")),
    (TextFormat::UNDERLINE, "span", Some("underline")),
    (TextFormat::CODE, "code", None),
    (TextFormat::SUBSCRIPT, "sub", None),
    (TextFormat::SUPERSCRIPT, "sup", None),
];

/// Render a sequence of rich-text nodes.
///
/// `None` entries are skipped, and node kinds that render to nothing
/// (unknown kinds, uploads without a URL) are dropped from the output.
/// Never fails: unsupported input degrades node by node.
pub fn render(nodes: &[Option<RichTextNode>], resolver: &dyn LinkResolver) -> Vec<RenderNode> {
    nodes
        .iter()
        .flatten()
        .filter_map(|node| render_node(node, resolver))
        .collect()
}

/// Render a whole editor document.
pub fn render_document(doc: &RichTextDocument, resolver: &dyn LinkResolver) -> Vec<RenderNode> {
    render(&doc.root.children, resolver)
}

/// Render a whole editor document straight to an HTML fragment.
pub fn render_document_html(doc: &RichTextDocument, resolver: &dyn LinkResolver) -> String {
    to_html(&render_document(doc, resolver))
}

fn render_node(node: &RichTextNode, resolver: &dyn LinkResolver) -> Option<RenderNode> {
    match node {
        RichTextNode::Text(text) => Some(render_text(text)),
        RichTextNode::LineBreak => Some(RenderNode::LineBreak),
        RichTextNode::Link(link) => Some(render_link(link, resolver)),
        RichTextNode::List(list) => {
            let tag = match list.list_type {
                ListType::Bullet => "ul",
                ListType::Number | ListType::Check => "ol",
            };
            Some(
                Element::new(tag)
                    .attr("class", LIST_CLASS)
                    .children(render(&list.children, resolver))
                    .into(),
            )
        }
        RichTextNode::ListItem(item) => {
            Some(Element::new("li").children(render(&item.children, resolver)).into())
        }
        RichTextNode::Heading(heading) => Some(
            Element::new(heading.tag.as_str())
                .children(render(&heading.children, resolver))
                .into(),
        ),
        RichTextNode::Paragraph(paragraph) => {
            Some(Element::new("p").children(render(&paragraph.children, resolver)).into())
        }
        RichTextNode::Upload(upload) => render_upload(upload),
        RichTextNode::Unknown(_) => {
            tracing::warn!(kind = node.kind(), "skipping unsupported rich-text node");
            None
        }
    }
}

fn render_text(node: &TextNode) -> RenderNode {
    let text = RenderNode::Text(escape_html(&node.text));

    match TEXT_WRAPPERS
        .iter()
        .find(|(flag, _, _)| node.format.contains(*flag))
    {
        Some((_, tag, class)) => {
            let mut element = Element::new(*tag);
            if let Some(class) = class {
                element = element.attr("class", *class);
            }
            element.child(text).into()
        }
        None => text,
    }
}

fn render_link(link: &LinkNode, resolver: &dyn LinkResolver) -> RenderNode {
    let fields = &link.fields;
    let href = match (fields.link_type, &fields.doc) {
        (LinkType::Internal, Some(doc)) => resolver.resolve_document_url(doc),
        _ => fields.url.clone().unwrap_or_default(),
    };

    let mut anchor = Element::new("a").attr("href", href);
    if fields.new_tab {
        anchor = anchor.attr("target", "_blank");
    }
    anchor.children(render(&link.children, resolver)).into()
}

fn render_upload(upload: &UploadNode) -> Option<RenderNode> {
    if upload.relation_to != DOCUMENTS_COLLECTION {
        tracing::debug!(relation_to = %upload.relation_to, "upload from unsupported collection");
        return None;
    }

    let asset = match &upload.value {
        UploadValue::Populated(asset) => asset,
        UploadValue::Reference(_) => {
            tracing::debug!("upload reference was not populated, skipping");
            return None;
        }
    };

    let url = asset.url.as_deref().filter(|url| !url.is_empty())?;
    Some(
        Element::new("a")
            .flag("download")
            .attr("href", url)
            .attr("class", DOWNLOAD_LINK_CLASS)
            .child(
                Element::new("span")
                    .child(RenderNode::Text(escape_html(&asset.filename)))
                    .into(),
            )
            .into(),
    )
}
