//! The rich-text document tree produced by the site's content editor.
//!
//! The wire format is the editor's serialized JSON: every node is an object
//! with a `type` tag. Known node kinds map to dedicated variants; anything
//! else is kept verbatim as [`RichTextNode::Unknown`] so stored content
//! survives a read/write cycle even when this crate cannot render it.
//! Fields this crate does not interpret (`version`, `indent`, `direction`,
//! ...) are preserved in each node's `extra` map.

use serde::de::Error as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Bit-set of inline text styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextFormat(pub u32);

impl TextFormat {
    pub const NONE: TextFormat = TextFormat(0);
    pub const BOLD: TextFormat = TextFormat(1);
    pub const ITALIC: TextFormat = TextFormat(1 << 1);
    pub const STRIKETHROUGH: TextFormat = TextFormat(1 << 2);
    pub const UNDERLINE: TextFormat = TextFormat(1 << 3);
    pub const CODE: TextFormat = TextFormat(1 << 4);
    pub const SUBSCRIPT: TextFormat = TextFormat(1 << 5);
    pub const SUPERSCRIPT: TextFormat = TextFormat(1 << 6);

    /// Returns `true` if every bit of `other` is set in `self`.
    pub fn contains(self, other: TextFormat) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TextFormat {
    type Output = TextFormat;

    fn bitor(self, rhs: TextFormat) -> TextFormat {
        TextFormat(self.0 | rhs.0)
    }
}

/// A complete editor document: a single root container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextDocument {
    pub root: RootNode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootNode {
    /// Top-level blocks. `null` entries are tolerated and skipped on render.
    #[serde(default)]
    pub children: Vec<Option<RichTextNode>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RichTextDocument {
    pub fn new(children: Vec<RichTextNode>) -> Self {
        Self {
            root: RootNode {
                children: children.into_iter().map(Some).collect(),
                extra: Map::new(),
            },
        }
    }
}

/// One node of the rich-text tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RichTextNode {
    Text(TextNode),
    LineBreak,
    Link(LinkNode),
    List(ListNode),
    ListItem(ContainerNode),
    Heading(HeadingNode),
    Paragraph(ContainerNode),
    Upload(UploadNode),
    /// A node kind this crate does not know how to render, kept as-is.
    Unknown(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub format: TextFormat,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerNode {
    #[serde(default)]
    pub children: Vec<Option<RichTextNode>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkNode {
    pub fields: LinkFields,
    #[serde(default)]
    pub children: Vec<Option<RichTextNode>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkFields {
    #[serde(default)]
    pub link_type: LinkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub new_tab: bool,
    /// Target of an internal link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<DocumentReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[default]
    Custom,
    Internal,
}

/// A relationship to another stored record.
///
/// `value` is either the bare record id or the populated record itself,
/// depending on how deeply the content was loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    pub relation_to: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNode {
    pub list_type: ListType,
    #[serde(default)]
    pub children: Vec<Option<RichTextNode>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Bullet,
    Number,
    Check,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingNode {
    pub tag: HeadingTag,
    #[serde(default)]
    pub children: Vec<Option<RichTextNode>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingTag {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingTag {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadingTag::H1 => "h1",
            HeadingTag::H2 => "h2",
            HeadingTag::H3 => "h3",
            HeadingTag::H4 => "h4",
            HeadingTag::H5 => "h5",
            HeadingTag::H6 => "h6",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadNode {
    /// Collection the referenced file belongs to (`documents`, `media`).
    pub relation_to: String,
    pub value: UploadValue,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadValue {
    Populated(UploadAsset),
    /// Unpopulated reference (usually the record id).
    Reference(Value),
}

/// The parts of a stored file an upload node needs to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadAsset {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RichTextNode {
    pub fn text(text: impl Into<String>, format: TextFormat) -> Self {
        RichTextNode::Text(TextNode {
            text: text.into(),
            format,
            extra: Map::new(),
        })
    }

    pub fn paragraph(children: Vec<RichTextNode>) -> Self {
        RichTextNode::Paragraph(ContainerNode::new(children))
    }

    pub fn heading(tag: HeadingTag, children: Vec<RichTextNode>) -> Self {
        RichTextNode::Heading(HeadingNode {
            tag,
            children: children.into_iter().map(Some).collect(),
            extra: Map::new(),
        })
    }

    pub fn list(list_type: ListType, items: Vec<RichTextNode>) -> Self {
        RichTextNode::List(ListNode {
            list_type,
            children: items.into_iter().map(Some).collect(),
            extra: Map::new(),
        })
    }

    pub fn list_item(children: Vec<RichTextNode>) -> Self {
        RichTextNode::ListItem(ContainerNode::new(children))
    }

    pub fn custom_link(url: impl Into<String>, new_tab: bool, children: Vec<RichTextNode>) -> Self {
        RichTextNode::Link(LinkNode {
            fields: LinkFields {
                link_type: LinkType::Custom,
                url: Some(url.into()),
                new_tab,
                ..LinkFields::default()
            },
            children: children.into_iter().map(Some).collect(),
            extra: Map::new(),
        })
    }

    pub fn internal_link(doc: DocumentReference, new_tab: bool, children: Vec<RichTextNode>) -> Self {
        RichTextNode::Link(LinkNode {
            fields: LinkFields {
                link_type: LinkType::Internal,
                new_tab,
                doc: Some(doc),
                ..LinkFields::default()
            },
            children: children.into_iter().map(Some).collect(),
            extra: Map::new(),
        })
    }

    pub fn upload(relation_to: impl Into<String>, filename: impl Into<String>, url: Option<&str>) -> Self {
        RichTextNode::Upload(UploadNode {
            relation_to: relation_to.into(),
            value: UploadValue::Populated(UploadAsset {
                filename: filename.into(),
                url: url.map(str::to_string),
                extra: Map::new(),
            }),
            extra: Map::new(),
        })
    }

    /// The `type` tag this node is serialized with.
    pub fn kind(&self) -> &str {
        match self {
            RichTextNode::Text(_) => "text",
            RichTextNode::LineBreak => "linebreak",
            RichTextNode::Link(_) => "link",
            RichTextNode::List(_) => "list",
            RichTextNode::ListItem(_) => "listitem",
            RichTextNode::Heading(_) => "heading",
            RichTextNode::Paragraph(_) => "paragraph",
            RichTextNode::Upload(_) => "upload",
            RichTextNode::Unknown(value) => value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("<untyped>"),
        }
    }
}

impl ContainerNode {
    pub fn new(children: Vec<RichTextNode>) -> Self {
        Self {
            children: children.into_iter().map(Some).collect(),
            extra: Map::new(),
        }
    }
}

/// Borrowed view used to write the `type` tag in front of a node's fields.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TaggedNode<'a> {
    Text(&'a TextNode),
    Linebreak,
    Link(&'a LinkNode),
    List(&'a ListNode),
    Listitem(&'a ContainerNode),
    Heading(&'a HeadingNode),
    Paragraph(&'a ContainerNode),
    Upload(&'a UploadNode),
}

impl Serialize for RichTextNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tagged = match self {
            RichTextNode::Text(node) => TaggedNode::Text(node),
            RichTextNode::LineBreak => TaggedNode::Linebreak,
            RichTextNode::Link(node) => TaggedNode::Link(node),
            RichTextNode::List(node) => TaggedNode::List(node),
            RichTextNode::ListItem(node) => TaggedNode::Listitem(node),
            RichTextNode::Heading(node) => TaggedNode::Heading(node),
            RichTextNode::Paragraph(node) => TaggedNode::Paragraph(node),
            RichTextNode::Upload(node) => TaggedNode::Upload(node),
            RichTextNode::Unknown(value) => return value.serialize(serializer),
        };
        tagged.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RichTextNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(D::Error::custom("rich-text node must be an object"));
        }

        let kind = match value.get("type").and_then(Value::as_str) {
            Some(kind) => kind.to_string(),
            None => return Ok(RichTextNode::Unknown(value)),
        };

        let node = match kind.as_str() {
            "text" => without_tag(value).map(RichTextNode::Text),
            "linebreak" => Ok(RichTextNode::LineBreak),
            "link" => without_tag(value).map(RichTextNode::Link),
            "list" => without_tag(value).map(RichTextNode::List),
            "listitem" => without_tag(value).map(RichTextNode::ListItem),
            "heading" => without_tag(value).map(RichTextNode::Heading),
            "paragraph" => without_tag(value).map(RichTextNode::Paragraph),
            "upload" => without_tag(value).map(RichTextNode::Upload),
            _ => Ok(RichTextNode::Unknown(value)),
        };

        node.map_err(D::Error::custom)
    }
}

/// Decode a node's fields after dropping the `type` tag, so it does not
/// end up in the node's `extra` map and get written twice.
fn without_tag<T: DeserializeOwned>(mut value: Value) -> serde_json::Result<T> {
    if let Value::Object(map) = &mut value {
        map.remove("type");
    }
    serde_json::from_value(value)
}
