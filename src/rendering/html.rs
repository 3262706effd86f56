/// Output of the rich-text renderer, ready to be written out as HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderNode {
    /// Text that has already been escaped for embedding in markup.
    Text(String),
    LineBreak,
    Element(Element),
}

/// An HTML element with attributes and child nodes.
///
/// Attribute values are stored raw and escaped on output; a `None` value
/// writes a bare boolean attribute such as `download`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub attributes: Vec<(&'static str, Option<String>)>,
    pub children: Vec<RenderNode>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((name, Some(value.into())));
        self
    }

    pub fn flag(mut self, name: &'static str) -> Self {
        self.attributes.push((name, None));
        self
    }

    pub fn children(mut self, children: Vec<RenderNode>) -> Self {
        self.children = children;
        self
    }

    pub fn child(mut self, child: RenderNode) -> Self {
        self.children.push(child);
        self
    }

    /// Value of the named attribute, if present with a value.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|(n, _)| *n == name)
    }
}

impl From<Element> for RenderNode {
    fn from(element: Element) -> Self {
        RenderNode::Element(element)
    }
}

/// Escape the HTML-special characters `& < > " '`.
pub fn escape_html(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len() + raw.len() / 8);
    for c in raw.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Serialize rendered nodes to an HTML fragment.
pub fn to_html(nodes: &[RenderNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &RenderNode) {
    match node {
        RenderNode::Text(escaped) => out.push_str(escaped),
        RenderNode::LineBreak => out.push_str("<br>"),
        RenderNode::Element(element) => {
            out.push('<');
            out.push_str(element.tag);
            for (name, value) in &element.attributes {
                out.push(' ');
                out.push_str(name);
                if let Some(value) = value {
                    out.push_str("=\"");
                    out.push_str(&escape_html(value));
                    out.push('"');
                }
            }
            out.push('>');
            for child in &element.children {
                write_node(out, child);
            }
            out.push_str("</");
            out.push_str(element.tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>"), "&lt;b&gt;");
        assert_eq!(escape_html("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(escape_html(r#"say "hi" it's"#), "say &quot;hi&quot; it&#39;s");
        assert_eq!(escape_html("Årsmöte"), "Årsmöte");
    }

    #[test]
    fn test_escape_is_not_idempotent_on_entities() {
        // Already-escaped input is escaped again; callers pass raw text only.
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_to_html_nested() {
        let nodes = vec![Element::new("p")
            .children(vec![
                RenderNode::Text("Hej ".into()),
                Element::new("strong")
                    .child(RenderNode::Text("alla".into()))
                    .into(),
                RenderNode::LineBreak,
            ])
            .into()];
        assert_eq!(to_html(&nodes), "<p>Hej <strong>alla</strong><br></p>");
    }

    #[test]
    fn test_to_html_escapes_attribute_values() {
        let node: RenderNode = Element::new("a")
            .attr("href", "/search?q=\"x\"&y=1")
            .flag("download")
            .into();
        assert_eq!(
            to_html(&[node]),
            "<a href=\"/search?q=&quot;x&quot;&amp;y=1\" download></a>"
        );
    }

    #[test]
    fn test_to_html_empty() {
        assert_eq!(to_html(&[]), "");
    }

    #[test]
    fn test_attribute_lookup() {
        let el = Element::new("a").attr("href", "/x").flag("download");
        assert_eq!(el.get_attr("href"), Some("/x"));
        assert_eq!(el.get_attr("download"), None);
        assert!(el.has_attr("download"));
        assert!(!el.has_attr("target"));
    }
}
