use roxmltree::{Document, Node, ParsingOptions};

use super::types::{Channel, Feed, Item};

#[derive(Debug, thiserror::Error)]
pub enum FeedParseError {
    #[error("feed payload is empty")]
    EmptyPayload,
    #[error("feed payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("xml feed parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("expected <rss> root element, found <{found}>")]
    UnexpectedRoot { found: String },
}

const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";

const ROOT_TAG: &str = "rss";
const VERSION_ATTRIBUTE: &str = "version";
const CHANNEL_TAG: &str = "channel";
const ITEM_TAG: &str = "item";

type FieldSetter<T> = fn(&mut T, String);

const CHANNEL_FIELDS: &[(&str, FieldSetter<Channel>)] = &[
    ("title", |channel, text| channel.title = text),
    ("link", |channel, text| channel.link = text),
    ("description", |channel, text| channel.description = text),
];

const ITEM_FIELDS: &[(&str, FieldSetter<Item>)] = &[
    ("title", |item, text| item.title = text),
    ("link", |item, text| item.link = text),
    ("description", |item, text| item.description = text),
];

/// Decodes an RSS 2.0 document.
///
/// Absent fields and a missing `version` attribute decode to empty strings,
/// and an `<rss>` without a `<channel>` decodes to an empty channel. The
/// document must end after the root element; only whitespace, comments and
/// processing instructions may follow it. Only elements in the root element's
/// namespace bind to fields, so extension elements such as `atom:link` are
/// ignored.
pub fn parse_feed_bytes(raw: &[u8]) -> Result<Feed, FeedParseError> {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let trimmed = trim_leading_ascii_whitespace(raw);
    if trimmed.is_empty() {
        return Err(FeedParseError::EmptyPayload);
    }
    let text = std::str::from_utf8(trimmed)?;

    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let document = Document::parse_with_options(text, options)?;

    let root = document.root_element();
    if root.tag_name().name() != ROOT_TAG {
        return Err(FeedParseError::UnexpectedRoot {
            found: root.tag_name().name().to_string(),
        });
    }
    let namespace = root.tag_name().namespace();

    let channel = schema_children(root, namespace, CHANNEL_TAG)
        .next()
        .map(|channel_node| {
            let mut channel: Channel = decode_fields(channel_node, namespace, CHANNEL_FIELDS);
            channel.items = schema_children(channel_node, namespace, ITEM_TAG)
                .map(|item_node| decode_fields(item_node, namespace, ITEM_FIELDS))
                .collect();
            channel
        })
        .unwrap_or_default();

    Ok(Feed {
        version: root
            .attribute(VERSION_ATTRIBUTE)
            .unwrap_or_default()
            .to_string(),
        channel,
    })
}

fn schema_children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    namespace: Option<&'a str>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |child| {
        child.is_element()
            && child.tag_name().name() == tag
            && child.tag_name().namespace() == namespace
    })
}

// Later occurrences of a repeated field overwrite earlier ones.
fn decode_fields<T: Default>(
    node: Node<'_, '_>,
    namespace: Option<&str>,
    fields: &[(&str, FieldSetter<T>)],
) -> T {
    let mut value = T::default();
    for child in node.children() {
        if !child.is_element() || child.tag_name().namespace() != namespace {
            continue;
        }
        let name = child.tag_name().name();
        if let Some((_, set)) = fields.iter().find(|(tag, _)| *tag == name) {
            set(&mut value, element_text(child));
        }
    }
    value
}

fn element_text(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect()
}

fn trim_leading_ascii_whitespace(raw: &[u8]) -> &[u8] {
    let mut index = 0;
    while index < raw.len() && raw[index].is_ascii_whitespace() {
        index += 1;
    }
    &raw[index..]
}
