//! Best-effort XML to JSON-shape conversion.
//!
//! The root element becomes the top-level object: its attributes sit under
//! `"@attributes"`, each child element becomes a key, repeated siblings
//! collapse into an array and leaf elements become strings. Text mixed with
//! child elements is dropped. This is a structural convenience, not an XML
//! object model.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::{RestError, Result};

const ATTRIBUTES: &str = "@attributes";

#[derive(Debug, Default)]
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(parse_error)?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(parse_error)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    fn into_value(self, root: bool) -> Value {
        if self.children.is_empty() && self.attributes.is_empty() && !root {
            return if self.text.is_empty() {
                Value::Object(Map::new())
            } else {
                Value::String(self.text)
            };
        }

        let mut map = Map::new();
        if !self.attributes.is_empty() {
            let attrs = self
                .attributes
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            map.insert(ATTRIBUTES.to_string(), Value::Object(attrs));
        }

        if self.children.is_empty() {
            if !self.text.is_empty() {
                map.insert("0".to_string(), Value::String(self.text));
            }
            return Value::Object(map);
        }

        for child in self.children {
            let name = child.name.clone();
            let value = child.into_value(false);
            match map.get_mut(&name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(name, value);
                }
            }
        }
        Value::Object(map)
    }
}

/// Convert an XML document into a JSON value shaped like its root element.
pub fn to_json(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event().map_err(parse_error)? {
            Event::Start(start) => stack.push(Node::open(&start)?),
            Event::Empty(start) => {
                let node = Node::open(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| RestError::Parse("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape().map_err(parse_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(RestError::Parse("unclosed element at end of document".to_string()));
    }
    root.map(|node| node.into_value(true))
        .ok_or_else(|| RestError::Parse("document has no root element".to_string()))
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(RestError::Parse("multiple root elements".to_string()));
    }
    *root = Some(node);
    Ok(())
}

fn parse_error(e: impl std::fmt::Display) -> RestError {
    RestError::Parse(e.to_string())
}
