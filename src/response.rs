//! Parsed API responses.
//!
//! The body is read once with the `xml` event reader into a small owned
//! element tree. Lookups are by path: `select("users/user")` finds every
//! `users` element anywhere in the document and then steps into its `user`
//! children, in document order.

use chrono::{DateTime, Utc};
use xml::reader::{EventReader, XmlEvent};

use crate::errors::{ApiError, Result};

/// One XML element with its attributes (in source order), children and text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn new(name: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of attribute `name`, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether attribute `name` is present. The value is not looked at:
    /// marker attributes are sent as `name=""`.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|(key, _)| key == name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Concatenated character data directly inside this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Every element reached by following `path` through children, starting
    /// from this element.
    pub fn select_children(&self, path: &str) -> Vec<&Element> {
        let mut current = vec![self];
        for step in path.split('/') {
            current = current
                .into_iter()
                .flat_map(|element| element.children.iter().filter(move |c| c.name == step))
                .collect();
        }
        current
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        if self.name == name {
            out.push(self);
        }
        for child in &self.children {
            child.collect_named(name, out);
        }
    }
}

/// A parsed response body plus the raw text, kept for error reports.
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
    raw: String,
}

impl Document {
    /// Parse a response body.
    ///
    /// # Arguments
    /// - body -> The raw bytes returned by the transport.
    ///
    /// # Returns
    /// - Ok(Document) -> The element tree.
    /// - Err(ApiError::Xml) -> The body was not a single well-formed document.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        for event in EventReader::new(body) {
            match event? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => {
                    let attributes = attributes
                        .into_iter()
                        .map(|attribute| (attribute.name.local_name, attribute.value))
                        .collect();
                    stack.push(Element::new(name.local_name, attributes));
                }
                XmlEvent::EndElement { .. } => {
                    let done = stack
                        .pop()
                        .ok_or_else(|| ApiError::xml("closing tag without opening tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => root = Some(done),
                    }
                }
                XmlEvent::Characters(text)
                | XmlEvent::CData(text)
                | XmlEvent::Whitespace(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                _ => {}
            }
        }

        let root = root.ok_or_else(|| ApiError::xml("document has no root element"))?;
        Ok(Self {
            root,
            raw: String::from_utf8_lossy(body).into_owned(),
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The response as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// All matches of `path`; the first step matches at any depth.
    pub fn select(&self, path: &str) -> Vec<&Element> {
        let mut steps = path.split('/');
        let Some(first) = steps.next() else {
            return Vec::new();
        };

        let mut current = Vec::new();
        self.root.collect_named(first, &mut current);
        for step in steps {
            current = current
                .into_iter()
                .flat_map(|element| element.children.iter().filter(move |c| c.name == step))
                .collect();
        }
        current
    }

    pub fn select_first(&self, path: &str) -> Option<&Element> {
        self.select(path).into_iter().next()
    }

    /// Attribute `attribute` of the first element matching `path`.
    pub fn attr(&self, path: &str, attribute: &str) -> Option<&str> {
        self.select_first(path)?.attr(attribute)
    }

    /// Like [`Document::attr`] but a missing value is a `General` error
    /// carrying this response.
    pub fn require_attr(&self, path: &str, attribute: &str) -> Result<&str> {
        self.attr(path, attribute).ok_or_else(|| {
            ApiError::general_with_raw(
                format!("Response has no {}/@{}", path, attribute),
                self.raw.clone(),
            )
        })
    }
}

/// Parse an API timestamp such as `2018-10-23T14:49:15Z`.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|e| ApiError::general(format!("Invalid timestamp {:?} ({})", value, e)))
}
