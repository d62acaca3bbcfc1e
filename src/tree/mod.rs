//! Owned, mutable XML element tree
//!
//! MusicXML is read into a plain tree of elements so that measures can be
//! moved between documents and attribute declarations deleted in place.
//!
//! # Module Structure
//!
//! - **reader**: MusicXML text to tree (quick-xml event reader)
//! - **writer**: tree to MusicXML text (quick-xml writer)

pub mod reader;
pub mod writer;

pub use reader::parse_document;
pub use writer::write_document;

/// A node in the element tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// An XML element with its attributes and ordered children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified tag name, as written in the source
    pub name: String,

    /// Attributes in source order
    pub attributes: Vec<(String, String)>,

    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element holding a single text child
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.children.push(XmlNode::Text(text.into()));
        element
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.append(child);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing its value in place if already present
    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// All element children, in document order
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Element children with the given tag name, in document order
    pub fn children_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |element| element.name == name)
    }

    pub fn children_of_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> + 'a {
        self.children.iter_mut().filter_map(move |node| match node {
            XmlNode::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    /// First element child with the given tag name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    /// Concatenated text and CDATA content of the direct children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) | XmlNode::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn append(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Detach every element child matching `predicate` and return them in order.
    /// Non-element children and non-matching elements keep their relative order.
    pub fn remove_elements_where<F>(&mut self, mut predicate: F) -> Vec<XmlElement>
    where
        F: FnMut(&XmlElement) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.children.len());
        for node in self.children.drain(..) {
            match node {
                XmlNode::Element(element) if predicate(&element) => removed.push(element),
                other => kept.push(other),
            }
        }
        self.children = kept;
        removed
    }

    /// Detach and return all element children with the given tag name
    pub fn take_children_of(&mut self, name: &str) -> Vec<XmlElement> {
        self.remove_elements_where(|element| element.name == name)
    }

    /// Deterministic one-line rendering of the subtree, used to compare
    /// structured values. Text is trimmed; comments and processing instructions are ignored.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        out.push_str(&self.name);
        if !self.attributes.is_empty() {
            let mut attributes: Vec<_> = self.attributes.iter().collect();
            attributes.sort();
            out.push('[');
            for (i, (key, value)) in attributes.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(key);
                out.push('=');
                out.push_str(value);
            }
            out.push(']');
        }
        out.push('(');
        for node in &self.children {
            match node {
                XmlNode::Element(element) => {
                    element.write_canonical(out);
                    out.push(';');
                }
                XmlNode::Text(text) | XmlNode::CData(text) => out.push_str(text.trim()),
                XmlNode::Comment(_) | XmlNode::ProcessingInstruction(_) => {}
            }
        }
        out.push(')');
    }
}

/// A parsed XML document: prolog, root element and trailing misc nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// Content of the `<!DOCTYPE ...>` declaration, without the delimiters
    pub doctype: Option<String>,

    /// Comments and processing instructions before the root element
    pub prolog: Vec<XmlNode>,

    pub root: XmlElement,

    /// Comments and processing instructions after the root element
    pub epilog: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self {
            doctype: None,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }
}
