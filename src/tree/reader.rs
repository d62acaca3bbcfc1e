//! MusicXML text to element tree
//!
//! Streams quick-xml events and folds them into an owned `XmlDocument`.
//! Whitespace-only text between child elements is layout and is dropped;
//! the text of leaf elements, attribute order and qualified names are kept
//! exactly as written.

use super::{XmlDocument, XmlElement, XmlNode};
use crate::errors::ParseError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parse an XML string into an element tree
pub fn parse_document(xml: &str) -> Result<XmlDocument, ParseError> {
    let mut reader = Reader::from_str(xml);

    let mut doctype = None;
    let mut prolog = Vec::new();
    let mut epilog = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut stack: Vec<XmlElement> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            ParseError::InvalidXml(format!("XML error at position {}: {}", reader.buffer_position(), e))
        })?;

        let node = match event {
            Event::Start(ref e) => {
                stack.push(start_element(e)?);
                continue;
            }
            Event::Empty(ref e) => XmlNode::Element(start_element(e)?),
            Event::End(_) => match stack.pop() {
                Some(mut element) => {
                    drop_layout_whitespace(&mut element);
                    XmlNode::Element(element)
                }
                None => {
                    return Err(ParseError::InvalidXml(format!(
                        "unexpected closing tag at position {}",
                        reader.buffer_position()
                    )))
                }
            },
            Event::Text(e) => {
                let text = e.unescape()?;
                if text.is_empty() || stack.is_empty() {
                    continue;
                }
                XmlNode::Text(text.into_owned())
            }
            Event::CData(e) => XmlNode::CData(utf8(&e.into_inner())?),
            Event::Comment(e) => XmlNode::Comment(utf8(&e)?),
            Event::PI(e) => XmlNode::ProcessingInstruction(utf8(&e)?),
            Event::DocType(e) => {
                doctype = Some(utf8(&e)?.trim().to_string());
                continue;
            }
            Event::Decl(_) => continue,
            Event::Eof => break,
        };

        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
            continue;
        }

        match node {
            XmlNode::Element(element) => {
                if root.is_some() {
                    return Err(ParseError::InvalidXml(format!(
                        "second root element <{}>",
                        element.name
                    )));
                }
                root = Some(element);
            }
            misc if root.is_none() => prolog.push(misc),
            misc => epilog.push(misc),
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::InvalidXml(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    let root = root.ok_or_else(|| ParseError::MissingRequiredElement("root element".to_string()))?;

    Ok(XmlDocument {
        doctype,
        prolog,
        root,
        epilog,
    })
}

/// Remove whitespace-only text from an element that has element children
fn drop_layout_whitespace(element: &mut XmlElement) {
    if element.elements().next().is_none() {
        return;
    }
    element.children.retain(|node| match node {
        XmlNode::Text(text) => !text.trim().is_empty(),
        _ => true,
    });
}

fn start_element(start: &BytesStart) -> Result<XmlElement, ParseError> {
    let mut element = XmlElement::new(utf8(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ParseError::InvalidXml(e.to_string()))?;
        let key = utf8(attribute.key.as_ref())?;
        let value = attribute.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn utf8(bytes: &[u8]) -> Result<String, ParseError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| ParseError::InvalidXml(format!("invalid UTF-8: {}", e)))
}
