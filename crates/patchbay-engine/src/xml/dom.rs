//! A small element tree on top of the quick-xml event reader and writer.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{PatchError, Result};

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attrs.push((key.to_string(), value.into()));
        self
    }

    pub fn number(self, key: &str, value: f64) -> Self {
        self.attr(key, format_number(value))
    }

    pub fn optional(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.attr(key, value),
            None => self,
        }
    }

    pub fn optional_number(self, key: &str, value: Option<f64>) -> Self {
        self.optional(key, value.map(format_number))
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }
}

/// Shortest text that parses back to the same `f64`.
pub(crate) fn format_number(value: f64) -> String {
    format!("{value}")
}

fn xml_error(path: &str, message: impl std::fmt::Display) -> PatchError {
    PatchError::Xml {
        path: path.to_string(),
        message: message.to_string(),
    }
}

pub(crate) fn write_document(root: &Element) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| xml_error(&root.name, e))?;
    write_element(&mut writer, root)?;
    String::from_utf8(writer.into_inner()).map_err(|e| xml_error(&root.name, e))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| xml_error(&element.name, e));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| xml_error(&element.name, e))?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(|e| xml_error(&element.name, e))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| xml_error(&element.name, e))
}

/// Read a document into its root element. Whitespace-only text between
/// elements is dropped; other text is kept as written.
pub(crate) fn read_document(source: &str) -> Result<Element> {
    let mut reader = Reader::from_str(source);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| xml_error(&format!("byte {position}"), e))?;
        match event {
            Event::Start(start) => stack.push(open(&start, position)?),
            Event::Empty(start) => {
                let element = open(&start, position)?;
                close(&mut stack, &mut root, element, position)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| xml_error(&format!("byte {position}"), "unbalanced end tag"))?;
                close(&mut stack, &mut root, element, position)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| xml_error(&format!("byte {position}"), e))?;
                if let Some(current) = stack.last_mut()
                    && !text.trim().is_empty()
                {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(xml_error("document", "unclosed element at end of input"));
    }
    root.ok_or_else(|| xml_error("document", "no root element"))
}

fn open(start: &BytesStart<'_>, position: u64) -> Result<Element> {
    let at = format!("byte {position}");
    let name = String::from_utf8(start.name().as_ref().to_vec()).map_err(|e| xml_error(&at, e))?;
    let mut element = Element::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| xml_error(&at, e))?;
        let key =
            String::from_utf8(attribute.key.as_ref().to_vec()).map_err(|e| xml_error(&at, e))?;
        let value = attribute
            .unescape_value()
            .map_err(|e| xml_error(&at, e))?
            .into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

fn close(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: u64,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(xml_error(
                &format!("byte {position}"),
                "more than one root element",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tree_survives_write_and_read() {
        let tree = Element::new("patch")
            .attr("name", "a <b> & \"c\"")
            .child(Element::new("lib").text("zexy"))
            .child(Element::new("float").number("value", 0.1));

        let xml = write_document(&tree).unwrap();
        assert_eq!(read_document(&xml).unwrap(), tree);
    }

    #[test]
    fn leaf_text_keeps_its_padding() {
        // Given a leaf whose text starts and ends with spaces
        let tree = Element::new("dependencies").child(Element::new("path").text("  my libs/ "));

        // When written and read back
        let xml = write_document(&tree).unwrap();
        let read = read_document(&xml).unwrap();

        // Then the text is unchanged and the indentation around it is not picked up
        assert_eq!(read.children[0].text, "  my libs/ ");
        assert_eq!(read.text, "");
    }

    #[test]
    fn unbalanced_documents_fail() {
        assert!(read_document("<patch><canvas></patch>").is_err());
        assert!(read_document("").is_err());
    }
}
