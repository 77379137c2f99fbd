//! Minimal XML tree with a lossless-enough round trip for
//! `word/document.xml`: elements, attributes and text survive
//! byte-for-byte in meaning; comments and CDATA are folded into text.

use std::io;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{PackrollError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlChild {
    Element(XmlNode),
    Text(String),
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(pair) = self.attrs.iter_mut().find(|(k, _)| k == name) {
            pair.1 = value.to_string();
        } else {
            self.attrs.push((name.to_string(), value.to_string()));
        }
    }

    pub fn push_element(&mut self, element: XmlNode) {
        self.children.push(XmlChild::Element(element));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlChild::Text(text.into()));
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter_map(|c| match c {
            XmlChild::Element(el) => Some(el),
            XmlChild::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlNode> {
        self.children.iter_mut().filter_map(|c| match c {
            XmlChild::Element(el) => Some(el),
            XmlChild::Text(_) => None,
        })
    }

    pub fn children_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a XmlNode> + use<'a, 'n> {
        self.elements().filter(move |el| el.name == name)
    }

    pub fn children_named_mut<'a, 'n>(
        &'a mut self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a mut XmlNode> + use<'a, 'n> {
        self.elements_mut().filter(move |el| el.name == name)
    }

    pub fn first_child(&self, name: &str) -> Option<&XmlNode> {
        self.children_named(name).next()
    }

    pub fn first_child_mut(&mut self, name: &str) -> Option<&mut XmlNode> {
        self.children_named_mut(name).next()
    }

    pub fn remove_children_named(&mut self, name: &str) {
        self.children.retain(|c| match c {
            XmlChild::Element(el) => el.name != name,
            XmlChild::Text(_) => true,
        });
    }

    /// Concatenated text of every descendant element named `name`,
    /// in document order.
    pub fn gather_text(&self, name: &str) -> String {
        let mut out = String::new();
        self.gather_text_into(name, &mut out);
        out
    }

    fn gather_text_into(&self, name: &str, out: &mut String) {
        for child in &self.children {
            match child {
                XmlChild::Element(el) => {
                    if el.name == name {
                        for inner in &el.children {
                            if let XmlChild::Text(t) = inner {
                                out.push_str(t);
                            }
                        }
                    } else {
                        el.gather_text_into(name, out);
                    }
                }
                XmlChild::Text(_) => {}
            }
        }
    }
}

/// Parse one XML document into its root element.
pub fn parse(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| PackrollError::Xml(e.to_string()))?;
        match event {
            Event::Start(e) => {
                stack.push(node_from_start(&e)?);
            }
            Event::Empty(e) => {
                let node = node_from_start(&e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| PackrollError::Xml("结束标签不匹配".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| PackrollError::Xml(e.to_string()))?;
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(text.into_owned());
                }
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(text);
                }
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(PackrollError::Xml("文档未正确闭合".to_string()));
    }
    root.ok_or_else(|| PackrollError::Xml("文档没有根元素".to_string()))
}

fn node_from_start(e: &BytesStart<'_>) -> Result<XmlNode> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut node = XmlNode::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| PackrollError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| PackrollError::Xml(e.to_string()))?
            .into_owned();
        node.attrs.push((key, value));
    }
    Ok(node)
}

fn attach(stack: &mut Vec<XmlNode>, root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_element(node);
            Ok(())
        }
        None => {
            if root.is_some() {
                return Err(PackrollError::Xml("文档有多个根元素".to_string()));
            }
            *root = Some(node);
            Ok(())
        }
    }
}

/// Serialize a tree back to UTF-8 bytes with the standard OOXML
/// declaration.
pub fn to_bytes(root: &XmlNode) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(io_to_xml)?;
    write_node(&mut writer, root).map_err(io_to_xml)?;
    Ok(writer.into_inner())
}

fn io_to_xml(e: io::Error) -> PackrollError {
    PackrollError::Xml(e.to_string())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> io::Result<()> {
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in &node.children {
        match child {
            XmlChild::Element(el) => write_node(writer, el)?,
            XmlChild::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))
}
