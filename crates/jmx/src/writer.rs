//! A thin layer over `quick_xml::Writer` that tracks open elements and knows
//! the property elements JMeter documents are made of.
use crate::error::AssemblyError;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

type Result<T> = std::result::Result<T, AssemblyError>;

const INDENT_WIDTH: usize = 2;

pub struct JmxWriter {
    writer: Writer<Vec<u8>>,
    open: Vec<String>,
}

/// XML 1.0 `Char`, minus the surrogates a `char` cannot hold anyway.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

fn check_text(location: impl FnOnce() -> String, text: &str) -> Result<()> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(character) => Err(AssemblyError::IllegalCharacter {
            location: location(),
            character,
        }),
        None => Ok(()),
    }
}

fn element<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> Result<BytesStart<'a>> {
    for (key, value) in attrs {
        check_text(|| format!("attribute '{}' of <{}>", key, name), value)?;
    }
    Ok(BytesStart::new(name).with_attributes(attrs.iter().copied()))
}

impl JmxWriter {
    /// Starts a document with its XML declaration.
    pub fn new() -> Result<Self> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(Self {
            writer,
            open: Vec::new(),
        })
    }

    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.writer.write_event(Event::Start(element(name, attrs)?))?;
        self.open.push(name.to_string());
        Ok(())
    }

    pub fn end(&mut self, name: &str) -> Result<()> {
        match self.open.pop() {
            Some(open) if open == name => {}
            Some(open) => {
                return Err(AssemblyError::MismatchedClose {
                    expected: open,
                    found: name.to_string(),
                });
            }
            None => return Err(AssemblyError::NothingOpen(name.to_string())),
        }
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.writer.write_event(Event::Empty(element(name, attrs)?))?;
        Ok(())
    }

    /// An element holding escaped text on a single line. Empty text still
    /// yields an open and a close tag.
    pub fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        check_text(
            || match attrs.iter().find(|(key, _)| *key == "name") {
                Some((_, prop)) => format!("<{} name=\"{}\">", name, prop),
                None => format!("<{}>", name),
            },
            text,
        )?;
        self.writer.write_event(Event::Start(element(name, attrs)?))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    pub fn string_prop(&mut self, name: &str, value: &str) -> Result<()> {
        self.text_element("stringProp", &[("name", name)], value)
    }

    pub fn bool_prop(&mut self, name: &str, value: bool) -> Result<()> {
        self.text_element("boolProp", &[("name", name)], if value { "true" } else { "false" })
    }

    pub fn int_prop(&mut self, name: &str, value: i32) -> Result<()> {
        self.text_element("intProp", &[("name", name)], &value.to_string())
    }

    /// The `<hashTree>` following an element. Leaves get `<hashTree/>`.
    pub fn hash_tree<F>(&mut self, has_children: bool, children: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if !has_children {
            return self.empty("hashTree", &[]);
        }
        self.start("hashTree", &[])?;
        children(self)?;
        self.end("hashTree")
    }

    /// Returns the document text. Fails if any element is still open.
    pub fn finish(self) -> Result<String> {
        if !self.open.is_empty() {
            return Err(AssemblyError::Unclosed(self.open));
        }
        Ok(String::from_utf8(self.writer.into_inner())?)
    }
}
