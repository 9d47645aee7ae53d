//! Built-in MJML compiler
//!
//! Parses the supported subset of MJML into a [`Document`]. Structural
//! problems (unknown elements, unclosed or mismatched tags, a root other than
//! `<mjml>`) are errors; elements placed under an unexpected parent are
//! accepted with a warning, matching MJML's soft validation.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::document::{Document, ElementKind, Node};
use crate::error::{DiagnosticInfo, DiagnosticSeverity, SourceLocation};
use crate::render::{MarkupCompiler, RenderError};

/// Compiler for the supported MJML subset
#[derive(Debug, Clone, Default)]
pub struct MjmlCompiler;

impl MjmlCompiler {
    pub fn new() -> Self {
        MjmlCompiler
    }
}

impl MarkupCompiler for MjmlCompiler {
    fn compile(&self, markup: &str) -> Result<Document, RenderError> {
        Parser::new(markup).parse()
    }
}

struct OpenElement {
    node: Node,
    start: usize,
    end: usize,
}

struct Parser<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    stack: Vec<OpenElement>,
    root: Option<Node>,
    warnings: Vec<DiagnosticInfo>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        let config = reader.config_mut();
        config.trim_text(true);
        // Nesting is checked here so mismatches get MJML-specific messages
        config.check_end_names = false;

        Parser {
            source,
            reader,
            stack: Vec::new(),
            root: None,
            warnings: Vec::new(),
        }
    }

    fn position(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    fn syntax_error(&self, error: quick_xml::Error) -> RenderError {
        let at = self.reader.error_position() as usize;
        RenderError::at(format!("Malformed markup: {}", error), self.source, at, at)
    }

    fn parse(mut self) -> Result<Document, RenderError> {
        loop {
            let start = self.position();
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(error) => return Err(self.syntax_error(error)),
            };
            let end = self.position();

            match event {
                Event::Start(tag) => {
                    let mut node = self.open_element(&tag, start, end)?;
                    if node.kind.is_ending() {
                        node.content = Some(self.read_raw_content(node.kind, start, end)?);
                        self.attach(node);
                    } else {
                        self.stack.push(OpenElement { node, start, end });
                    }
                }
                Event::Empty(tag) => {
                    let node = self.open_element(&tag, start, end)?;
                    self.attach(node);
                }
                Event::End(tag) => {
                    let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                    match self.stack.pop() {
                        Some(open) if open.node.kind.tag() == name => self.attach(open.node),
                        Some(open) => {
                            return Err(RenderError::at(
                                format!(
                                    "Mismatched closing tag </{}>, expected </{}>",
                                    name,
                                    open.node.kind.tag()
                                ),
                                self.source,
                                start,
                                end,
                            ));
                        }
                        None => {
                            return Err(RenderError::at(
                                format!("Unexpected closing tag </{}>", name),
                                self.source,
                                start,
                                end,
                            ));
                        }
                    }
                }
                Event::Text(text) => {
                    if !String::from_utf8_lossy(&text).trim().is_empty() {
                        self.warn("Text outside of a content element is ignored", start);
                    }
                }
                Event::CData(_) => {
                    self.warn("CDATA outside of a content element is ignored", start);
                }
                Event::Eof => break,
                // Comments, declarations, processing instructions, doctype
                _ => {}
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(RenderError::at(
                format!("Unclosed tag <{}>", open.node.kind.tag()),
                self.source,
                open.start,
                open.end,
            ));
        }

        match self.root {
            Some(root) => Ok(Document {
                root: Some(root),
                warnings: self.warnings,
            }),
            None => Err(RenderError::new("Markup has no <mjml> root element")),
        }
    }

    fn open_element(
        &mut self,
        tag: &BytesStart<'_>,
        start: usize,
        end: usize,
    ) -> Result<Node, RenderError> {
        let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();

        let parent_kind = self.stack.last().map(|open| open.node.kind);
        let kind = match (parent_kind, ElementKind::from_tag(&name)) {
            (None, _) if self.root.is_some() => {
                return Err(RenderError::at(
                    format!("Unexpected <{}> after the <mjml> root element", name),
                    self.source,
                    start,
                    end,
                ));
            }
            (None, Some(ElementKind::Mjml)) => ElementKind::Mjml,
            (None, _) => {
                return Err(RenderError::at(
                    format!("Root element must be <mjml>, found <{}>", name),
                    self.source,
                    start,
                    end,
                ));
            }
            (Some(_), None) => {
                return Err(RenderError::at(
                    format!("Unknown element <{}>", name),
                    self.source,
                    start,
                    end,
                ));
            }
            (Some(parent_kind), Some(kind)) => {
                match kind.allowed_parents() {
                    None => {
                        return Err(RenderError::at(
                            format!("<{}> may only appear as the root element", name),
                            self.source,
                            start,
                            end,
                        ));
                    }
                    Some(parents) if !parents.contains(&parent_kind) => {
                        self.warn(
                            format!("<{}> is not allowed inside <{}>", name, parent_kind.tag()),
                            start,
                        );
                    }
                    Some(_) => {}
                }
                kind
            }
        };

        let mut node = Node::new(kind);
        for attribute in tag.attributes() {
            let attribute = attribute.map_err(|e| {
                RenderError::at(
                    format!("Invalid attribute on <{}>: {}", name, e),
                    self.source,
                    start,
                    end,
                )
            })?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| {
                    RenderError::at(
                        format!("Invalid value for attribute '{}': {}", key, e),
                        self.source,
                        start,
                        end,
                    )
                })?
                .into_owned();
            node.attributes.insert(key, value);
        }
        Ok(node)
    }

    /// Consume everything up to the matching closing tag and return it
    /// verbatim
    fn read_raw_content(
        &mut self,
        kind: ElementKind,
        start: usize,
        end: usize,
    ) -> Result<String, RenderError> {
        let tag = kind.tag();
        let content_start = end;
        let mut depth = 0usize;

        loop {
            let before = self.position();
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(error) => return Err(self.syntax_error(error)),
            };
            match event {
                Event::Start(inner) if inner.name().as_ref() == tag.as_bytes() => depth += 1,
                Event::End(inner) if inner.name().as_ref() == tag.as_bytes() => {
                    if depth == 0 {
                        return Ok(self.source[content_start..before].to_string());
                    }
                    depth -= 1;
                }
                Event::Eof => {
                    return Err(RenderError::at(
                        format!("Unclosed tag <{}>", tag),
                        self.source,
                        start,
                        end,
                    ));
                }
                _ => {}
            }
        }
    }

    /// Add a finished node to its parent, or make it the root
    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.node.children.push(node),
            None => self.root = Some(node),
        }
    }

    fn warn(&mut self, message: impl Into<String>, offset: usize) {
        self.warnings.push(DiagnosticInfo {
            message: message.into(),
            severity: DiagnosticSeverity::Warning,
            location: Some(SourceLocation::from_offset(self.source, offset)),
        });
    }
}
