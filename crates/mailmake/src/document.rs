//! Structured email document produced by a markup compiler

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use quick_xml::escape::escape;
use serde::Serialize;

use crate::error::DiagnosticInfo;

/// Body width used when `mj-body` does not set one
const DEFAULT_BODY_WIDTH: u32 = 600;

/// Known MJML elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Mjml,
    Head,
    Title,
    Preview,
    Style,
    Body,
    Wrapper,
    Section,
    Group,
    Column,
    Hero,
    Text,
    Button,
    Image,
    Divider,
    Spacer,
    Table,
    Raw,
}

impl ElementKind {
    /// Look up an element by its tag name
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "mjml" => ElementKind::Mjml,
            "mj-head" => ElementKind::Head,
            "mj-title" => ElementKind::Title,
            "mj-preview" => ElementKind::Preview,
            "mj-style" => ElementKind::Style,
            "mj-body" => ElementKind::Body,
            "mj-wrapper" => ElementKind::Wrapper,
            "mj-section" => ElementKind::Section,
            "mj-group" => ElementKind::Group,
            "mj-column" => ElementKind::Column,
            "mj-hero" => ElementKind::Hero,
            "mj-text" => ElementKind::Text,
            "mj-button" => ElementKind::Button,
            "mj-image" => ElementKind::Image,
            "mj-divider" => ElementKind::Divider,
            "mj-spacer" => ElementKind::Spacer,
            "mj-table" => ElementKind::Table,
            "mj-raw" => ElementKind::Raw,
            _ => return None,
        };
        Some(kind)
    }

    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Mjml => "mjml",
            ElementKind::Head => "mj-head",
            ElementKind::Title => "mj-title",
            ElementKind::Preview => "mj-preview",
            ElementKind::Style => "mj-style",
            ElementKind::Body => "mj-body",
            ElementKind::Wrapper => "mj-wrapper",
            ElementKind::Section => "mj-section",
            ElementKind::Group => "mj-group",
            ElementKind::Column => "mj-column",
            ElementKind::Hero => "mj-hero",
            ElementKind::Text => "mj-text",
            ElementKind::Button => "mj-button",
            ElementKind::Image => "mj-image",
            ElementKind::Divider => "mj-divider",
            ElementKind::Spacer => "mj-spacer",
            ElementKind::Table => "mj-table",
            ElementKind::Raw => "mj-raw",
        }
    }

    /// Ending tags hold raw HTML instead of child elements
    pub fn is_ending(self) -> bool {
        matches!(
            self,
            ElementKind::Title
                | ElementKind::Preview
                | ElementKind::Style
                | ElementKind::Text
                | ElementKind::Button
                | ElementKind::Table
                | ElementKind::Raw
        )
    }

    /// Parents this element may appear under, `None` for the root
    pub fn allowed_parents(self) -> Option<&'static [ElementKind]> {
        use ElementKind::*;
        let parents: &'static [ElementKind] = match self {
            Mjml => return None,
            Head | Body => &[Mjml],
            Title | Preview | Style => &[Head],
            Wrapper | Hero => &[Body],
            Section => &[Body, Wrapper],
            Group => &[Section],
            Column => &[Section, Group],
            Text | Button | Image | Divider | Spacer | Table => &[Column, Hero],
            Raw => &[Head, Body, Wrapper, Section, Group, Column, Hero],
        };
        Some(parents)
    }
}

/// A single element in the document tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: ElementKind,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Node>,
    /// Inner HTML of ending tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Node {
    pub fn new(kind: ElementKind) -> Self {
        Node {
            kind,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            content: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn attr_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.attr(name).unwrap_or(default)
    }

    /// Attribute value made safe for a double-quoted HTML attribute
    fn escaped_attr<'a>(&'a self, name: &str, default: &'a str) -> Cow<'a, str> {
        escape(self.attr_or(name, default))
    }

    fn child(&self, kind: ElementKind) -> Option<&Node> {
        self.children.iter().find(|c| c.kind == kind)
    }
}

/// A compiled email document
///
/// The default value is the empty document that blank markup renders to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    /// The `<mjml>` element, absent for the empty document
    pub root: Option<Node>,
    /// Non-fatal findings from compilation
    pub warnings: Vec<DiagnosticInfo>,
}

impl Document {
    pub fn empty() -> Self {
        Document::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn head(&self) -> Option<&Node> {
        self.root.as_ref()?.child(ElementKind::Head)
    }

    pub fn body(&self) -> Option<&Node> {
        self.root.as_ref()?.child(ElementKind::Body)
    }

    /// Text of `mj-title`
    pub fn title(&self) -> Option<&str> {
        self.head()?.child(ElementKind::Title)?.content.as_deref()
    }

    /// Text of `mj-preview`
    pub fn preview_text(&self) -> Option<&str> {
        self.head()?.child(ElementKind::Preview)?.content.as_deref()
    }

    /// Emit an HTML email page for this document
    ///
    /// The empty document emits an empty string.
    pub fn to_html(&self) -> String {
        if self.root.is_none() {
            return String::new();
        }

        let width = self
            .body()
            .and_then(|b| b.attr("width"))
            .and_then(parse_px)
            .unwrap_or(DEFAULT_BODY_WIDTH);

        let mut html = String::with_capacity(1024);
        html.push_str("<!doctype html>\n<html xmlns=\"http://www.w3.org/1999/xhtml\">\n<head>\n");
        let _ = writeln!(html, "<title>{}</title>", self.title().unwrap_or_default().trim());
        html.push_str("<meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\">\n");
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
        html.push_str("<style type=\"text/css\">body{margin:0;padding:0;}table,td{border-collapse:collapse;}img{border:0;display:block;outline:none;text-decoration:none;}</style>\n");
        if let Some(head) = self.head() {
            for style in head.children.iter().filter(|c| c.kind == ElementKind::Style) {
                let _ = writeln!(
                    html,
                    "<style type=\"text/css\">{}</style>",
                    style.content.as_deref().unwrap_or_default().trim()
                );
            }
        }
        html.push_str("</head>\n");

        match self.body() {
            Some(body) => {
                let _ = writeln!(
                    html,
                    "<body style=\"word-spacing:normal;background-color:{};\">",
                    body.escaped_attr("background-color", "#ffffff")
                );
                if let Some(preview) = self.preview_text() {
                    let _ = writeln!(
                        html,
                        "<div style=\"display:none;max-height:0;overflow:hidden;\">{}</div>",
                        preview.trim()
                    );
                }
                let _ = writeln!(html, "<div style=\"margin:0 auto;max-width:{}px;\">", width);
                for child in &body.children {
                    emit_node(&mut html, child, width);
                }
                html.push_str("</div>\n</body>\n");
            }
            None => html.push_str("<body></body>\n"),
        }
        html.push_str("</html>\n");
        html
    }
}

fn parse_px(value: &str) -> Option<u32> {
    value.trim().trim_end_matches("px").parse().ok()
}

fn emit_node(html: &mut String, node: &Node, width: u32) {
    match node.kind {
        ElementKind::Wrapper | ElementKind::Section => {
            let _ = writeln!(
                html,
                "<table align=\"center\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"width:100%;background:{};\"><tbody><tr><td style=\"direction:ltr;padding:{};text-align:{};\">",
                node.escaped_attr("background-color", "transparent"),
                node.escaped_attr("padding", "20px 0"),
                node.escaped_attr("text-align", "center"),
            );
            emit_columns(html, node, width);
            html.push_str("</td></tr></tbody></table>\n");
        }
        ElementKind::Group => {
            html.push_str("<div style=\"display:inline-block;width:100%;\">\n");
            emit_columns(html, node, width);
            html.push_str("</div>\n");
        }
        ElementKind::Column | ElementKind::Hero => {
            let _ = writeln!(
                html,
                "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" width=\"100%\" style=\"background:{};\"><tbody>",
                node.escaped_attr("background-color", "transparent"),
            );
            for child in &node.children {
                html.push_str("<tr><td>");
                emit_node(html, child, width);
                html.push_str("</td></tr>\n");
            }
            html.push_str("</tbody></table>\n");
        }
        ElementKind::Text => {
            let _ = writeln!(
                html,
                "<div style=\"font-family:{};font-size:{};line-height:{};text-align:{};color:{};padding:{};\">{}</div>",
                node.escaped_attr("font-family", "Ubuntu, Helvetica, Arial, sans-serif"),
                node.escaped_attr("font-size", "13px"),
                node.escaped_attr("line-height", "1"),
                node.escaped_attr("align", "left"),
                node.escaped_attr("color", "#000000"),
                node.escaped_attr("padding", "10px 25px"),
                node.content.as_deref().unwrap_or_default().trim(),
            );
        }
        ElementKind::Button => {
            let _ = writeln!(
                html,
                "<table align=\"{}\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\"><tr><td style=\"border-radius:{};background:{};padding:10px 25px;\"><a href=\"{}\" style=\"color:{};font-size:{};text-decoration:none;\" target=\"_blank\">{}</a></td></tr></table>",
                node.escaped_attr("align", "center"),
                node.escaped_attr("border-radius", "3px"),
                node.escaped_attr("background-color", "#414141"),
                node.escaped_attr("href", "#"),
                node.escaped_attr("color", "#ffffff"),
                node.escaped_attr("font-size", "13px"),
                node.content.as_deref().unwrap_or_default().trim(),
            );
        }
        ElementKind::Image => {
            let _ = writeln!(
                html,
                "<img src=\"{}\" alt=\"{}\" width=\"{}\" style=\"width:100%;max-width:{}px;height:auto;\" />",
                node.escaped_attr("src", ""),
                node.escaped_attr("alt", ""),
                node.attr("width").and_then(parse_px).unwrap_or(width),
                node.attr("width").and_then(parse_px).unwrap_or(width),
            );
        }
        ElementKind::Divider => {
            let _ = writeln!(
                html,
                "<p style=\"border-top:{} {} {};margin:0 auto;width:100%;\"></p>",
                node.escaped_attr("border-style", "solid"),
                node.escaped_attr("border-width", "4px"),
                node.escaped_attr("border-color", "#000000"),
            );
        }
        ElementKind::Spacer => {
            let _ = writeln!(
                html,
                "<div style=\"height:{};line-height:{};\">&#8202;</div>",
                node.escaped_attr("height", "20px"),
                node.escaped_attr("height", "20px"),
            );
        }
        ElementKind::Table => {
            let _ = writeln!(
                html,
                "<table border=\"0\" cellpadding=\"{}\" cellspacing=\"{}\" width=\"{}\" style=\"color:{};font-size:{};\">{}</table>",
                node.escaped_attr("cellpadding", "0"),
                node.escaped_attr("cellspacing", "0"),
                node.escaped_attr("width", "100%"),
                node.escaped_attr("color", "#000000"),
                node.escaped_attr("font-size", "13px"),
                node.content.as_deref().unwrap_or_default().trim(),
            );
        }
        ElementKind::Raw => {
            html.push_str(node.content.as_deref().unwrap_or_default());
            html.push('\n');
        }
        // Head-only and root elements never appear in body position
        ElementKind::Mjml
        | ElementKind::Head
        | ElementKind::Body
        | ElementKind::Title
        | ElementKind::Preview
        | ElementKind::Style => {}
    }
}

/// Lay columns side by side, splitting the width evenly unless a column
/// sets its own
fn emit_columns(html: &mut String, parent: &Node, width: u32) {
    let columns = parent
        .children
        .iter()
        .filter(|c| matches!(c.kind, ElementKind::Column | ElementKind::Group))
        .count()
        .max(1);
    let share = 100.0 / columns as f64;

    for child in &parent.children {
        match child.kind {
            ElementKind::Column | ElementKind::Group => {
                let column_width = child
                    .attr("width")
                    .map(|w| escape(w).into_owned())
                    .unwrap_or_else(|| format!("{:.2}%", share));
                let _ = writeln!(
                    html,
                    "<div style=\"font-size:0;text-align:left;direction:ltr;display:inline-block;vertical-align:{};width:{};\">",
                    child.escaped_attr("vertical-align", "top"),
                    column_width,
                );
                emit_node(html, child, width);
                html.push_str("</div>\n");
            }
            _ => emit_node(html, child, width),
        }
    }
}
