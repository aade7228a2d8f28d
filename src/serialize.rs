//! Turn a [`Document`] back into HTML text.

use ego_tree::NodeRef;
use scraper::node::{Doctype, Element, Node};

use crate::document::{Document, Injected};

/// Output layout of a serialized document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// Structure-only edits; the parsed whitespace is written back untouched.
    #[default]
    Preserve,
    /// One node per line, indented one space per nesting level.
    Pretty,
}

/// HTML5 void elements that must not have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext",
];

/// Elements whose whitespace is significant.
const PREFORMATTED_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Whether `el` is an HTML element named in `names`. An SVG or MathML
/// `<style>` is ordinary markup and never matches.
fn is_html_element(el: &Element, names: &[&str]) -> bool {
    &*el.name.ns == HTML_NAMESPACE && names.contains(&el.name())
}

pub(crate) fn to_html(doc: &Document, format: Format) -> String {
    let mut out = String::new();
    match format {
        Format::Preserve => write_compact(doc, doc.root(), &mut out),
        Format::Pretty => write_pretty(doc, doc.root(), 0, &mut out),
    }
    out
}

fn write_compact(doc: &Document, node: NodeRef<Node>, out: &mut String) {
    if doc.is_detached(node.id()) {
        return;
    }

    match node.value() {
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_compact(doc, child, out);
            }
        }
        Node::Doctype(doctype) => write_doctype(doctype, out),
        Node::Element(el) => {
            write_open_tag(doc, node, el, out);
            if is_html_element(el, VOID_ELEMENTS) {
                return;
            }
            write_element_body(doc, node, el, out);
            write_close_tag(el.name(), out);
        }
        Node::Text(text) => {
            if has_raw_text_parent(node) {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        Node::Comment(comment) => write_comment(comment, out),
        _ => {}
    }
}

/// Injected elements first, then the parsed children.
fn write_element_body(doc: &Document, node: NodeRef<Node>, el: &Element, out: &mut String) {
    for injected in doc.injected(node.id()) {
        write_injected_compact(injected, out);
    }
    if is_html_element(el, PREFORMATTED_ELEMENTS) && starts_with_newline(node) {
        out.push('\n');
    }
    for child in node.children() {
        write_compact(doc, child, out);
    }
}

fn write_pretty(doc: &Document, node: NodeRef<Node>, depth: usize, out: &mut String) {
    if doc.is_detached(node.id()) {
        return;
    }

    match node.value() {
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_pretty(doc, child, depth, out);
            }
        }
        Node::Doctype(doctype) => {
            indent(depth, out);
            write_doctype(doctype, out);
            out.push('\n');
        }
        Node::Element(el) => {
            indent(depth, out);
            write_open_tag(doc, node, el, out);
            if is_html_element(el, VOID_ELEMENTS) {
                out.push('\n');
                return;
            }
            if is_html_element(el, RAW_TEXT_ELEMENTS)
                || is_html_element(el, PREFORMATTED_ELEMENTS)
            {
                write_element_body(doc, node, el, out);
                write_close_tag(el.name(), out);
                out.push('\n');
                return;
            }
            out.push('\n');
            for injected in doc.injected(node.id()) {
                write_injected_pretty(injected, depth + 1, out);
            }
            for child in node.children() {
                write_pretty(doc, child, depth + 1, out);
            }
            indent(depth, out);
            write_close_tag(el.name(), out);
            out.push('\n');
        }
        Node::Text(text) => {
            // NBSP is content, only ASCII whitespace is layout.
            let trimmed = text.trim_matches(|c: char| c.is_ascii_whitespace());
            if trimmed.is_empty() {
                return;
            }
            indent(depth, out);
            escape_text(trimmed, out);
            out.push('\n');
        }
        Node::Comment(comment) => {
            indent(depth, out);
            write_comment(comment, out);
            out.push('\n');
        }
        _ => {}
    }
}

fn write_injected_compact(el: &Injected, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    out.push('>');
    out.push_str(&el.text);
    for child in &el.children {
        write_injected_compact(child, out);
    }
    write_close_tag(&el.name, out);
}

fn write_injected_pretty(el: &Injected, depth: usize, out: &mut String) {
    indent(depth, out);
    if el.children.is_empty() {
        write_injected_compact(el, out);
        out.push('\n');
        return;
    }
    out.push('<');
    out.push_str(&el.name);
    out.push_str(">\n");
    for child in &el.children {
        write_injected_pretty(child, depth + 1, out);
    }
    indent(depth, out);
    write_close_tag(&el.name, out);
    out.push('\n');
}

fn write_open_tag(doc: &Document, node: NodeRef<Node>, el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(el.name());
    for (name, value) in doc.attributes(node.id()) {
        out.push(' ');
        out.push_str(&name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');
}

fn write_close_tag(name: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Public and system identifiers are kept: dropping them can switch a page
/// from quirks to standards mode.
fn write_doctype(doctype: &Doctype, out: &mut String) {
    out.push_str("<!DOCTYPE ");
    out.push_str(doctype.name());
    let (public_id, system_id) = (doctype.public_id(), doctype.system_id());
    if !public_id.is_empty() {
        out.push_str(" PUBLIC \"");
        out.push_str(public_id);
        out.push('"');
        if !system_id.is_empty() {
            out.push_str(" \"");
            out.push_str(system_id);
            out.push('"');
        }
    } else if !system_id.is_empty() {
        out.push_str(" SYSTEM \"");
        out.push_str(system_id);
        out.push('"');
    }
    out.push('>');
}

fn write_comment(text: &str, out: &mut String) {
    out.push_str("<!--");
    out.push_str(text);
    out.push_str("-->");
}

fn indent(depth: usize, out: &mut String) {
    out.extend(std::iter::repeat_n(' ', depth));
}

fn has_raw_text_parent(node: NodeRef<Node>) -> bool {
    node.parent()
        .and_then(|p| p.value().as_element())
        .is_some_and(|el| is_html_element(el, RAW_TEXT_ELEMENTS))
}

fn starts_with_newline(node: NodeRef<Node>) -> bool {
    node.first_child()
        .and_then(|c| c.value().as_text())
        .is_some_and(|t| t.starts_with('\n'))
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preserve(html: &str) -> String {
        Document::parse(html).serialize(Format::Preserve)
    }

    #[test]
    fn preserve_keeps_layout() {
        let html = "<!DOCTYPE html><html><head><title>T</title></head>\n<body>\n  <p>One</p>\n  <p>Two</p>\n</body></html>";
        assert_eq!(preserve(html), html);
    }

    #[test]
    fn preserve_escapes_text_but_not_scripts() {
        let html = r#"<html><head><script>if (a < b && c) {}</script></head><body><p>1 &lt; 2 &amp; 3</p></body></html>"#;
        assert_eq!(preserve(html), html);
    }

    #[test]
    fn preserve_escapes_attribute_quotes() {
        let out = preserve(r#"<p title='say "hi" &amp; go'>x</p>"#);
        assert!(out.contains(r#"<p title="say &quot;hi&quot; &amp; go">"#));
    }

    #[test]
    fn void_elements_have_no_close_tag() {
        let out = preserve(r#"<p>a<br>b<img src="x.png"></p>"#);
        assert!(out.contains(r#"a<br>b<img src="x.png"></p>"#));
        assert!(!out.contains("</br>"));
        assert!(!out.contains("</img>"));
    }

    #[test]
    fn pre_leading_newline_survives() {
        let html = "<html><head></head><body><pre>\n\nindented</pre></body></html>";
        assert_eq!(preserve(html), html);
    }

    #[test]
    fn legacy_doctype_keeps_identifiers() {
        let html = "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\"><html><head></head><body><p>x</p></body></html>";
        assert_eq!(preserve(html), html);

        let strict = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd"><html><head></head><body></body></html>"#;
        assert_eq!(preserve(strict), strict);

        let system = r#"<!DOCTYPE html SYSTEM "about:legacy-compat"><html><head></head><body></body></html>"#;
        assert_eq!(preserve(system), system);
    }

    #[test]
    fn svg_style_is_escaped_like_text() {
        let html = r#"<html><head></head><body><svg><style>text::after{content:"a&lt;b"}</style></svg></body></html>"#;
        let once = preserve(html);
        assert_eq!(once, html);
        assert_eq!(preserve(&once), once);

        let pretty = Document::parse(html).serialize(Format::Pretty);
        assert!(pretty.contains(r#"text::after{content:"a&lt;b"}"#));
        assert_eq!(Document::parse(&pretty).serialize(Format::Pretty), pretty);
    }

    #[test]
    fn namespaced_attributes_keep_prefix() {
        let html = r##"<html><head></head><body><svg xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#icon" xml:lang="en"></use></svg></body></html>"##;
        assert_eq!(preserve(html), html);
    }

    #[test]
    fn pretty_indents_one_space_per_level() {
        let out = Document::parse("<html><head></head><body><div><p>Hi</p></div></body></html>")
            .serialize(Format::Pretty);
        assert_eq!(
            out,
            "<html>\n <head>\n </head>\n <body>\n  <div>\n   <p>\n    Hi\n   </p>\n  </div>\n </body>\n</html>\n"
        );
    }

    #[test]
    fn pretty_keeps_style_verbatim() {
        let out = Document::parse("<style>\n  a { color: red }\n</style>").serialize(Format::Pretty);
        assert!(out.contains("  <style>\n  a { color: red }\n</style>\n"));
    }

    #[test]
    fn pretty_is_stable_when_reparsed() {
        let once = Document::parse(
            "<!DOCTYPE html><html><head><title>A &amp; B</title></head><body><ul><li>x</li><li>y&nbsp;</li></ul></body></html>",
        )
        .serialize(Format::Pretty);
        let twice = Document::parse(&once).serialize(Format::Pretty);
        assert_eq!(once, twice);
        assert!(once.contains("y&nbsp;"));
    }

    #[test]
    fn injected_elements_come_first() {
        let mut doc = Document::parse("<html><head><meta charset=\"utf-8\"></head><body></body></html>");
        let head = doc.first_element("head").unwrap();
        doc.prepend(head, Injected::new("style", "p{}"));
        assert!(
            doc.serialize(Format::Preserve)
                .contains(r#"<head><style>p{}</style><meta charset="utf-8"></head>"#)
        );
    }
}
