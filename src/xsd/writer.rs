//! Scoped XML writer
//!
//! Elements are opened through [`XmlWriter::element`] and closed by the same
//! call that writes their content, so start and end tags always match.

use std::borrow::Cow;
use std::io::{self, Write};

const INDENT: &str = "  ";

/// Indenting XML writer over any byte sink
pub struct XmlWriter<W: Write> {
    out: W,
    depth: usize,
    /// Start tag of the innermost element is written but not yet closed with `>`
    open_tag: bool,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            depth: 0,
            open_tag: false,
        }
    }

    /// Write the UTF-8 XML prolog
    pub fn declaration(&mut self) -> io::Result<()> {
        writeln!(self.out, r#"<?xml version="1.0" encoding="utf-8"?>"#)
    }

    /// Begin an element; finish it with [`Element::empty`] or [`Element::children`]
    pub fn element(&mut self, name: impl Into<String>) -> Element<'_, W> {
        Element {
            writer: self,
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Flush and hand back the sink
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn start_tag(&mut self, name: &str, attributes: &[(String, String)]) -> io::Result<()> {
        self.close_open_tag()?;
        write!(self.out, "{}<{}", INDENT.repeat(self.depth), name)?;
        for (key, value) in attributes {
            write!(self.out, " {}=\"{}\"", key, escape(value))?;
        }
        Ok(())
    }

    fn close_open_tag(&mut self) -> io::Result<()> {
        if self.open_tag {
            self.out.write_all(b">\n")?;
            self.open_tag = false;
        }
        Ok(())
    }
}

/// Element whose start tag has not been written yet
pub struct Element<'w, W: Write> {
    writer: &'w mut XmlWriter<W>,
    name: String,
    attributes: Vec<(String, String)>,
}

impl<'w, W: Write> Element<'w, W> {
    pub fn attr(mut self, name: impl Into<String>, value: impl AsRef<str>) -> Self {
        let name = name.into();
        debug_assert!(
            !self.attributes.iter().any(|(k, _)| *k == name),
            "duplicate attribute {}",
            name
        );
        self.attributes.push((name, value.as_ref().to_string()));
        self
    }

    /// Add an attribute only when `condition` holds
    pub fn attr_if(self, condition: bool, name: impl Into<String>, value: impl AsRef<str>) -> Self {
        if condition {
            self.attr(name, value)
        } else {
            self
        }
    }

    /// Write the element as a self-closing tag
    pub fn empty(self) -> io::Result<()> {
        self.writer.start_tag(&self.name, &self.attributes)?;
        self.writer.out.write_all(b" />\n")
    }

    /// Write the element with the content produced by `content`.
    ///
    /// Collapses to a self-closing tag if `content` writes nothing.
    pub fn children<F>(self, content: F) -> io::Result<()>
    where
        F: FnOnce(&mut XmlWriter<W>) -> io::Result<()>,
    {
        let writer = self.writer;
        writer.start_tag(&self.name, &self.attributes)?;
        writer.open_tag = true;
        writer.depth += 1;
        content(writer)?;
        writer.depth -= 1;

        if writer.open_tag {
            writer.open_tag = false;
            writer.out.write_all(b" />\n")
        } else {
            writeln!(writer.out, "{}</{}>", INDENT.repeat(writer.depth), self.name)
        }
    }
}

/// Escape text for use inside a double-quoted attribute value
pub fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\n', '\r', '\t']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            '\t' => out.push_str("&#x9;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
