//! XPath-lite evaluation over captured XML bodies.
//!
//! Paths are slash-separated element names with an optional trailing
//! attribute step: `/rss/channel/title`, `/root/item/@id`. Each element step
//! descends to the first child with that local name (namespace prefixes are
//! ignored). Predicates, axes and wildcards are not supported.
//!
//! The XML reader here is deliberately small: it builds an element tree from
//! well-formed input, skipping the prolog, comments, processing instructions
//! and DOCTYPE, and decoding CDATA sections and the predefined and numeric
//! character entities. Documents nested deeper than [`MAX_DEPTH`] elements
//! are rejected.

/// Maximum element nesting accepted by the reader.
pub const MAX_DEPTH: usize = 128;

/// A parsed XML node.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Element {
    /// Local name, without any namespace prefix.
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|node| match node {
            Node::Element(element) if element.name == name => Some(element),
            _ => None,
        })
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text of all descendants.
    fn text(&self) -> String {
        let mut output = String::new();
        self.collect_text(&mut output);
        output
    }

    fn collect_text(&self, output: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => output.push_str(text),
                Node::Element(element) => element.collect_text(output),
            }
        }
    }
}

/// Evaluates `path` against `xml`.
///
/// # Arguments
///
/// * `xml` - The XML document text
/// * `path` - A path such as `/root/user/name` or `/root/user/@id`
///
/// # Returns
///
/// The text content of the selected element, or the attribute value for a
/// final `@attr` step. Returns an empty string if the document does not
/// parse or any step is missing.
///
/// # Examples
///
/// ```
/// use dothttp::capture::xpath::evaluate_xpath;
///
/// let xml = r#"<root><user id="7"><name>Ada</name></user></root>"#;
/// assert_eq!(evaluate_xpath(xml, "/root/user/name"), "Ada");
/// assert_eq!(evaluate_xpath(xml, "/root/user/@id"), "7");
/// assert_eq!(evaluate_xpath(xml, "/root/missing"), "");
/// ```
pub fn evaluate_xpath(xml: &str, path: &str) -> String {
    select(xml, path).unwrap_or_default()
}

fn select(xml: &str, path: &str) -> Option<String> {
    let root = XmlReader::new(xml).read_document()?;
    let document = Element {
        children: vec![Node::Element(root)],
        ..Element::default()
    };

    let steps: Vec<&str> = path
        .trim()
        .split('/')
        .filter(|step| !step.is_empty())
        .collect();

    let mut current = &document;
    for (position, step) in steps.iter().enumerate() {
        if let Some(attribute) = step.strip_prefix('@') {
            let is_last = position + 1 == steps.len();
            if !is_last || std::ptr::eq(current, &document) {
                return None;
            }
            return current.attribute(attribute).map(str::to_string);
        }
        current = current.child(step)?;
    }

    Some(current.text())
}

/// Cursor over XML text.
struct XmlReader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> XmlReader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Advances past the next occurrence of `terminator`.
    fn skip_past(&mut self, terminator: &str) -> Option<()> {
        let offset = self.rest().find(terminator)?;
        self.pos += offset + terminator.len();
        Some(())
    }

    fn expect(&mut self, literal: &str) -> Option<()> {
        if self.starts_with(literal) {
            self.pos += literal.len();
            Some(())
        } else {
            None
        }
    }

    /// Skips whitespace, comments, processing instructions and DOCTYPE.
    fn skip_misc(&mut self) -> Option<()> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if self.starts_with("<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Some(());
            }
        }
    }

    fn skip_doctype(&mut self) -> Option<()> {
        let mut depth = 0usize;
        for (offset, ch) in self.rest().char_indices() {
            match ch {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => {
                    self.pos += offset + 1;
                    return Some(());
                }
                _ => {}
            }
        }
        None
    }

    fn read_document(mut self) -> Option<Element> {
        // Byte order mark
        if self.starts_with("\u{feff}") {
            self.pos += "\u{feff}".len();
        }

        self.skip_misc()?;
        let root = self.read_element(1)?;
        self.skip_misc()?;

        if self.rest().is_empty() {
            Some(root)
        } else {
            None
        }
    }

    fn read_name(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '=' | '<'))
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(&rest[..end])
    }

    fn read_element(&mut self, depth: usize) -> Option<Element> {
        if depth > MAX_DEPTH {
            return None;
        }
        self.expect("<")?;
        let qualified_name = self.read_name()?;
        let mut element = Element {
            name: local_name(qualified_name).to_string(),
            ..Element::default()
        };

        loop {
            self.skip_whitespace();
            if self.starts_with("/>") {
                self.pos += 2;
                return Some(element);
            }
            if self.starts_with(">") {
                self.pos += 1;
                break;
            }
            element.attributes.push(self.read_attribute()?);
        }

        self.read_content(&mut element, depth)?;

        self.expect("</")?;
        if self.read_name()? != qualified_name {
            return None;
        }
        self.skip_whitespace();
        self.expect(">")?;

        Some(element)
    }

    fn read_attribute(&mut self) -> Option<(String, String)> {
        let name = self.read_name()?;
        self.skip_whitespace();
        self.expect("=")?;
        self.skip_whitespace();

        let quote = self.rest().chars().next().filter(|c| matches!(c, '"' | '\''))?;
        self.pos += 1;
        let end = self.rest().find(quote)?;
        let value = decode_entities(&self.rest()[..end]);
        self.pos += end + 1;

        Some((local_name(name).to_string(), value))
    }

    /// Reads children until the closing tag of the current element.
    fn read_content(&mut self, element: &mut Element, depth: usize) -> Option<()> {
        loop {
            if self.rest().is_empty() {
                return None;
            }
            if self.starts_with("</") {
                return Some(());
            }

            if self.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if self.starts_with("<![CDATA[") {
                self.pos += "<![CDATA[".len();
                let end = self.rest().find("]]>")?;
                push_text(element, self.rest()[..end].to_string());
                self.pos += end + "]]>".len();
            } else if self.starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.starts_with("<") {
                let child = self.read_element(depth + 1)?;
                element.children.push(Node::Element(child));
            } else {
                let end = self.rest().find('<').unwrap_or(self.rest().len());
                push_text(element, decode_entities(&self.rest()[..end]));
                self.pos += end;
            }
        }
    }
}

fn push_text(element: &mut Element, text: String) {
    if let Some(Node::Text(last)) = element.children.last_mut() {
        last.push_str(&text);
    } else {
        element.children.push(Node::Text(text));
    }
}

fn local_name(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

/// Decodes predefined and numeric character references. Unknown entities are
/// kept as written.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        output.push_str(&rest[..start]);
        let candidate = &rest[start..];

        let decoded = candidate.find(';').and_then(|end| {
            let entity = &candidate[1..end];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|ch| (ch, end))
        });

        match decoded {
            Some((ch, end)) => {
                output.push(ch);
                rest = &candidate[end + 1..];
            }
            None => {
                output.push('&');
                rest = &candidate[1..];
            }
        }
    }

    output.push_str(rest);
    output
}
