//! pom.xml parser
//!
//! Handles:
//! - `<dependency>` elements anywhere in the document (dependencies,
//!   dependencyManagement, plugin dependencies)
//! - `${name}` placeholders resolved against the first `<properties>` block
//! - Scope defaulting to `compile`
//!
//! Field lookup is lexical: the first descendant with a matching tag name
//! wins, whether or not it is a direct child of `<dependency>`.

use crate::domain::Dependency;
use crate::error::ManifestError;
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

// Property placeholder: ${name}
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

/// Parser for Maven pom.xml files
#[derive(Debug, Default, Clone, Copy)]
pub struct PomParser;

/// An element of the parsed document
#[derive(Debug)]
struct XmlNode {
    /// Qualified tag name
    name: String,
    /// Concatenated text of all descendants
    text: String,
    /// Index of the parent element
    parent: Option<usize>,
    /// Index of the last element nested inside this one
    last_descendant: usize,
}

/// Elements in document order
///
/// Descendants of node `i` occupy the index range `i + 1..=last_descendant`.
#[derive(Debug, Default)]
struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl XmlDocument {
    fn parse(content: &str) -> Result<Self, String> {
        let mut reader = Reader::from_str(content);
        let mut doc = XmlDocument::default();
        let mut open: Vec<usize> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let idx = doc.push(name, open.last().copied());
                    open.push(idx);
                }
                Ok(Event::Empty(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    doc.push(name, open.last().copied());
                }
                Ok(Event::End(_)) => {
                    if let Some(idx) = open.pop() {
                        doc.nodes[idx].last_descendant = doc.nodes.len() - 1;
                    }
                }
                Ok(Event::Text(e)) => {
                    let raw = String::from_utf8_lossy(&e).into_owned();
                    let text = unescape(&raw).map_err(|err| err.to_string())?;
                    doc.append_text(&open, &text);
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    doc.append_text(&open, &text);
                }
                Ok(Event::GeneralRef(e)) => {
                    let entity = format!("&{};", String::from_utf8_lossy(&e));
                    let text = unescape(&entity).map_err(|err| err.to_string())?;
                    doc.append_text(&open, &text);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(format!(
                        "error at position {}: {}",
                        reader.error_position(),
                        e
                    ))
                }
            }
        }

        if let Some(idx) = open.last() {
            return Err(format!(
                "unexpected end of document: <{}> is not closed",
                doc.nodes[*idx].name
            ));
        }
        if doc.nodes.is_empty() {
            return Err("document has no root element".to_string());
        }

        Ok(doc)
    }

    fn push(&mut self, name: String, parent: Option<usize>) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(XmlNode {
            name,
            text: String::new(),
            parent,
            last_descendant: idx,
        });
        idx
    }

    fn append_text(&mut self, open: &[usize], text: &str) {
        for &idx in open {
            self.nodes[idx].text.push_str(text);
        }
    }

    /// All elements with the given tag name, in document order
    fn elements_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.name == name)
            .map(|(i, _)| i)
    }

    /// Trimmed text of the first descendant of `idx` named `name`
    fn first_descendant_text(&self, idx: usize, name: &str) -> Option<String> {
        let end = self.nodes[idx].last_descendant;
        self.nodes[idx + 1..=end]
            .iter()
            .find(|n| n.name == name)
            .map(|n| n.text.trim().to_string())
    }

    /// Direct child elements of `idx`
    fn children(&self, idx: usize) -> impl Iterator<Item = &XmlNode> {
        let end = self.nodes[idx].last_descendant;
        self.nodes[idx + 1..=end]
            .iter()
            .filter(move |n| n.parent == Some(idx))
    }
}

impl PomParser {
    /// Parse dependencies from pom.xml content
    ///
    /// `path` is only used for error context.
    pub fn parse(&self, content: &str, path: &Path) -> Result<Vec<Dependency>, ManifestError> {
        let doc = XmlDocument::parse(content)
            .map_err(|message| ManifestError::xml_parse_error(path, message))?;

        let properties = Self::extract_properties(&doc);
        let mut dependencies = Vec::new();

        for idx in doc.elements_by_name("dependency") {
            let Some(raw_version) = doc.first_descendant_text(idx, "version") else {
                continue;
            };

            let version = resolve_properties(&raw_version, &properties);
            if version.is_empty() {
                continue;
            }

            let group_id = doc.first_descendant_text(idx, "groupId").unwrap_or_default();
            let artifact_id = doc
                .first_descendant_text(idx, "artifactId")
                .unwrap_or_default();

            let mut dependency = Dependency::new(group_id, artifact_id, version);
            if let Some(scope) = doc.first_descendant_text(idx, "scope") {
                dependency = dependency.with_scope(scope);
            }

            dependencies.push(dependency);
        }

        Ok(dependencies)
    }

    /// Collect the first `<properties>` block into a name → value map
    fn extract_properties(doc: &XmlDocument) -> HashMap<String, String> {
        let Some(idx) = doc.elements_by_name("properties").next() else {
            return HashMap::new();
        };

        doc.children(idx)
            .map(|n| (n.name.clone(), n.text.trim().to_string()))
            .collect()
    }
}

/// Replace `${name}` placeholders with property values
///
/// Substitution happens in a single pass, so a property value containing
/// another placeholder is left as is. Unknown placeholders stay verbatim.
pub fn resolve_properties(value: &str, properties: &HashMap<String, String>) -> String {
    PLACEHOLDER_RE
        .replace_all(value, |caps: &regex::Captures| {
            match properties.get(&caps[1]) {
                Some(resolved) => resolved.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Read and parse a pom.xml file
pub fn parse_manifest(path: &Path) -> Result<Vec<Dependency>, ManifestError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ManifestError::read_error(path, e))?;
    PomParser.parse(&content, path)
}
