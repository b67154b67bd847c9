//! Sectioned YAML documents.
//!
//! A configuration file is plain YAML cut into named sections by header
//! lines of the form `--- name:<Name>`:
//!
//! ```text
//! --- name:default
//! fps: 30
//! device: /dev/video0
//! --- name:high_rate
//! fps: 120
//! ```
//!
//! Splitting happens line by line before any YAML is parsed: every line
//! starting with `---` must be a section header, the rest of the header
//! line after `name:` is the section name verbatim, and all other lines are
//! collected for the most recently opened section. Lines before the first
//! header belong to no section and are ignored.
//!
//! Each section body is then handed to the YAML parser. It may yield several
//! documents; each must be a map, and they are merged additively into the
//! section's compound (later keys replace earlier ones). Scalars are kept
//! exactly as written: `007`, `0x1F`, `+5` and `~` reach the applier
//! untouched, and an empty value is the empty string.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::Marker;

use crate::error::ReflectfigError;
use crate::value::ConfigValue;

const SECTION_MARKER: &str = "--- name:";
const STRING_ORIGIN: &str = "<string>";

/// A named configuration fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub root: ConfigValue,
}

/// All sections parsed from one file, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    origin: String,
    sections: Vec<Section>,
}

impl Document {
    /// Parse sectioned text that did not come from a file.
    pub fn parse(text: &str) -> Result<Self, ReflectfigError> {
        Self::parse_with_origin(text, STRING_ORIGIN)
    }

    /// Parse sectioned text; `origin` names the source in diagnostics.
    pub fn parse_with_origin(text: &str, origin: &str) -> Result<Self, ReflectfigError> {
        let mut doc = Document {
            origin: origin.to_string(),
            sections: Vec::new(),
        };
        let mut open: Option<(String, String)> = None;

        for (idx, line) in text.lines().enumerate() {
            if !line.starts_with("---") {
                if let Some((_, buffer)) = open.as_mut() {
                    buffer.push_str(line);
                    buffer.push('\n');
                }
                continue;
            }

            let Some(name) = line.strip_prefix(SECTION_MARKER) else {
                return Err(ReflectfigError::MalformedSection {
                    origin: origin.to_string(),
                    line: idx + 1,
                    content: line.to_string(),
                });
            };

            if let Some((prev, buffer)) = open.take() {
                let root = parse_section_body(&buffer, origin, &prev)?;
                doc.push_section(prev, root);
            }
            open = Some((name.to_string(), String::new()));
        }

        if let Some((name, buffer)) = open {
            let root = parse_section_body(&buffer, origin, &name)?;
            doc.push_section(name, root);
        }

        Ok(doc)
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReflectfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReflectfigError::FileNotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(ReflectfigError::IoError {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let doc = Self::parse_with_origin(&text, &path.display().to_string())?;
        tracing::debug!(
            path = %path.display(),
            sections = doc.len(),
            "loaded configuration document"
        );
        Ok(doc)
    }

    fn push_section(&mut self, name: String, root: ConfigValue) {
        if self.section(&name).is_some() {
            tracing::warn!(
                origin = %self.origin,
                section = %name,
                "duplicate section name, keeping the first definition"
            );
            return;
        }
        self.sections.push(Section { name, root });
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Section names in file order.
    pub fn section_names(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Parse plain multi-document YAML (no section headers) into one compound.
pub fn parse_plain(text: &str) -> Result<ConfigValue, ReflectfigError> {
    parse_section_body(text, STRING_ORIGIN, "")
}

fn parse_section_body(
    buffer: &str,
    origin: &str,
    section: &str,
) -> Result<ConfigValue, ReflectfigError> {
    let mut builder = TreeBuilder::new(origin, section);
    Parser::new_from_str(buffer)
        .load(&mut builder, true)
        .map_err(|e| ReflectfigError::Yaml {
            origin: origin.to_string(),
            section: section.to_string(),
            source: e,
        })?;

    let mut merged = BTreeMap::new();
    for doc in builder.finish()? {
        let ConfigValue::Compound(map) = doc else {
            return Err(ReflectfigError::NonMapDocument {
                origin: origin.to_string(),
                section: section.to_string(),
            });
        };
        merged.extend(map);
    }
    Ok(ConfigValue::Compound(merged))
}

/// A collection still being filled by parser events.
enum OpenNode {
    Sequence {
        anchor: usize,
        items: Vec<ConfigValue>,
    },
    Mapping {
        anchor: usize,
        entries: BTreeMap<String, ConfigValue>,
        key: Option<String>,
    },
}

/// Builds [`ConfigValue`] trees straight from parser events, so scalars
/// keep the exact text of the file (`007`, `0x1F`, `~` are not resolved).
struct TreeBuilder<'a> {
    origin: &'a str,
    section: &'a str,
    stack: Vec<OpenNode>,
    anchors: HashMap<usize, ConfigValue>,
    documents: Vec<ConfigValue>,
    error: Option<ReflectfigError>,
}

impl<'a> TreeBuilder<'a> {
    fn new(origin: &'a str, section: &'a str) -> Self {
        Self {
            origin,
            section,
            stack: Vec::new(),
            anchors: HashMap::new(),
            documents: Vec::new(),
            error: None,
        }
    }

    fn finish(self) -> Result<Vec<ConfigValue>, ReflectfigError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.documents),
        }
    }

    fn complete(&mut self, node: ConfigValue, anchor: usize) {
        if anchor != 0 {
            self.anchors.insert(anchor, node.clone());
        }
        let bad_key = match self.stack.last_mut() {
            None => {
                self.documents.push(node);
                false
            }
            Some(OpenNode::Sequence { items, .. }) => {
                items.push(node);
                false
            }
            Some(OpenNode::Mapping { entries, key, .. }) => match key.take() {
                Some(k) => {
                    entries.insert(k, node);
                    false
                }
                None => {
                    let is_scalar = matches!(node, ConfigValue::Scalar(_));
                    // A placeholder keeps the following value paired with a key.
                    *key = Some(match node {
                        ConfigValue::Scalar(text) => text,
                        _ => String::new(),
                    });
                    !is_scalar
                }
            },
        };
        if bad_key {
            self.fail("non-scalar mapping key");
        }
    }

    fn fail(&mut self, reason: &str) {
        if self.error.is_none() {
            self.error = Some(ReflectfigError::UnsupportedYaml {
                origin: self.origin.to_string(),
                section: self.section.to_string(),
                reason: reason.to_string(),
            });
        }
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        match ev {
            Event::Scalar(text, _style, anchor, _tag) => {
                self.complete(ConfigValue::Scalar(text), anchor);
            }
            Event::Alias(anchor) => match self.anchors.get(&anchor).cloned() {
                Some(node) => self.complete(node, 0),
                None => {
                    self.fail(&format!("unknown alias at line {}", mark.line()));
                    self.complete(ConfigValue::Scalar(String::new()), 0);
                }
            },
            Event::SequenceStart(anchor, _tag) => self.stack.push(OpenNode::Sequence {
                anchor,
                items: Vec::new(),
            }),
            Event::MappingStart(anchor, _tag) => self.stack.push(OpenNode::Mapping {
                anchor,
                entries: BTreeMap::new(),
                key: None,
            }),
            Event::SequenceEnd | Event::MappingEnd => match self.stack.pop() {
                Some(OpenNode::Sequence { anchor, items }) => {
                    self.complete(ConfigValue::Array(items), anchor);
                }
                Some(OpenNode::Mapping {
                    anchor, entries, ..
                }) => self.complete(ConfigValue::Compound(entries), anchor),
                None => self.fail("unbalanced collection end"),
            },
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}
        }
    }
}
