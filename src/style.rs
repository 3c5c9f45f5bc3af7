//! Typed, section/key-scoped style attributes for annotation rendering.
//!
//! A `Style` maps (section, key) to one tagged value and resolves reads
//! through node-specific overrides first. The textual form is a JSON
//! document; `load` and `to_text` round-trip every store reachable through
//! the public mutators.

use crate::color::Color;
use crate::error::StyleError;
use crate::node::{Node, NodeId};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// Keys missing from their own section fall back to this one.
pub const FALLBACK_SECTION: &str = "format";

const RUNTIME_STYLE_PATH: &str = "data/resources/style.json";
const BUILTIN_STYLE_JSON: &str = include_str!("../assets/default_style.json");

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleValue {
    Color(Color),
    Text(String),
    Number(f64),
    Flag(bool),
}

type KeyMap = BTreeMap<String, StyleValue>;
type OverrideMap = BTreeMap<String, BTreeMap<String, BTreeMap<NodeId, StyleValue>>>;

/// On-disk shape of a style. Overrides are flattened to rows so the text
/// stays readable; maps are ordered, so serialization is deterministic.
/// Override rows carry raw node ids, which are allocated per process, so a
/// persisted override only binds to a node of the process that wrote it.
#[derive(Default, Serialize, Deserialize)]
struct StyleDocument {
    #[serde(default)]
    style: BTreeMap<String, KeyMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    overrides: Vec<(String, String, u64, StyleValue)>,
}

#[derive(Debug, PartialEq)]
pub struct Style {
    sections: BTreeMap<String, KeyMap>,
    overrides: OverrideMap,
}

impl Style {
    pub fn new() -> Self {
        Self {
            sections: BTreeMap::new(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn from_text(text: &str) -> Result<Self, StyleError> {
        let doc: StyleDocument = serde_json::from_str(text)?;
        let mut style = Self::new();
        style.sections = doc.style;
        for (section, key, id, value) in doc.overrides {
            style
                .overrides
                .entry(section)
                .or_default()
                .entry(key)
                .or_default()
                .insert(NodeId::from_value(id), value);
        }
        Ok(style)
    }

    /// Replaces the whole attribute set from `text`. The store is left
    /// unmodified when the text is malformed.
    pub fn load(&mut self, text: &str) -> Result<(), StyleError> {
        *self = Self::from_text(text)?;
        Ok(())
    }

    /// Like `load`. Node ids restart at 1 in every process, so overrides
    /// read from a file written by an earlier run do not correspond to any
    /// current node unless the node tree was rebuilt identically.
    pub fn load_file(&mut self, path: &str) -> Result<(), StyleError> {
        let text = fs::read_to_string(path)?;
        self.load(&text)
    }

    pub fn to_text(&self) -> String {
        let doc = StyleDocument {
            style: self.sections.clone(),
            overrides: self
                .overrides
                .iter()
                .flat_map(|(section, keys)| {
                    keys.iter().flat_map(move |(key, per_node)| {
                        per_node.iter().map(move |(id, value)| {
                            (section.clone(), key.clone(), id.value(), value.clone())
                        })
                    })
                })
                .collect(),
        };
        serde_json::to_string_pretty(&doc).expect("style document serialization")
    }

    /// Writes the textual form, including overrides; their node ids are
    /// process-local (see `load_file`).
    pub fn to_file(&self, path: &str) -> Result<(), StyleError> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    /// Independent copy by way of the textual form, the same path external
    /// callers use to duplicate a style.
    pub fn deep_clone(&self) -> Self {
        Self::from_text(&self.to_text()).expect("round-trip of own serialization")
    }

    fn get(&self, section: &str, key: &str, node: Option<&Node>) -> Option<&StyleValue> {
        if let Some(node) = node {
            if let Some(value) = self
                .overrides
                .get(section)
                .and_then(|keys| keys.get(key))
                .and_then(|per_node| per_node.get(&node.id()))
            {
                return Some(value);
            }
        }
        self.sections.get(section).and_then(|keys| keys.get(key))
    }

    // A key stored under a different type reads as absent, like a key that
    // was never set.
    pub fn get_color(&self, section: &str, key: &str, node: Option<&Node>) -> Option<Color> {
        match self.get(section, key, node) {
            Some(StyleValue::Color(color)) => Some(*color),
            _ => None,
        }
    }

    pub fn get_text(&self, section: &str, key: &str, node: Option<&Node>) -> Option<&str> {
        match self.get(section, key, node) {
            Some(StyleValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn get_number(&self, section: &str, key: &str, node: Option<&Node>) -> Option<f64> {
        match self.get(section, key, node) {
            Some(StyleValue::Number(number)) => Some(*number),
            _ => None,
        }
    }

    pub fn get_flag(&self, section: &str, key: &str, node: Option<&Node>) -> Option<bool> {
        match self.get(section, key, node) {
            Some(StyleValue::Flag(flag)) => Some(*flag),
            _ => None,
        }
    }

    /// Renderer-style lookup: the section's value, else the `format`
    /// section's value for the same key, else `default`.
    pub fn get_number_or(
        &self,
        section: &str,
        key: &str,
        node: Option<&Node>,
        default: f64,
    ) -> f64 {
        self.get_number(section, key, node)
            .or_else(|| self.get_number(FALLBACK_SECTION, key, None))
            .unwrap_or(default)
    }

    fn set(&mut self, section: &str, key: &str, value: StyleValue) {
        self.sections
            .entry(section.to_owned())
            .or_default()
            .insert(key.to_owned(), value);
    }

    pub fn set_color(&mut self, section: &str, key: &str, color: Color) {
        self.set(section, key, StyleValue::Color(color));
    }

    pub fn set_text(&mut self, section: &str, key: &str, text: &str) {
        self.set(section, key, StyleValue::Text(text.to_owned()));
    }

    /// JSON has no lexeme for NaN or infinity, so a non-finite number cannot
    /// survive the textual form; setting one removes the key instead.
    pub fn set_number(&mut self, section: &str, key: &str, number: f64) {
        if number.is_finite() {
            self.set(section, key, StyleValue::Number(number));
        } else {
            self.unset(section, key);
        }
    }

    pub fn set_flag(&mut self, section: &str, key: &str, flag: bool) {
        self.set(section, key, StyleValue::Flag(flag));
    }

    fn set_override(&mut self, section: &str, key: &str, node: &Node, value: StyleValue) {
        self.overrides
            .entry(section.to_owned())
            .or_default()
            .entry(key.to_owned())
            .or_default()
            .insert(node.id(), value);
    }

    pub fn set_color_override(&mut self, section: &str, key: &str, node: &Node, color: Color) {
        self.set_override(section, key, node, StyleValue::Color(color));
    }

    pub fn set_text_override(&mut self, section: &str, key: &str, node: &Node, text: &str) {
        self.set_override(section, key, node, StyleValue::Text(text.to_owned()));
    }

    /// Non-finite numbers remove the override, as in `set_number`.
    pub fn set_number_override(&mut self, section: &str, key: &str, node: &Node, number: f64) {
        if number.is_finite() {
            self.set_override(section, key, node, StyleValue::Number(number));
        } else {
            self.unset_override(section, key, node);
        }
    }

    pub fn set_flag_override(&mut self, section: &str, key: &str, node: &Node, flag: bool) {
        self.set_override(section, key, node, StyleValue::Flag(flag));
    }

    /// Removes the global value; node overrides for the key survive.
    pub fn unset(&mut self, section: &str, key: &str) {
        if let Some(keys) = self.sections.get_mut(section) {
            keys.remove(key);
            if keys.is_empty() {
                self.sections.remove(section);
            }
        }
    }

    pub fn unset_override(&mut self, section: &str, key: &str, node: &Node) {
        if let Some(keys) = self.overrides.get_mut(section) {
            if let Some(per_node) = keys.get_mut(key) {
                per_node.remove(&node.id());
                if per_node.is_empty() {
                    keys.remove(key);
                }
            }
            if keys.is_empty() {
                self.overrides.remove(section);
            }
        }
    }

    pub fn sections(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }

    pub fn keys(&self, section: &str) -> Vec<&str> {
        self.sections
            .get(section)
            .map(|keys| keys.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.overrides.is_empty()
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::from_text(BUILTIN_STYLE_JSON).expect("builtin style asset parses")
    }
}

pub fn load_style_from_path(path: &str) -> Result<Style> {
    let text = fs::read_to_string(path)?;
    Ok(Style::from_text(&text)?)
}

/// The bundled default style, replaced by `data/resources/style.json` when
/// that file exists and is non-empty.
pub fn active_style() -> Style {
    if let Ok(custom) = load_style_from_path(RUNTIME_STYLE_PATH) {
        if !custom.is_empty() {
            return custom;
        }
    }
    Style::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, Range, Strand};
    use std::fs;
    use tempfile::tempdir;

    fn exon_node() -> Node {
        Node::feature("exon", Range::new(100, 200).unwrap(), Strand::Forward)
    }

    #[test]
    fn test_set_get_unset_each_type() {
        let mut style = Style::new();
        style.set_color("gene", "fill", Color::new(0.9, 0.9, 1.0));
        style.set_text("gene", "style", "box");
        style.set_number("exon", "bar_height", 15.0);
        style.set_flag("cds", "collapse", true);

        assert_eq!(
            style.get_color("gene", "fill", None),
            Some(Color::new(0.9, 0.9, 1.0))
        );
        assert_eq!(style.get_text("gene", "style", None), Some("box"));
        assert_eq!(style.get_number("exon", "bar_height", None), Some(15.0));
        assert_eq!(style.get_flag("cds", "collapse", None), Some(true));

        style.unset("cds", "collapse");
        assert_eq!(style.get_flag("cds", "collapse", None), None);
        assert_eq!(style.get_number("exon", "width", None), None);
    }

    #[test]
    fn test_set_overwrites() {
        let mut style = Style::new();
        style.set_number("exon", "bar_height", 15.0);
        style.set_number("exon", "bar_height", 42.0);
        assert_eq!(style.get_number("exon", "bar_height", None), Some(42.0));
    }

    #[test]
    fn test_non_finite_numbers_are_not_stored() {
        let node = exon_node();
        let mut style = Style::new();
        style.set_number("exon", "width", 2.0);
        style.set_number("exon", "width", f64::NAN);
        assert_eq!(style.get_number("exon", "width", None), None);

        style.set_number_override("exon", "width", &node, 7.5);
        style.set_number_override("exon", "width", &node, f64::INFINITY);
        assert_eq!(style.get_number("exon", "width", Some(&node)), None);

        // the textual form stays loadable and the copy path stays total
        style.set_number("gene", "bar_height", f64::NEG_INFINITY);
        style.set_flag("gene", "collapse", true);
        let mut reloaded = Style::new();
        reloaded.load(&style.to_text()).unwrap();
        assert_eq!(reloaded, style);
        let copy = style.deep_clone();
        assert_eq!(copy.get_flag("gene", "collapse", None), Some(true));
        assert_eq!(copy.get_number("gene", "bar_height", None), None);
    }

    #[test]
    fn test_wrong_type_reads_as_absent() {
        let mut style = Style::new();
        style.set_text("gene", "style", "line");
        assert_eq!(style.get_flag("gene", "style", None), None);
        assert_eq!(style.get_number("gene", "style", None), None);
        assert_eq!(style.get_color("gene", "style", None), None);
    }

    #[test]
    fn test_round_trip_preserves_every_getter() {
        let node = exon_node();
        let mut style = Style::new();
        style.set_number("exon", "width", 2.0);
        style.set_color("exon", "fill", Color::with_alpha(0.6, 0.9, 0.6, 0.8));
        style.set_flag("format", "show_grid", false);
        style.set_text("mRNA", "style", "caret");
        style.set_number_override("exon", "width", &node, 7.5);
        style.unset("mRNA", "style");

        let mut reloaded = Style::new();
        reloaded.load(&style.to_text()).unwrap();
        assert_eq!(reloaded, style);
        assert_eq!(reloaded.get_number("exon", "width", None), Some(2.0));
        assert_eq!(reloaded.get_number("exon", "width", Some(&node)), Some(7.5));
        assert_eq!(
            reloaded.get_color("exon", "fill", None),
            Some(Color::with_alpha(0.6, 0.9, 0.6, 0.8))
        );
        assert_eq!(reloaded.get_flag("format", "show_grid", None), Some(false));
        assert_eq!(reloaded.get_text("mRNA", "style", None), None);
    }

    #[test]
    fn test_load_failure_leaves_store_unmodified() {
        let mut style = Style::new();
        style.set_number("exon", "bar_height", 15.0);
        let err = style.load("{ not json ").unwrap_err();
        assert!(matches!(err, StyleError::Parse(_)));
        assert_eq!(style.get_number("exon", "bar_height", None), Some(15.0));
    }

    #[test]
    fn test_load_file_and_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sketch.style.json");
        let path = path.to_string_lossy();

        let mut style = Style::new();
        style.set_text("gene", "style", "box");
        style.to_file(&path).unwrap();

        let mut loaded = Style::new();
        loaded.load_file(&path).unwrap();
        assert_eq!(loaded, style);

        let missing = dir.path().join("nope.json");
        let err = loaded.load_file(&missing.to_string_lossy()).unwrap_err();
        assert!(matches!(err, StyleError::Io(_)));
        // failed load keeps the previous attribute set
        assert_eq!(loaded.get_text("gene", "style", None), Some("box"));
    }

    #[test]
    fn test_load_file_reports_parse_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "]]").unwrap();
        let mut style = Style::new();
        let err = style.load_file(&path.to_string_lossy()).unwrap_err();
        assert!(matches!(err, StyleError::Parse(_)));
    }

    #[test]
    fn test_override_precedence() {
        let node = exon_node();
        let other = exon_node();
        let mut style = Style::new();
        style.set_color("exon", "fill", Color::new(0.6, 0.9, 0.6));
        style.set_color_override("exon", "fill", &node, Color::new(1.0, 0.0, 0.0));

        assert_eq!(
            style.get_color("exon", "fill", Some(&node)),
            Some(Color::new(1.0, 0.0, 0.0))
        );
        assert_eq!(
            style.get_color("exon", "fill", Some(&other)),
            Some(Color::new(0.6, 0.9, 0.6))
        );
        assert_eq!(
            style.get_color("exon", "fill", None),
            Some(Color::new(0.6, 0.9, 0.6))
        );

        style.unset_override("exon", "fill", &node);
        assert_eq!(
            style.get_color("exon", "fill", Some(&node)),
            Some(Color::new(0.6, 0.9, 0.6))
        );
    }

    #[test]
    fn test_unset_keeps_override() {
        let node = exon_node();
        let mut style = Style::new();
        style.set_number("exon", "width", 2.0);
        style.set_number_override("exon", "width", &node, 7.5);
        style.unset("exon", "width");
        assert_eq!(style.get_number("exon", "width", None), None);
        assert_eq!(style.get_number("exon", "width", Some(&node)), Some(7.5));
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let mut style = Style::new();
        style.set_number("exon", "width", 2.0);
        let mut copy = style.deep_clone();
        copy.set_number("exon", "width", 99.0);
        copy.set_flag("gene", "collapse", true);
        assert_eq!(style.get_number("exon", "width", None), Some(2.0));
        assert_eq!(style.get_flag("gene", "collapse", None), None);
    }

    #[test]
    fn test_format_section_fallback() {
        let mut style = Style::new();
        style.set_number("format", "bar_height", 15.0);
        assert_eq!(style.get_number_or("exon", "bar_height", None, 7.0), 15.0);
        style.set_number("exon", "bar_height", 42.0);
        assert_eq!(style.get_number_or("exon", "bar_height", None, 7.0), 42.0);
        style.unset("exon", "bar_height");
        style.unset("format", "bar_height");
        assert_eq!(style.get_number_or("exon", "bar_height", None, 7.0), 7.0);
    }

    #[test]
    fn test_sections_and_keys_are_sorted() {
        let mut style = Style::new();
        style.set_number("gene", "bar_height", 23.0);
        style.set_number("exon", "bar_height", 42.0);
        style.set_text("exon", "style", "box");
        assert_eq!(style.sections(), vec!["exon", "gene"]);
        assert_eq!(style.keys("exon"), vec!["bar_height", "style"]);
        assert!(style.keys("intron").is_empty());
    }

    #[test]
    fn test_builtin_default_style() {
        let style = Style::default();
        assert!(style.get_color("gene", "fill", None).is_some());
        assert!(style.get_color("exon", "fill", None).is_some());
        assert_eq!(style.get_flag("exon", "collapse_to_parent", None), Some(true));
        assert!(style.get_number("format", "bar_height", None).is_some());
    }
}
