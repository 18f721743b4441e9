//! Script and declaration data model
//!
//! A script is an ordered list of resource declarations. Grammar is handled
//! upstream; this crate consumes the already-parsed form. Declarations are
//! immutable once loaded.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One attribute value in a declaration: either a literal or a reference to
/// a sibling declaration's output, written `otherName.attribute` in source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    Literal(serde_json::Value),
    Reference { target: String, attribute: String },
}

impl AttributeValue {
    /// Parse a raw string into a value, treating `name.attr` as a reference.
    pub fn parse(raw: &str) -> Result<Self> {
        if let Some((target, attribute)) = raw.split_once('.') {
            if target.is_empty() || attribute.is_empty() {
                return Err(CoreError::MalformedReference(raw.to_string()));
            }
            return Ok(AttributeValue::Reference {
                target: target.to_string(),
                attribute: attribute.to_string(),
            });
        }
        Ok(AttributeValue::Literal(serde_json::Value::String(
            raw.to_string(),
        )))
    }

    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        AttributeValue::Literal(value.into())
    }

    pub fn reference(target: impl Into<String>, attribute: impl Into<String>) -> Self {
        AttributeValue::Reference {
            target: target.into(),
            attribute: attribute.into(),
        }
    }

    /// The referenced declaration name, if this value is a reference.
    pub fn reference_target(&self) -> Option<&str> {
        match self {
            AttributeValue::Reference { target, .. } => Some(target),
            AttributeValue::Literal(_) => None,
        }
    }
}

/// A single named resource declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    /// Name, unique within a script
    pub name: String,

    /// Resource kind tag (e.g. "Std::Vpc")
    pub kind: String,

    /// Attribute name -> literal or reference
    pub attributes: HashMap<String, AttributeValue>,

    /// Line in the source script, used for breakpoints
    pub source_line: Option<u32>,
}

impl ResourceDeclaration {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            attributes: HashMap::new(),
            source_line: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.source_line = Some(line);
        self
    }

    /// Names of sibling declarations this one references, sorted and deduped.
    pub fn references(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = self
            .attributes
            .values()
            .filter_map(AttributeValue::reference_target)
            .collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }
}

/// A named, versioned script: an ordered set of declarations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub id: String,
    pub version: String,
    pub declarations: Vec<ResourceDeclaration>,
}

impl Script {
    /// Build a script, enforcing name uniqueness across declarations.
    pub fn new(
        id: impl Into<String>,
        version: impl Into<String>,
        declarations: Vec<ResourceDeclaration>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for decl in &declarations {
            if !seen.insert(decl.name.as_str()) {
                return Err(CoreError::DuplicateName(decl.name.clone()));
            }
        }
        Ok(Self {
            id: id.into(),
            version: version.into(),
            declarations,
        })
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDeclaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Declaration declared at the given source line, if any.
    pub fn declaration_at_line(&self, line: u32) -> Option<&ResourceDeclaration> {
        self.declarations
            .iter()
            .find(|d| d.source_line == Some(line))
    }
}
