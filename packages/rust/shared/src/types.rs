//! Core domain types for the toolbox document tree.
//!
//! Documents arrive as untyped JSON. They are shape-checked exactly once,
//! here, into [`Manifest`] (root) or [`UnitDocument`] (per category), so
//! nothing downstream handles raw trees except opaque [`Entry`] payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, ToolboxError};

/// A parsed transport response. No schema beyond "structured data".
pub type Document = Value;

/// Root manifest location relative to the serving root.
pub const DEFAULT_ROOT_PATH: &str = "tools/config.json";

/// Directory prefix already implied by the sub-document naming convention.
const CATEGORIES_PREFIX: &str = "/tools/categories";

/// Sub-document naming convention: `tools/categories/<unit>/config.json`.
const CATEGORIES_DIR: &str = "tools/categories";
const UNIT_DOCUMENT_NAME: &str = "config.json";

/// Keys owned by [`Unit`] itself; never carried through as extra fields.
const RESERVED_KEYS: [&str; 7] = ["id", "name", "icon", "path", "expanded", "tools", "status"];

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// One category as declared in the root manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    /// Stable identifier.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Icon token, resolved to a glyph by the presentation layer.
    pub icon: String,
    /// Source path fragment used to derive the sub-document path.
    pub path: String,
    /// Any additional descriptor fields, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Why this descriptor cannot be loaded, if it is unusable.
    #[serde(skip)]
    pub defect: Option<String>,
}

impl UnitDescriptor {
    /// Recover what we can from a descriptor that failed strict parsing.
    ///
    /// Scalar ids are stringified, a missing name falls back to the id and a
    /// missing icon to an empty token. Without a string `path` there is no
    /// sub-document to load, so the descriptor is marked defective.
    fn salvage(index: usize, item: &Value, error: &str) -> Self {
        let obj = item.as_object();
        let field = |key: &str| obj.and_then(|o| o.get(key)).and_then(scalar_string);

        let id = field("id").unwrap_or_else(|| format!("category-{index}"));
        let name = field("name").unwrap_or_else(|| id.clone());
        let icon = field("icon").unwrap_or_default();
        let path = obj
            .and_then(|o| o.get("path"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        let mut extra = obj.cloned().unwrap_or_default();
        strip_reserved(&mut extra);

        let defect = match &path {
            Some(_) => {
                warn!(index, %id, %error, "incomplete category descriptor, using defaults");
                None
            }
            None => {
                warn!(index, %id, %error, "category descriptor has no usable path");
                Some(format!("invalid category descriptor: {error}"))
            }
        };

        Self {
            id,
            name,
            icon,
            path: path.unwrap_or_default(),
            extra,
            defect,
        }
    }
}

/// The root document: an ordered list of unit descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub categories: Vec<UnitDescriptor>,
}

impl Manifest {
    /// Shape-check a root document.
    ///
    /// Fails with [`ToolboxError::MalformedRoot`] if the document is not an
    /// object or has no `categories` sequence. Individual descriptors never
    /// fail the manifest: incomplete ones are salvaged, and ones without a
    /// usable `path` carry a [`UnitDescriptor::defect`].
    pub fn from_document(doc: &Document) -> Result<Self> {
        let obj = doc
            .as_object()
            .ok_or_else(|| ToolboxError::malformed_root("root document is not an object"))?;

        let categories = match obj.get("categories") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ToolboxError::malformed_root(format!(
                    "`categories` is {}, expected a sequence",
                    kind_of(other)
                )));
            }
            None => return Err(ToolboxError::malformed_root("missing `categories` sequence")),
        };

        let categories = categories
            .iter()
            .enumerate()
            .map(|(i, item)| {
                UnitDescriptor::deserialize(item)
                    .unwrap_or_else(|e| UnitDescriptor::salvage(i, item, &e.to_string()))
            })
            .collect();

        Ok(Self { categories })
    }
}

// ---------------------------------------------------------------------------
// Unit sub-document
// ---------------------------------------------------------------------------

/// One opaque leaf item of a unit. Fields are not interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(pub Value);

impl Entry {
    /// The entry's `name` field, if it has a string one.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// The entry's `id` field, if it has a string one.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }
}

/// A unit's sub-document, reduced to its entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitDocument {
    pub tools: Vec<Entry>,
}

impl UnitDocument {
    /// Shape-check a unit sub-document.
    ///
    /// A missing (or null) `tools` field is the same as `tools: []`. A
    /// `tools` field of any other non-sequence type, or a non-object
    /// document, is [`ToolboxError::MalformedUnit`].
    pub fn from_document(doc: &Document) -> Result<Self> {
        let obj = doc
            .as_object()
            .ok_or_else(|| ToolboxError::malformed_unit("unit document is not an object"))?;

        match obj.get("tools") {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::Array(items)) => Ok(Self {
                tools: items.iter().cloned().map(Entry).collect(),
            }),
            Some(other) => Err(ToolboxError::malformed_unit(format!(
                "`tools` is {}, expected a sequence",
                kind_of(other)
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// How a unit's entries were obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UnitStatus {
    /// Sub-document loaded with at least one entry.
    Loaded,
    /// Sub-document loaded but declares no entries.
    Empty,
    /// Sub-document unavailable or malformed; entries left empty.
    Failed { reason: String },
}

/// A unit descriptor materialized for one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub path: String,
    /// Presentation hint, defaulted from config.
    pub expanded: bool,
    /// Entries in sub-document order.
    pub tools: Vec<Entry>,
    pub status: UnitStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Unit {
    /// Materialize a descriptor with no entries yet.
    ///
    /// Status starts as `Empty` and is replaced once the sub-document
    /// settles. A defective descriptor starts, and stays, `Failed`.
    pub fn from_descriptor(descriptor: UnitDescriptor, expanded: bool) -> Self {
        let mut extra = descriptor.extra;
        strip_reserved(&mut extra);

        let status = match descriptor.defect {
            Some(reason) => UnitStatus::Failed { reason },
            None => UnitStatus::Empty,
        };

        Self {
            id: descriptor.id,
            name: descriptor.name,
            icon: descriptor.icon,
            path: descriptor.path,
            expanded,
            tools: Vec::new(),
            status,
            extra,
        }
    }

    /// Whether this unit still has a sub-document to load.
    pub fn needs_document(&self) -> bool {
        !matches!(self.status, UnitStatus::Failed { .. })
    }

    /// Path of this unit's sub-document, relative to the serving root.
    pub fn document_path(&self) -> String {
        unit_document_path(&self.path)
    }

    /// Merge a successfully parsed sub-document into the unit.
    pub fn apply(&mut self, doc: UnitDocument) {
        self.status = if doc.tools.is_empty() {
            UnitStatus::Empty
        } else {
            UnitStatus::Loaded
        };
        self.tools = doc.tools;
    }

    /// Mark the unit degraded. Entries stay empty.
    pub fn degrade(&mut self, reason: impl Into<String>) {
        self.tools.clear();
        self.status = UnitStatus::Failed {
            reason: reason.into(),
        };
    }
}

/// Derive a unit's sub-document path from its descriptor `path`.
///
/// A leading `/tools/categories` is stripped, then the remainder is placed
/// under `tools/categories/.../config.json`. Surrounding slashes on the
/// remainder are normalized.
pub fn unit_document_path(unit_path: &str) -> String {
    let remainder = unit_path
        .strip_prefix(CATEGORIES_PREFIX)
        .unwrap_or(unit_path)
        .trim_matches('/');

    if remainder.is_empty() {
        format!("{CATEGORIES_DIR}/{UNIT_DOCUMENT_NAME}")
    } else {
        format!("{CATEGORIES_DIR}/{remainder}/{UNIT_DOCUMENT_NAME}")
    }
}

fn strip_reserved(extra: &mut Map<String, Value>) {
    for key in RESERVED_KEYS {
        extra.remove(key);
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "an object",
    }
}
