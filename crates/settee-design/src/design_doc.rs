use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use md5::{Digest, Md5};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use settee_core::error::{Result, SetteeError};
use settee_core::json::{
    json_map_eq, json_slice_eq, to_json_tree, write_canonical, write_canonical_map,
    write_canonical_str,
};

const DESIGN_PREFIX: &str = "_design/";

// ---------------------------------------------------------------------------
// DesignDocument
// ---------------------------------------------------------------------------

/// A CouchDB design document.
///
/// Design documents store view definitions, list/show/update/filter
/// functions, URL rewrites, search indexes and the validation function.
/// Function bodies are opaque: they are stored and compared, never parsed.
///
/// Every container member defaults to empty and a JSON `null` reads as
/// empty, so a member that was never set and one set to an empty container
/// are the same value.
///
/// Equality covers the eight application members only. `_id`, `_rev` and
/// `language` are identity and metadata and do not participate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignDocument {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub views: HashMap<String, ViewDef>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub lists: HashMap<String, String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub shows: HashMap<String, String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub updates: HashMap<String, String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub filters: HashMap<String, String>,
    /// Rewrite rules, in evaluation order.
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub rewrites: Vec<Value>,
    /// Search indexes keyed by index name.
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Map::is_empty"
    )]
    pub indexes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_doc_update: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl DesignDocument {
    /// Create an empty design document named `name`.
    ///
    /// The id is `_design/{name}`; a name that already carries the prefix is
    /// used as is.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let id = if name.starts_with(DESIGN_PREFIX) {
            name
        } else {
            format!("{DESIGN_PREFIX}{name}")
        };
        DesignDocument {
            id,
            ..Default::default()
        }
    }

    /// Parse a design document from a JSON value.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            debug!(error = %e, "rejected design document payload");
            SetteeError::BadRequest(format!("invalid design doc: {}", e))
        })
    }

    /// Convert to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Get the design document name without the `_design/` prefix.
    pub fn name(&self) -> &str {
        self.id.strip_prefix(DESIGN_PREFIX).unwrap_or(&self.id)
    }

    /// Replace the rewrite rules. Accepts a JSON array, or `null` to clear.
    pub fn set_rewrites(&mut self, rewrites: Value) -> Result<()> {
        match rewrites {
            Value::Array(rules) => self.rewrites = rules,
            Value::Null => self.rewrites.clear(),
            other => {
                debug!(kind = json_kind(&other), "rejected rewrites");
                return Err(SetteeError::BadRequest(format!(
                    "rewrites must be a JSON array, got {}",
                    json_kind(&other)
                )));
            }
        }
        Ok(())
    }

    /// Replace the search indexes. Accepts a JSON object, or `null` to clear.
    pub fn set_indexes(&mut self, indexes: Value) -> Result<()> {
        match indexes {
            Value::Object(groups) => self.indexes = groups,
            Value::Null => self.indexes.clear(),
            other => {
                debug!(kind = json_kind(&other), "rejected indexes");
                return Err(SetteeError::BadRequest(format!(
                    "indexes must be a JSON object, got {}",
                    json_kind(&other)
                )));
            }
        }
        Ok(())
    }

    /// Replace the rewrite rules from any serializable list of records.
    pub fn rewrites_from<T: Serialize + ?Sized>(&mut self, rules: &T) -> Result<()> {
        self.set_rewrites(to_json_tree(rules)?)
    }

    /// Replace the search indexes from any serializable map.
    pub fn indexes_from<T: Serialize + ?Sized>(&mut self, indexes: &T) -> Result<()> {
        self.set_indexes(to_json_tree(indexes)?)
    }

    /// Whether `self` and `other` agree on one member.
    pub fn field_eq(&self, other: &Self, field: DesignField) -> bool {
        match field {
            DesignField::Views => self.views == other.views,
            DesignField::Lists => self.lists == other.lists,
            DesignField::Shows => self.shows == other.shows,
            DesignField::Updates => self.updates == other.updates,
            DesignField::Filters => self.filters == other.filters,
            DesignField::Rewrites => json_slice_eq(&self.rewrites, &other.rewrites),
            DesignField::Indexes => json_map_eq(&self.indexes, &other.indexes),
            DesignField::ValidateDocUpdate => {
                self.validate_doc_update == other.validate_doc_update
            }
        }
    }

    /// The members on which `self` and `other` differ, in declaration order.
    /// Empty exactly when the documents are equal.
    pub fn differing_fields(&self, other: &Self) -> Vec<DesignField> {
        DesignField::ALL
            .into_iter()
            .filter(|field| !self.field_eq(other, *field))
            .collect()
    }

    /// Canonical encoding of the eight application members.
    ///
    /// Maps are written in key order and JSON members via
    /// [`write_canonical`], so equal documents encode identically.
    pub fn canonical_form(&self) -> String {
        let mut out = String::new();
        for field in DesignField::ALL {
            write_canonical_str(field.as_str(), &mut out);
            match field {
                DesignField::Views => {
                    write_sorted(&self.views, &mut out, |view, out| {
                        write_opt_str(view.map.as_deref(), out);
                        write_opt_str(view.reduce.as_deref(), out);
                        write_opt_str(view.db_copy.as_deref(), out);
                    });
                }
                DesignField::Lists => write_functions(&self.lists, &mut out),
                DesignField::Shows => write_functions(&self.shows, &mut out),
                DesignField::Updates => write_functions(&self.updates, &mut out),
                DesignField::Filters => write_functions(&self.filters, &mut out),
                DesignField::Rewrites => {
                    out.push('[');
                    for rule in &self.rewrites {
                        write_canonical(rule, &mut out);
                    }
                    out.push(']');
                }
                DesignField::Indexes => write_canonical_map(&self.indexes, &mut out),
                DesignField::ValidateDocUpdate => {
                    write_opt_str(self.validate_doc_update.as_deref(), &mut out)
                }
            }
        }
        out
    }

    /// Hex MD5 digest of [`canonical_form`](Self::canonical_form).
    ///
    /// Equal documents have equal digests regardless of map insertion order,
    /// id or revision.
    pub fn digest(&self) -> String {
        let mut hasher = Md5::new();
        hasher.update(self.canonical_form().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl PartialEq for DesignDocument {
    fn eq(&self, other: &Self) -> bool {
        match DesignField::ALL
            .into_iter()
            .find(|field| !self.field_eq(other, *field))
        {
            Some(field) => {
                trace!(%field, "design documents differ");
                false
            }
            None => true,
        }
    }
}

impl Eq for DesignDocument {}

impl Hash for DesignDocument {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_form().hash(state);
    }
}

fn write_sorted<V>(
    map: &HashMap<String, V>,
    out: &mut String,
    write_value: impl Fn(&V, &mut String),
) {
    let mut entries: Vec<(&String, &V)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    out.push('{');
    for (name, value) in entries {
        write_canonical_str(name, out);
        write_value(value, out);
    }
    out.push('}');
}

fn write_functions(functions: &HashMap<String, String>, out: &mut String) {
    write_sorted(functions, out, |body, out| write_canonical_str(body, out));
}

fn write_opt_str(s: Option<&str>, out: &mut String) {
    match s {
        Some(s) => write_canonical_str(s, out),
        None => out.push('n'),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// ViewDef
// ---------------------------------------------------------------------------

/// A view definition: map function, optional reduce, and an optional
/// database the view output is copied into (`dbcopy`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce: Option<String>,
    #[serde(rename = "dbcopy", default, skip_serializing_if = "Option::is_none")]
    pub db_copy: Option<String>,
}

impl ViewDef {
    pub fn new(map: impl Into<String>) -> Self {
        ViewDef {
            map: Some(map.into()),
            ..Default::default()
        }
    }

    pub fn with_reduce(mut self, reduce: impl Into<String>) -> Self {
        self.reduce = Some(reduce.into());
        self
    }

    pub fn with_db_copy(mut self, db: impl Into<String>) -> Self {
        self.db_copy = Some(db.into());
        self
    }
}

// ---------------------------------------------------------------------------
// DesignField
// ---------------------------------------------------------------------------

/// The application members of a design document that take part in equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DesignField {
    Views,
    Lists,
    Shows,
    Updates,
    Filters,
    Rewrites,
    Indexes,
    ValidateDocUpdate,
}

impl DesignField {
    pub const ALL: [DesignField; 8] = [
        DesignField::Views,
        DesignField::Lists,
        DesignField::Shows,
        DesignField::Updates,
        DesignField::Filters,
        DesignField::Rewrites,
        DesignField::Indexes,
        DesignField::ValidateDocUpdate,
    ];

    /// The member's JSON key.
    pub fn as_str(self) -> &'static str {
        match self {
            DesignField::Views => "views",
            DesignField::Lists => "lists",
            DesignField::Shows => "shows",
            DesignField::Updates => "updates",
            DesignField::Filters => "filters",
            DesignField::Rewrites => "rewrites",
            DesignField::Indexes => "indexes",
            DesignField::ValidateDocUpdate => "validate_doc_update",
        }
    }
}

impl fmt::Display for DesignField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
