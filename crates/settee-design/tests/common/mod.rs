//! Canonical design document fixtures.
//!
//! Every application member of a design document has one `Field` label with
//! a primary populator and an alternate mutation. Adding a member to
//! `DesignDocument` means adding a label here, or the equality tests stop
//! covering it.
#![allow(dead_code)]

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::{Value, json};
use settee_design::{DesignDocument, DesignField, ViewDef};

const MAP_FUNCTION: &str = "function(doc){emit(doc.hello);}";
const LIST_FUNCTION: &str = "function(head,req){ send(toJson(getRow); }";
const SHOW_FUNCTION: &str = "function(doc,req){ if(doc){return \"hello world!\"}";
const UPDATE_FUNCTION: &str = "function(doc,req){return [doc, 'Edited World!'];}";
const FILTER_FUNCTION: &str = "function(doc,req){return false;}";
const INDEX_FUNCTION: &str = "function(doc){....}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    MrView,
    ListFunction,
    ShowFunction,
    UpdateFunction,
    FilterFunction,
    RewriteRule,
    Indexes,
    ValidateDocUpdate,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::MrView,
        Field::ListFunction,
        Field::ShowFunction,
        Field::UpdateFunction,
        Field::FilterFunction,
        Field::RewriteRule,
        Field::Indexes,
        Field::ValidateDocUpdate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::MrView => "mrView",
            Field::ListFunction => "listFunction",
            Field::ShowFunction => "showFunction",
            Field::UpdateFunction => "updateFunction",
            Field::FilterFunction => "filterFunction",
            Field::RewriteRule => "rewriteRule",
            Field::Indexes => "indexes",
            Field::ValidateDocUpdate => "validateDocUpdate",
        }
    }

    /// The document member this label populates.
    pub fn design_field(self) -> DesignField {
        match self {
            Field::MrView => DesignField::Views,
            Field::ListFunction => DesignField::Lists,
            Field::ShowFunction => DesignField::Shows,
            Field::UpdateFunction => DesignField::Updates,
            Field::FilterFunction => DesignField::Filters,
            Field::RewriteRule => DesignField::Rewrites,
            Field::Indexes => DesignField::Indexes,
            Field::ValidateDocUpdate => DesignField::ValidateDocUpdate,
        }
    }

    /// Install the canonical content for this label, replacing the member.
    pub fn populate(self, ddoc: &mut DesignDocument) {
        match self {
            Field::MrView => {
                let view = ViewDef::new(MAP_FUNCTION)
                    .with_reduce("_stats")
                    .with_db_copy("myOtherDB");
                ddoc.views = HashMap::from([("helloWorldView".to_string(), view)]);
            }
            Field::ListFunction => {
                ddoc.lists = functions("myList", LIST_FUNCTION);
            }
            Field::ShowFunction => {
                ddoc.shows = functions("myShow", SHOW_FUNCTION);
            }
            Field::UpdateFunction => {
                ddoc.updates = functions("myUpdate", UPDATE_FUNCTION);
            }
            Field::FilterFunction => {
                ddoc.filters = functions("myFilter", FILTER_FUNCTION);
            }
            Field::RewriteRule => {
                ddoc.rewrites_from(&vec![rewrite("/")]).expect("rewrite fixture is an array");
            }
            Field::Indexes => {
                ddoc.indexes_from(&search_index("animal")).expect("index fixture is an object");
            }
            Field::ValidateDocUpdate => {
                ddoc.validate_doc_update =
                    Some("throw({ forbidden: 'Error message here.' });".into());
            }
        }
    }

    /// Perturb this label's member of an already populated document.
    pub fn alter(self, ddoc: &mut DesignDocument) {
        match self {
            Field::MrView => {
                let view = ViewDef::new(MAP_FUNCTION)
                    .with_reduce("_count")
                    .with_db_copy("myOtherDB");
                ddoc.views.insert("view2".into(), view);
            }
            Field::ListFunction => {
                ddoc.lists.insert("myList2".into(), LIST_FUNCTION.into());
            }
            Field::ShowFunction => {
                ddoc.shows.insert("myShow2".into(), SHOW_FUNCTION.into());
            }
            Field::UpdateFunction => {
                ddoc.updates.insert("myUpdate2".into(), UPDATE_FUNCTION.into());
            }
            Field::FilterFunction => {
                ddoc.filters.insert("myOtherFilter".into(), FILTER_FUNCTION.into());
            }
            Field::RewriteRule => {
                ddoc.rewrites_from(&vec![rewrite("/index.php")])
                    .expect("rewrite fixture is an array");
            }
            Field::Indexes => {
                ddoc.indexes_from(&search_index("movie")).expect("index fixture is an object");
            }
            Field::ValidateDocUpdate => {
                ddoc.validate_doc_update =
                    Some("throw({ unauthorized: 'Error message here.' });".into());
            }
        }
    }

    /// Set this label's member to its empty value through the public API.
    pub fn clear(self, ddoc: &mut DesignDocument) {
        match self {
            Field::MrView => ddoc.views = HashMap::new(),
            Field::ListFunction => ddoc.lists = HashMap::new(),
            Field::ShowFunction => ddoc.shows = HashMap::new(),
            Field::UpdateFunction => ddoc.updates = HashMap::new(),
            Field::FilterFunction => ddoc.filters = HashMap::new(),
            Field::RewriteRule => ddoc.set_rewrites(json!([])).expect("empty array"),
            Field::Indexes => ddoc.set_indexes(json!({})).expect("empty object"),
            Field::ValidateDocUpdate => ddoc.validate_doc_update = None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn functions(name: &str, body: &str) -> HashMap<String, String> {
    HashMap::from([(name.to_string(), body.to_string())])
}

fn rewrite(from: &str) -> HashMap<&'static str, Value> {
    HashMap::from([
        ("from", json!(from)),
        ("to", json!("index.html")),
        ("method", json!("GET")),
        ("query", json!({})),
    ])
}

fn search_index(name: &str) -> HashMap<String, HashMap<&'static str, &'static str>> {
    HashMap::from([(name.to_string(), HashMap::from([("index", INDEX_FUNCTION)]))])
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// A fresh document with the primary content of each label in `fields`.
pub fn populate(fields: impl IntoIterator<Item = Field>) -> DesignDocument {
    let mut ddoc = DesignDocument::default();
    for field in fields {
        field.populate(&mut ddoc);
    }
    ddoc
}

pub fn populate_all() -> DesignDocument {
    populate(Field::ALL)
}

pub fn populate_all_except(omitted: Field) -> DesignDocument {
    populate(Field::ALL.into_iter().filter(|f| *f != omitted))
}

pub fn populate_all_with_alternate(altered: Field) -> DesignDocument {
    let mut ddoc = populate_all();
    altered.alter(&mut ddoc);
    ddoc
}

pub fn std_hash(ddoc: &DesignDocument) -> u64 {
    let mut hasher = DefaultHasher::new();
    ddoc.hash(&mut hasher);
    hasher.finish()
}
