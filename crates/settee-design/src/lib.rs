//! Design documents for Settee.
//!
//! Provides a `DesignDocument` type that models CouchDB design documents
//! as a value object: structural equality over its application members,
//! a `Hash` consistent with that equality, and an MD5 content digest.
//!
//! ```
//! use settee_design::{DesignDocument, ViewDef};
//!
//! let mut a = DesignDocument::new("myapp");
//! a.views.insert(
//!     "by_type".into(),
//!     ViewDef::new("function(doc) { emit(doc.type, 1); }").with_reduce("_count"),
//! );
//!
//! let mut b = DesignDocument::from_json(a.to_json()).unwrap();
//! assert_eq!(a, b);
//!
//! b.validate_doc_update = Some("function(newDoc) {}".into());
//! assert_ne!(a, b);
//! ```
mod design_doc;

pub use design_doc::{DesignDocument, DesignField, ViewDef};
pub use settee_core::error::{Result, SetteeError};
