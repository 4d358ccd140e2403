//! Parses XML document type definitions — a standalone external subset or
//! the DOCTYPE declaration of an XML document — into a read-only model of
//! the DTD's logical structure: element types with their attributes and
//! content models, notations, and entity tables.
//!
//! The engine is a hand-rolled, character-level scanner with a layered
//! entity-expansion mechanism, a recursive content-model grammar, and a
//! conditional-section processor. External resources (the external subset,
//! external parameter entities) are fetched exclusively through a
//! caller-supplied [`EntityResolver`].
//!
//! ```
//! use exdtd::{ContentType, DtdParser, InputSource, XmlName};
//!
//! let mut parser = DtdParser::new();
//! let dtd = parser.parse_external_subset(
//!     InputSource::from_str("<!ELEMENT greeting (#PCDATA)>"),
//!     None,
//! )?;
//!
//! let greeting = XmlName::with_parts(None, "greeting", None)?;
//! assert_eq!(
//!     dtd.element_type(&greeting).and_then(|e| e.content_type()),
//!     Some(ContentType::Pcdata),
//! );
//! # Ok::<(), exdtd::DtdError>(())
//! ```

pub mod chvalid;
pub mod dtd;
pub mod error;
mod io;
mod name;
mod parser;

pub use crate::dtd::{
    Attribute, AttributeDefault, AttributeType, ContentSpec, ContentType, Dtd, ElementType,
    EntityKind, Group, GroupKind, Notation, ParameterEntity, ParsedGeneralEntity, Particle,
    Reference, UnparsedEntity,
};
pub use crate::error::{DtdError, DtdErrorKind};
pub use crate::io::{EntityResolver, InputSource};
pub use crate::name::{XmlName, UNIVERSAL_SEPARATOR, XMLNS_NAMESPACE, XML_NAMESPACE};
pub use crate::parser::DtdParser;
