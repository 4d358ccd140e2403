//! The logical model of a parsed DTD.
//!
//! A [`Dtd`] owns every model object. Element types cross-reference each
//! other (parent/child links form cycles), so those links are stored as
//! [`XmlName`](crate::name::XmlName) keys resolved through the owning
//! element-type map rather than as direct references. The model is built
//! during parsing and read-only once the `Dtd` is returned.

mod attribute;
mod content;
mod element;
mod entity;
mod notation;

use std::collections::HashMap;

pub use attribute::{Attribute, AttributeDefault, AttributeType};
pub use content::{Group, GroupKind, Particle, Reference};
pub use element::{ContentSpec, ContentType, ElementType};
pub use entity::{EntityKind, ParameterEntity, ParsedGeneralEntity, UnparsedEntity};
pub use notation::Notation;

use crate::name::XmlName;

#[derive(Debug, Default)]
pub struct Dtd {
    pub(crate) element_types: HashMap<XmlName, ElementType>,
    pub(crate) notations: HashMap<String, Notation>,
    pub(crate) parameter_entities: HashMap<String, ParameterEntity>,
    pub(crate) parsed_general_entities: HashMap<String, ParsedGeneralEntity>,
    pub(crate) unparsed_entities: HashMap<String, UnparsedEntity>,
}

impl Dtd {
    /// Element types keyed by their [`XmlName`].
    pub fn element_types(&self) -> &HashMap<XmlName, ElementType> {
        &self.element_types
    }

    pub fn element_type(&self, name: &XmlName) -> Option<&ElementType> {
        self.element_types.get(name)
    }

    /// Notations keyed by name.
    pub fn notations(&self) -> &HashMap<String, Notation> {
        &self.notations
    }

    /// Parameter entities keyed by name. These are consumed during parsing
    /// and retained for introspection only; nothing in the content models
    /// refers back to them.
    pub fn parameter_entities(&self) -> &HashMap<String, ParameterEntity> {
        &self.parameter_entities
    }

    /// Parsed general entities keyed by name. Parsed general and unparsed
    /// entities share one name space: a name declared as either kind
    /// precludes redeclaration as the other.
    pub fn parsed_general_entities(&self) -> &HashMap<String, ParsedGeneralEntity> {
        &self.parsed_general_entities
    }

    /// Unparsed entities keyed by name.
    pub fn unparsed_entities(&self) -> &HashMap<String, UnparsedEntity> {
        &self.unparsed_entities
    }

    /// Fetch the element type for `name`, creating an empty one if it does
    /// not exist yet.
    ///
    /// Content models routinely refer to element types before their
    /// declaration is seen; the referenced type is allocated here on first
    /// contact and filled in when (and if) its declaration arrives.
    pub(crate) fn create_element_type(&mut self, name: XmlName) -> &mut ElementType {
        self.element_types
            .entry(name.clone())
            .or_insert_with(|| ElementType::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_element_type_is_idempotent() {
        let mut dtd = Dtd::default();
        let name = XmlName::with_parts(None, "book", None).unwrap();
        dtd.create_element_type(name.clone());
        dtd.create_element_type(name.clone());
        assert_eq!(dtd.element_types().len(), 1);
        assert_eq!(dtd.element_type(&name).unwrap().name(), &name);
    }
}
