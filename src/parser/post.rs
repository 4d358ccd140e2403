//! Post-processing: the passes that run after top-level parsing succeeds
//! and turn the raw declaration harvest into a consistent model.
//!
//! 1. ANY-typed element types are related to every element type in both
//!    directions.
//! 2. Every element type referenced from a content model must have been
//!    declared.
//! 3. Every notation named by a NOTATION attribute enumeration or an
//!    unparsed entity must have been declared.
//! 4. When the caller supplied no prefix table, one is derived from the
//!    `xmlns` attribute declarations and every name is resolved against
//!    it.
//! 5. Attributes that declare namespace bindings are flagged.
//!
//! Errors raised here carry no line or column.

use std::collections::{HashMap, HashSet};

use crate::dtd::{AttributeType, ContentSpec, ContentType, Group, Particle};
use crate::error::{DtdError, Result};
use crate::name::{XmlName, XMLNS};
use crate::parser::DtdParser;

impl DtdParser {
    pub(crate) fn post_process(&mut self) -> Result<()> {
        self.update_any_parents();
        self.check_element_type_references()?;
        self.check_notation_references()?;
        if self.namespace_uris.is_none() {
            self.resolve_namespaces()?;
        }
        self.flag_namespace_declarations();
        Ok(())
    }

    /// Declaration scanning cannot record the relations of an ANY content
    /// model, so complete them here: every element type (itself included)
    /// becomes a child of the ANY-typed one, and the ANY-typed one a
    /// parent of every element type.
    fn update_any_parents(&mut self) {
        let any_types: Vec<XmlName> = self
            .dtd
            .element_types
            .values()
            .filter(|element| element.content_type() == Some(ContentType::Any))
            .map(|element| element.name.clone())
            .collect();
        if any_types.is_empty() {
            return;
        }
        let all_types: Vec<XmlName> = self.dtd.element_types.keys().cloned().collect();
        for parent in &any_types {
            for child in &all_types {
                self.dtd
                    .element_types
                    .get_mut(parent)
                    .expect("ANY element type exists")
                    .children
                    .insert(child.clone());
                self.dtd
                    .element_types
                    .get_mut(child)
                    .expect("related element type exists")
                    .parents
                    .insert(parent.clone());
            }
        }
    }

    fn check_element_type_references(&self) -> Result<()> {
        for element in self.dtd.element_types.values() {
            for child in &element.children {
                if !self.declared_element_types.contains(child) {
                    return Err(DtdError::PostProcess(format!(
                        "Element type {} is referenced in element type {} but is never defined.",
                        child.universal_name(),
                        element.name.universal_name()
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_notation_references(&self) -> Result<()> {
        for element in self.dtd.element_types.values() {
            for attribute in element.attributes.values() {
                if attribute.att_type != AttributeType::Notation {
                    continue;
                }
                for notation in &attribute.enums {
                    if !self.dtd.notations.contains_key(notation) {
                        return Err(DtdError::PostProcess(format!(
                            "Notation {} not defined. Used by the {} attribute of the {} element type.",
                            notation,
                            attribute.name.universal_name(),
                            element.name.universal_name()
                        )));
                    }
                }
            }
        }
        for entity in self.dtd.unparsed_entities.values() {
            if !self.dtd.notations.contains_key(&entity.notation) {
                return Err(DtdError::PostProcess(format!(
                    "Notation {} not defined. Used by the {} unparsed entity.",
                    entity.notation, entity.name
                )));
            }
        }
        Ok(())
    }

    fn resolve_namespaces(&mut self) -> Result<()> {
        self.build_namespace_uris()?;
        self.resolve_names()
    }

    /// Derive the prefix table from CDATA attributes named `xmlns` or
    /// `xmlns:prefix` that carry a default value.
    ///
    /// A prefix may be declared repeatedly only with one and the same URI,
    /// two prefixes may not share a URI, and an empty default is forbidden
    /// — namespaces cannot be undeclared from a DTD. Under these rules
    /// qualified names are unique proxies for expanded names.
    fn build_namespace_uris(&mut self) -> Result<()> {
        let mut uris: HashMap<String, String> = HashMap::new();
        for element in self.dtd.element_types.values() {
            for attribute in element.attributes.values() {
                if attribute.att_type != AttributeType::Cdata {
                    continue;
                }
                let Some(qualified) = attribute.name.qualified_name() else {
                    continue;
                };
                let prefix = match qualified.split_once(':') {
                    None => {
                        if qualified != XMLNS {
                            continue;
                        }
                        ""
                    }
                    Some((head, rest)) => {
                        if head != XMLNS {
                            continue;
                        }
                        rest
                    }
                };
                let Some(default_value) = attribute.default_value() else {
                    continue;
                };
                if default_value.is_empty() {
                    return Err(DtdError::PostProcess(format!(
                        "xmlns attributes may not have a default value equal to the empty string: {qualified}"
                    )));
                }
                if let Some(existing) = uris.get(prefix).cloned() {
                    if existing == default_value {
                        // The same binding declared twice is allowed; drop
                        // it so the shared-URI check below only sees other
                        // prefixes.
                        uris.remove(prefix);
                    } else {
                        return Err(DtdError::PostProcess(format!(
                            "Prefix {prefix} mapped to two different URIs: {existing} and {default_value}"
                        )));
                    }
                }
                if uris.values().any(|uri| uri == default_value) {
                    return Err(DtdError::PostProcess(format!(
                        "More than one prefix mapped to the same URI: {default_value}"
                    )));
                }
                uris.insert(prefix.to_owned(), default_value.to_owned());
            }
        }
        self.namespace_uris = Some(uris);
        Ok(())
    }

    /// Resolve every stored name against the derived table and re-key the
    /// maps, since resolution changes a name's identity.
    ///
    /// Element type names resolve whether or not they carry a colon — the
    /// default namespace may have been declared. Attribute names resolve
    /// only when prefixed; unprefixed attributes are in no namespace.
    fn resolve_names(&mut self) -> Result<()> {
        let uris = self.namespace_uris.clone().expect("namespace table was built");
        let element_types = std::mem::take(&mut self.dtd.element_types);
        let mut resolved = HashMap::with_capacity(element_types.len());
        for (_, mut element) in element_types {
            element.name.resolve_namespace(&uris)?;

            let children = std::mem::take(&mut element.children);
            element.children = children
                .into_iter()
                .map(|mut name| -> Result<XmlName> {
                    name.resolve_namespace(&uris)?;
                    Ok(name)
                })
                .collect::<Result<HashSet<XmlName>>>()?;
            let parents = std::mem::take(&mut element.parents);
            element.parents = parents
                .into_iter()
                .map(|mut name| -> Result<XmlName> {
                    name.resolve_namespace(&uris)?;
                    Ok(name)
                })
                .collect::<Result<HashSet<XmlName>>>()?;

            if let Some(ContentSpec::Mixed(group) | ContentSpec::Children(group)) =
                element.content_spec.as_mut()
            {
                resolve_group(group, &uris)?;
            }

            let attributes = std::mem::take(&mut element.attributes);
            let mut resolved_attributes = HashMap::with_capacity(attributes.len());
            for (_, mut attribute) in attributes {
                if attribute.name.local_name().contains(':') {
                    attribute.name.resolve_namespace(&uris)?;
                }
                resolved_attributes.insert(attribute.name.clone(), attribute);
            }
            element.attributes = resolved_attributes;

            resolved.insert(element.name.clone(), element);
        }
        self.dtd.element_types = resolved;

        // Resolve the declared-name set as well so later parses of the
        // same parser do not see stale keys. (The reference-closure check
        // above ran before resolution, against the unresolved names.)
        let declared = std::mem::take(&mut self.declared_element_types);
        self.declared_element_types = declared
            .into_iter()
            .map(|mut name| -> Result<XmlName> {
                name.resolve_namespace(&uris)?;
                Ok(name)
            })
            .collect::<Result<HashSet<XmlName>>>()?;
        Ok(())
    }

    fn flag_namespace_declarations(&mut self) {
        for element in self.dtd.element_types.values_mut() {
            for attribute in element.attributes.values_mut() {
                if !attribute.name.is_namespace_aware()
                    || attribute.att_type != AttributeType::Cdata
                    || attribute.default_value().is_none()
                {
                    continue;
                }
                if attribute.name.prefix() == Some(XMLNS)
                    || attribute.name.local_name() == XMLNS
                {
                    attribute.is_namespace_declaration = true;
                }
            }
        }
    }
}

fn resolve_group(group: &mut Group, uris: &HashMap<String, String>) -> Result<()> {
    for member in &mut group.members {
        match member {
            Particle::Reference(reference) => reference.name.resolve_namespace(uris)?,
            Particle::Group(inner) => resolve_group(inner, uris)?,
        }
    }
    Ok(())
}
