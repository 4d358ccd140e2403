//! Element type declarations.

use std::collections::{HashMap, HashSet};

use super::attribute::Attribute;
use super::content::Group;
use crate::name::XmlName;

/// The five-way content classification of a declared element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Empty,
    Any,
    Pcdata,
    Mixed,
    Element,
}

/// `contentspec` of an element type declaration.
///
/// `Mixed` and `Children` own the root content group; `Pcdata` covers both
/// `(#PCDATA)` and `(#PCDATA)*`.
#[derive(Debug, Clone)]
pub enum ContentSpec {
    Empty,
    Any,
    Pcdata,
    Mixed(Group),
    Children(Group),
}

impl ContentSpec {
    pub fn content_type(&self) -> ContentType {
        match self {
            ContentSpec::Empty => ContentType::Empty,
            ContentSpec::Any => ContentType::Any,
            ContentSpec::Pcdata => ContentType::Pcdata,
            ContentSpec::Mixed(_) => ContentType::Mixed,
            ContentSpec::Children(_) => ContentType::Element,
        }
    }
}

/// A declared (or merely referenced) element type.
///
/// An `ElementType` comes into existence on first reference; its
/// `content_spec` stays `None` until the `<!ELEMENT>` declaration is seen.
/// `children` and `parents` are a mutual index over the DTD's element-type
/// map: every entry here names another `ElementType` owned by the same
/// [`Dtd`](super::Dtd).
#[derive(Debug)]
pub struct ElementType {
    pub(crate) name: XmlName,
    pub(crate) content_spec: Option<ContentSpec>,
    pub(crate) attributes: HashMap<XmlName, Attribute>,
    pub(crate) children: HashSet<XmlName>,
    pub(crate) parents: HashSet<XmlName>,
}

impl ElementType {
    pub(crate) fn new(name: XmlName) -> Self {
        ElementType {
            name,
            content_spec: None,
            attributes: HashMap::new(),
            children: HashSet::new(),
            parents: HashSet::new(),
        }
    }

    pub fn name(&self) -> &XmlName {
        &self.name
    }

    pub fn content_spec(&self) -> Option<&ContentSpec> {
        self.content_spec.as_ref()
    }

    pub fn content_type(&self) -> Option<ContentType> {
        self.content_spec.as_ref().map(ContentSpec::content_type)
    }

    /// The root content group, present for mixed and element content.
    pub fn content(&self) -> Option<&Group> {
        match self.content_spec.as_ref()? {
            ContentSpec::Mixed(group) | ContentSpec::Children(group) => Some(group),
            _ => None,
        }
    }

    pub fn attributes(&self) -> &HashMap<XmlName, Attribute> {
        &self.attributes
    }

    pub fn attribute(&self, name: &XmlName) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Names of the element types that may occur directly within this one.
    pub fn children(&self) -> &HashSet<XmlName> {
        &self.children
    }

    /// Names of the element types within which this one may occur.
    pub fn parents(&self) -> &HashSet<XmlName> {
        &self.parents
    }
}
