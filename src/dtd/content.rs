//! Content-model particles.
//!
//! A content model is a tree of particles: groups (choice or sequence)
//! whose members are further groups or references to element types. Each
//! particle carries the required/repeatable pair derived from its
//! frequency modifier (`?` optional, `+` required-repeatable, `*`
//! optional-repeatable, none required-once).

use crate::name::XmlName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Choice,
    Sequence,
}

#[derive(Debug, Clone)]
pub enum Particle {
    Group(Group),
    Reference(Reference),
}

impl Particle {
    pub fn is_required(&self) -> bool {
        match self {
            Particle::Group(g) => g.is_required,
            Particle::Reference(r) => r.is_required,
        }
    }

    pub fn is_repeatable(&self) -> bool {
        match self {
            Particle::Group(g) => g.is_repeatable,
            Particle::Reference(r) => r.is_repeatable,
        }
    }
}

/// A parenthesized list of particles joined by a single separator.
///
/// The separator fixes the kind on first sight; a group that closes
/// without ever seeing one (a single content particle) counts as a
/// sequence.
#[derive(Debug, Clone)]
pub struct Group {
    pub(crate) kind: GroupKind,
    pub(crate) members: Vec<Particle>,
    pub(crate) is_required: bool,
    pub(crate) is_repeatable: bool,
}

impl Group {
    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// Members in source order.
    pub fn members(&self) -> &[Particle] {
        &self.members
    }

    pub fn is_required(&self) -> bool {
        self.is_required
    }

    pub fn is_repeatable(&self) -> bool {
        self.is_repeatable
    }

    /// All references in this group and its subgroups, in source order.
    pub fn references(&self) -> Vec<&Reference> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a Reference>) {
        for member in &self.members {
            match member {
                Particle::Reference(r) => out.push(r),
                Particle::Group(g) => g.collect_references(out),
            }
        }
    }
}

/// A reference to an element type within a content model.
///
/// The target is named, not owned; look it up in the DTD's element-type
/// map.
#[derive(Debug, Clone)]
pub struct Reference {
    pub(crate) name: XmlName,
    pub(crate) is_required: bool,
    pub(crate) is_repeatable: bool,
}

impl Reference {
    /// Name of the referenced element type.
    pub fn element_name(&self) -> &XmlName {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.is_required
    }

    pub fn is_repeatable(&self) -> bool {
        self.is_repeatable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(name: &str) -> Particle {
        Particle::Reference(Reference {
            name: XmlName::with_parts(None, name, None).unwrap(),
            is_required: true,
            is_repeatable: false,
        })
    }

    #[test]
    fn references_are_collected_in_source_order() {
        let inner = Group {
            kind: GroupKind::Choice,
            members: vec![reference("b"), reference("c")],
            is_required: true,
            is_repeatable: false,
        };
        let outer = Group {
            kind: GroupKind::Sequence,
            members: vec![reference("a"), Particle::Group(inner), reference("d")],
            is_required: true,
            is_repeatable: false,
        };
        let names: Vec<_> = outer
            .references()
            .iter()
            .map(|r| r.element_name().local_name().to_owned())
            .collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }
}
