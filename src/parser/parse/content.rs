//! The content-model grammar.
//!
//! ```text
//! [46] contentspec ::= 'EMPTY' | 'ANY' | Mixed | children
//! [47] children    ::= (choice | seq) ('?' | '*' | '+')?
//! [48] cp          ::= (Name | choice | seq) ('?' | '*' | '+')?
//! [49] choice      ::= '(' S? cp ( S? '|' S? cp )* S? ')'
//! [50] seq         ::= '(' S? cp ( S? ',' S? cp )* S? ')'
//! [51] Mixed       ::= '(' S? '#PCDATA' (S? '|' S? Name)* S? ')*'
//!                    | '(' S? '#PCDATA' S? ')'
//! ```
//!
//! A group's kind is fixed by the first separator encountered; mixing the
//! two within one group is fatal. Every reference creates or fetches the
//! target element type and records the mutual parent/child link.

use crate::dtd::{ContentSpec, Group, GroupKind, Particle, Reference};
use crate::error::Result;
use crate::name::XmlName;
use crate::parser::DtdParser;

impl DtdParser {
    /// Parse the content spec of `element_name`'s declaration and attach
    /// it.
    pub(crate) fn parse_content_model(&mut self, element_name: &XmlName) -> Result<()> {
        if self.is_char('(')? {
            // Whitespace may precede the '#' of mixed content, as in
            // ( #PCDATA | B )*.
            self.discard_whitespace()?;
            if self.is_char('#')? {
                self.parse_mixed_content(element_name)?;
            } else {
                let group = self.parse_group(element_name)?;
                self.set_content_spec(element_name, ContentSpec::Children(group));
            }
        } else if self.is_string("EMPTY")? {
            self.set_content_spec(element_name, ContentSpec::Empty);
        } else if self.is_string("ANY")? {
            self.set_content_spec(element_name, ContentSpec::Any);
        } else {
            return Err(self.syntax_error("Invalid element type declaration."));
        }
        Ok(())
    }

    fn set_content_spec(&mut self, element_name: &XmlName, spec: ContentSpec) {
        let element = self
            .dtd
            .element_types
            .get_mut(element_name)
            .expect("declared element type exists");
        element.content_spec = Some(spec);
    }

    /// Parse a choice or sequence; the opening '(' is already consumed.
    fn parse_group(&mut self, parent: &XmlName) -> Result<Group> {
        let mut members = Vec::new();
        let mut kind: Option<GroupKind> = None;
        loop {
            self.discard_whitespace()?;
            self.parse_content_particle(&mut members, parent)?;
            self.discard_whitespace()?;
            if self.is_char('|')? {
                match kind {
                    None => kind = Some(GroupKind::Choice),
                    Some(GroupKind::Sequence) => {
                        return Err(
                            self.syntax_error("Invalid mixture of ',' and '|' in content model.")
                        );
                    }
                    Some(GroupKind::Choice) => {}
                }
            } else if self.is_char(',')? {
                match kind {
                    None => kind = Some(GroupKind::Sequence),
                    Some(GroupKind::Choice) => {
                        return Err(
                            self.syntax_error("Invalid mixture of ',' and '|' in content model.")
                        );
                    }
                    Some(GroupKind::Sequence) => {}
                }
            } else if self.is_char(')')? {
                let (is_required, is_repeatable) = self.scan_frequency()?;
                // A group with a single content particle counts as a
                // sequence.
                return Ok(Group {
                    kind: kind.unwrap_or(GroupKind::Sequence),
                    members,
                    is_required,
                    is_repeatable,
                });
            }
        }
    }

    /// cp: a sub-group or a reference, with an optional frequency
    /// modifier.
    fn parse_content_particle(
        &mut self,
        members: &mut Vec<Particle>,
        parent: &XmlName,
    ) -> Result<()> {
        if self.is_char('(')? {
            let group = self.parse_group(parent)?;
            members.push(Particle::Group(group));
        } else {
            let name = self.add_content_reference(parent, false)?;
            let (is_required, is_repeatable) = self.scan_frequency()?;
            members.push(Particle::Reference(Reference {
                name,
                is_required,
                is_repeatable,
            }));
        }
        Ok(())
    }

    /// The frequency modifier, as (is_required, is_repeatable).
    fn scan_frequency(&mut self) -> Result<(bool, bool)> {
        if self.is_char('?')? {
            Ok((false, false))
        } else if self.is_char('+')? {
            Ok((true, true))
        } else if self.is_char('*')? {
            Ok((false, true))
        } else {
            Ok((true, false))
        }
    }

    /// Mixed content; '(' S? '#' are already consumed.
    fn parse_mixed_content(&mut self, parent: &XmlName) -> Result<()> {
        self.discard_whitespace()?;
        self.require_string("PCDATA")?;
        self.discard_whitespace()?;
        if self.is_char('|')? {
            // (#PCDATA | A | B)* — an optional, repeatable choice whose
            // references must be distinct element types.
            let mut members = Vec::new();
            loop {
                self.discard_whitespace()?;
                let name = self.add_content_reference(parent, true)?;
                members.push(Particle::Reference(Reference {
                    name,
                    is_required: true,
                    is_repeatable: false,
                }));
                self.discard_whitespace()?;
                if !self.is_char('|')? {
                    break;
                }
            }
            self.require_string(")*")?;
            let group = Group {
                kind: GroupKind::Choice,
                members,
                is_required: false,
                is_repeatable: true,
            };
            self.set_content_spec(parent, ContentSpec::Mixed(group));
        } else {
            // PCDATA-only; the (#PCDATA)* spelling is accepted too.
            self.set_content_spec(parent, ContentSpec::Pcdata);
            self.require_char(')')?;
            self.is_char('*')?;
        }
        Ok(())
    }

    /// Scan an element-type reference, creating the target on first sight
    /// and linking it with `parent` in both directions.
    fn add_content_reference(&mut self, parent: &XmlName, mixed: bool) -> Result<XmlName> {
        let child = self.scan_xml_name()?;
        self.dtd.create_element_type(child.clone());
        if mixed
            && self
                .dtd
                .element_types
                .get(parent)
                .is_some_and(|p| p.children.contains(&child))
        {
            return Err(self.semantic_error(format!(
                "The element type {} appeared more than once in the declaration \
                 of mixed content for the element type {}.",
                child.universal_name(),
                parent.universal_name()
            )));
        }
        self.dtd
            .element_types
            .get_mut(parent)
            .expect("parent element type exists")
            .children
            .insert(child.clone());
        self.dtd
            .element_types
            .get_mut(&child)
            .expect("child element type exists")
            .parents
            .insert(parent.clone());
        Ok(child)
    }
}
