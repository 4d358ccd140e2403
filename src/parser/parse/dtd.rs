//! Markup declarations and conditional sections.
//!
//! ```text
//! [28] doctypedecl   ::= '<!DOCTYPE' S Name (S ExternalID)? S? ('[' intSubset ']' S?)? '>'
//! [29] markupdecl    ::= elementdecl | AttlistDecl | EntityDecl | NotationDecl | PI | Comment
//! [31] extSubsetDecl ::= ( markupdecl | conditionalSect | PEReference | S )*
//! [61] conditionalSect ::= includeSect | ignoreSect
//! ```

use std::collections::HashSet;

use crate::dtd::{
    Attribute, AttributeDefault, AttributeType, Notation, ParameterEntity, ParsedGeneralEntity,
    UnparsedEntity,
};
use crate::error::Result;
use crate::name::XmlName;
use crate::parser::{DtdKeyword, DtdParser, EntityState};

impl DtdParser {
    /// Parse from the start of an XML document: XML declaration, prolog
    /// miscellanea and the DOCTYPE declaration. The rest of the document
    /// is abandoned.
    pub(crate) fn parse_document(&mut self) -> Result<()> {
        if self.is_string("<?xml")? {
            self.parse_xml_decl()?;
        }
        self.parse_misc()?;
        self.parse_doctype_decl()
    }

    /// Misc: comments and processing instructions between declarations.
    fn parse_misc(&mut self) -> Result<()> {
        loop {
            self.discard_whitespace()?;
            if self.is_string("<!--")? {
                self.parse_comment()?;
            } else if self.is_string("<?")? {
                self.parse_pi()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_doctype_decl(&mut self) -> Result<()> {
        if !self.is_string("<!DOCTYPE")? {
            return Ok(());
        }

        self.require_whitespace()?;
        // The root element type name; only the subsets matter here.
        self.scan_name()?;

        let mut system_id = None;
        let mut public_id = None;
        if self.is_whitespace()? {
            self.discard_whitespace()?;
            if self.is_string("SYSTEM")? {
                system_id = Some(self.parse_system_literal()?);
                self.discard_whitespace()?;
            } else if self.is_string("PUBLIC")? {
                public_id = Some(self.parse_public_id()?);
                system_id = Some(self.parse_system_literal()?);
                self.discard_whitespace()?;
            }
        }

        if self.is_char('[')? {
            self.parse_internal_subset()?;
            self.require_char(']')?;
        }

        // The internal subset is parsed before the external resource is
        // opened, so its declarations win wherever a first-declaration
        // policy applies.
        if let Some(system_id) = system_id {
            self.push_resolved_frame(public_id.as_deref(), Some(&system_id))?;
            self.external_subset(false)?;
        }

        self.discard_whitespace()?;
        self.require_char('>')
    }

    fn parse_internal_subset(&mut self) -> Result<()> {
        self.entity_state = EntityState::Dtd;
        loop {
            self.discard_whitespace()?;
            if !self.parse_markup_decl()? {
                break;
            }
        }
        self.entity_state = EntityState::OutsideDtd;
        Ok(())
    }

    /// Parse an external subset — standalone or referenced from DOCTYPE —
    /// optionally starting with a text declaration. `eof_ok` permits end
    /// of input at a declaration boundary, which is only legal for a
    /// standalone subset.
    pub(crate) fn external_subset(&mut self, eof_ok: bool) -> Result<()> {
        self.entity_state = EntityState::Dtd;
        if self.is_string("<?xml")? {
            self.parse_text_decl()?;
        }
        self.external_subset_decls(eof_ok)?;
        self.entity_state = EntityState::OutsideDtd;
        Ok(())
    }

    fn external_subset_decls(&mut self, eof_ok: bool) -> Result<()> {
        loop {
            match self.discard_whitespace() {
                Err(e) if eof_ok && e.is_eof() => return Ok(()),
                other => other?,
            }
            // Conditional sections look like markup declarations up to
            // "<![", so test for them first.
            if self.parse_conditional()? {
                continue;
            }
            if !self.parse_markup_decl()? {
                return Ok(());
            }
        }
    }

    /// Parse one markup declaration if one starts here. Returns false —
    /// with the lookahead restored — when the input is not a declaration.
    fn parse_markup_decl(&mut self) -> Result<bool> {
        if self.is_string("<![")? {
            self.restore_str("<![");
            return Ok(false);
        }
        if !self.is_char('<')? {
            return Ok(false);
        }
        if self.is_string("!--")? {
            self.parse_comment()?;
        } else if self.is_char('!')? {
            let name = self.scan_name()?;
            match DtdKeyword::recognize(&name) {
                DtdKeyword::Element => self.parse_element_decl()?,
                DtdKeyword::Attlist => self.parse_attlist_decl()?,
                DtdKeyword::Entity => self.parse_entity_decl()?,
                DtdKeyword::Notation => self.parse_notation_decl()?,
                _ => {
                    return Err(self.syntax_error(format!("Invalid markup declaration: <!{name}")))
                }
            }
        } else if self.is_char('?')? {
            self.parse_pi()?;
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    /// Discard a processing instruction through `?>` (`<?` already
    /// consumed).
    pub(crate) fn parse_pi(&mut self) -> Result<()> {
        self.discard_until("?>")
    }

    /// Discard a comment (`<!--` already consumed), tolerating one
    /// embedded `--`.
    fn parse_comment(&mut self) -> Result<()> {
        let saved = self.entity_state;
        self.entity_state = EntityState::Comment;
        self.discard_until("--")?;
        if self.next_char()? != '>' {
            self.discard_until("--")?;
        } else {
            self.restore();
        }
        self.require_char('>')?;
        self.entity_state = saved;
        Ok(())
    }

    // ---- conditional sections ------------------------------------------

    /// Parse a conditional section if one starts here.
    fn parse_conditional(&mut self) -> Result<bool> {
        if !self.is_string("<![")? {
            return Ok(false);
        }
        self.discard_whitespace()?;
        if self.is_string("INCLUDE")? {
            self.parse_include()?;
        } else if self.is_string("IGNORE")? {
            self.entity_state = EntityState::Ignore;
            self.parse_ignore_sect()?;
            self.entity_state = EntityState::Dtd;
        } else {
            return Err(self.syntax_error("Invalid conditional section."));
        }
        Ok(true)
    }

    fn parse_include(&mut self) -> Result<()> {
        self.discard_whitespace()?;
        self.require_char('[')?;
        self.external_subset_decls(false)?;
        self.require_string("]]>")
    }

    fn parse_ignore_sect(&mut self) -> Result<()> {
        self.discard_whitespace()?;
        self.require_char('[')?;
        self.parse_ignore_sect_contents()
    }

    /// Ignored sections nest: count the open `<![ ... ]]>` sections and
    /// stop when the one we entered with closes.
    fn parse_ignore_sect_contents(&mut self) -> Result<()> {
        let mut open = 1u32;
        while open > 0 {
            if self.parse_ignore()? {
                open -= 1;
            } else {
                open += 1;
            }
        }
        Ok(())
    }

    /// Scan ignored content until either a nested `<![` (false) or a
    /// closing `]]>` (true) turns up. Note that `]]` must be followed by
    /// `>`, not another `]`, to close a section.
    fn parse_ignore(&mut self) -> Result<bool> {
        let mut state = 0u8;
        loop {
            let c = self.next_char()?;
            match state {
                0 => {
                    state = match c {
                        '<' => 1,
                        ']' => 3,
                        _ => 0,
                    }
                }
                1 => state = if c == '!' { 2 } else { 0 },
                2 => {
                    if c == '[' {
                        return Ok(false);
                    }
                    state = 0;
                }
                3 => state = if c == ']' { 4 } else { 0 },
                _ => {
                    if c == '>' {
                        return Ok(true);
                    }
                    state = 0;
                }
            }
        }
    }

    // ---- declarations --------------------------------------------------

    /// `<!ELEMENT` already consumed.
    fn parse_element_decl(&mut self) -> Result<()> {
        self.require_whitespace()?;
        let name = self.add_element_type()?;
        self.require_whitespace()?;
        self.parse_content_model(&name)?;
        self.discard_whitespace()?;
        self.require_char('>')
    }

    /// Scan a fresh element type name and register it as declared.
    fn add_element_type(&mut self) -> Result<XmlName> {
        let name = self.scan_xml_name()?;
        if !self.declared_element_types.insert(name.clone()) {
            return Err(self.semantic_error(format!(
                "Duplicate element type declaration: {}",
                name.universal_name()
            )));
        }
        self.dtd.create_element_type(name.clone());
        Ok(name)
    }

    /// `<!ATTLIST` already consumed.
    fn parse_attlist_decl(&mut self) -> Result<()> {
        self.require_whitespace()?;
        let element_name = self.scan_xml_name()?;
        self.dtd.create_element_type(element_name.clone());
        while !self.is_char('>')? {
            self.require_whitespace()?;
            if self.is_char('>')? {
                break;
            }
            self.parse_att_def(&element_name)?;
        }
        Ok(())
    }

    /// AttDef ::= S Name S AttType S DefaultDecl
    fn parse_att_def(&mut self, element_name: &XmlName) -> Result<()> {
        let attr_name = self.scan_xml_name()?;
        self.require_whitespace()?;
        let (att_type, enums) = self.parse_attribute_type()?;
        self.require_whitespace()?;
        let default = self.parse_default_decl()?;

        let attribute = Attribute {
            name: attr_name.clone(),
            att_type,
            default,
            enums,
            is_namespace_declaration: false,
        };
        // Duplicate attribute names on one element: the first declaration
        // wins, later ones are parsed and dropped.
        let element = self
            .dtd
            .element_types
            .get_mut(element_name)
            .expect("attlist element type exists");
        element.attributes.entry(attr_name).or_insert(attribute);
        Ok(())
    }

    fn parse_attribute_type(&mut self) -> Result<(AttributeType, Vec<String>)> {
        if self.is_char('(')? {
            let enums = self.parse_enumeration(false)?;
            return Ok((AttributeType::Enumerated, enums));
        }
        let name = self.scan_name()?;
        match DtdKeyword::recognize(&name) {
            DtdKeyword::Cdata => Ok((AttributeType::Cdata, Vec::new())),
            DtdKeyword::Id => Ok((AttributeType::Id, Vec::new())),
            DtdKeyword::Idref => Ok((AttributeType::Idref, Vec::new())),
            DtdKeyword::Idrefs => Ok((AttributeType::Idrefs, Vec::new())),
            DtdKeyword::Entity => Ok((AttributeType::Entity, Vec::new())),
            DtdKeyword::Entities => Ok((AttributeType::Entities, Vec::new())),
            DtdKeyword::Nmtoken => Ok((AttributeType::Nmtoken, Vec::new())),
            DtdKeyword::Nmtokens => Ok((AttributeType::Nmtokens, Vec::new())),
            DtdKeyword::Notation => {
                self.require_whitespace()?;
                self.require_char('(')?;
                let enums = self.parse_enumeration(true)?;
                Ok((AttributeType::Notation, enums))
            }
            _ => Err(self.syntax_error(format!("Invalid attribute type: {name}"))),
        }
    }

    /// The parenthesized value list of an enumerated or notation type;
    /// `use_names` selects Name scanning (NOTATION) over Nmtoken scanning.
    fn parse_enumeration(&mut self, use_names: bool) -> Result<Vec<String>> {
        let mut values = Vec::new();
        let mut seen = HashSet::new();
        self.parse_enumerated_value(use_names, &mut values, &mut seen)?;
        while !self.is_char(')')? {
            self.require_char('|')?;
            self.parse_enumerated_value(use_names, &mut values, &mut seen)?;
        }
        Ok(values)
    }

    fn parse_enumerated_value(
        &mut self,
        use_names: bool,
        values: &mut Vec<String>,
        seen: &mut HashSet<String>,
    ) -> Result<()> {
        self.discard_whitespace()?;
        let value = if use_names {
            self.scan_name()?
        } else {
            self.scan_nmtoken()?
        };
        if !seen.insert(value.clone()) {
            return Err(self.semantic_error(format!("Enumerated values must be unique: {value}")));
        }
        values.push(value);
        self.discard_whitespace()
    }

    /// DefaultDecl ::= '#REQUIRED' | '#IMPLIED' | (('#FIXED' S)? AttValue)
    fn parse_default_decl(&mut self) -> Result<AttributeDefault> {
        if self.is_char('#')? {
            let name = self.scan_name()?;
            match DtdKeyword::recognize(&name) {
                DtdKeyword::Required => Ok(AttributeDefault::Required),
                DtdKeyword::Implied => Ok(AttributeDefault::Implied),
                DtdKeyword::Fixed => {
                    self.require_whitespace()?;
                    Ok(AttributeDefault::Fixed(self.scan_att_value()?))
                }
                _ => Err(self.syntax_error(format!("Invalid attribute default: {name}"))),
            }
        } else {
            Ok(AttributeDefault::Default(self.scan_att_value()?))
        }
    }

    /// `<!ENTITY` already consumed.
    fn parse_entity_decl(&mut self) -> Result<()> {
        self.require_whitespace()?;
        let is_parameter = self.is_char('%')?;
        if is_parameter {
            self.require_whitespace()?;
        }
        let name = self.scan_name()?;
        self.require_whitespace()?;

        let mut value = None;
        let mut system_id = None;
        let mut public_id = None;
        if self.is_string("PUBLIC")? {
            public_id = Some(self.parse_public_id()?);
            system_id = Some(self.parse_system_literal()?);
        } else if self.is_string("SYSTEM")? {
            system_id = Some(self.parse_system_literal()?);
        } else {
            value = Some(self.scan_entity_value()?);
        }

        if is_parameter {
            // First declaration wins; parameter entities live in their own
            // name space.
            self.dtd
                .parameter_entities
                .entry(name.clone())
                .or_insert(ParameterEntity {
                    name,
                    system_id,
                    public_id,
                    value,
                });
        } else {
            self.discard_whitespace()?;
            if system_id.is_some() && self.is_string("NDATA")? {
                self.require_whitespace()?;
                let notation = self.scan_name()?;
                // Parsed general and unparsed entities share one name
                // space; the first declaration of either kind wins.
                if !self.dtd.unparsed_entities.contains_key(&name)
                    && !self.dtd.parsed_general_entities.contains_key(&name)
                {
                    self.dtd.unparsed_entities.insert(
                        name.clone(),
                        UnparsedEntity {
                            name,
                            system_id,
                            public_id,
                            notation,
                        },
                    );
                }
            } else if !self.dtd.unparsed_entities.contains_key(&name)
                && !self.dtd.parsed_general_entities.contains_key(&name)
            {
                self.dtd.parsed_general_entities.insert(
                    name.clone(),
                    ParsedGeneralEntity {
                        name,
                        system_id,
                        public_id,
                        value,
                    },
                );
            }
        }
        self.discard_whitespace()?;
        self.require_char('>')
    }

    /// `<!NOTATION` already consumed.
    fn parse_notation_decl(&mut self) -> Result<()> {
        self.require_whitespace()?;
        let name = self.scan_name()?;
        self.require_whitespace()?;
        let keyword = self.scan_name()?;

        let mut system_id = None;
        let mut public_id = None;
        match DtdKeyword::recognize(&keyword) {
            DtdKeyword::System => {
                system_id = Some(self.parse_system_literal()?);
                self.discard_whitespace()?;
                self.require_char('>')?;
            }
            DtdKeyword::Public => {
                public_id = Some(self.parse_public_id()?);
                if !self.is_char('>')? {
                    self.require_whitespace()?;
                    if !self.is_char('>')? {
                        system_id = Some(self.scan_system_literal()?);
                        self.discard_whitespace()?;
                        self.require_char('>')?;
                    }
                }
            }
            _ => {
                return Err(self.syntax_error(format!(
                    "Invalid keyword in notation declaration: {keyword}"
                )))
            }
        }

        if self.dtd.notations.contains_key(&name) {
            return Err(self.semantic_error(format!("Duplicate notation declaration: {name}")));
        }
        self.dtd.notations.insert(
            name.clone(),
            Notation {
                name,
                system_id,
                public_id,
            },
        );
        Ok(())
    }
}
