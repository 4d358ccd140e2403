//! The entity-expansion layer.
//!
//! [`next_char`](DtdParser::next_char) wraps the raw character stream:
//! ampersands and percent signs are dispatched according to the current
//! entity state, following the "Reference in ..." table of XML 1.0 §4.4,
//! and the line/column counters advance afterwards so recorded positions
//! reflect the *expanded* stream.
//!
//! | sigil | state       | action                                        |
//! |-------|-------------|-----------------------------------------------|
//! | `&`   | DTD         | fatal                                         |
//! | `&#`  | AttValue    | character reference, included                 |
//! | `&`   | AttValue    | general entity, included in literal           |
//! | `&#`  | EntityValue | character reference, included                 |
//! | `&`   | EntityValue | bypassed (returned literally)                 |
//! | `%`   | DTD         | parameter entity, included as PE (padded)     |
//! | `%`   | EntityValue | parameter entity, included literally          |
//! | any other combination: the sigil is ordinary data                    |

use crate::chvalid::is_xml_whitespace;
use crate::error::Result;
use crate::parser::{DtdParser, EntityState};

impl DtdParser {
    /// The next character of the expanded stream.
    pub(crate) fn next_char(&mut self) -> Result<char> {
        let mut c = self.get_char()?;
        match c {
            '&' => c = self.process_ampersand()?,
            '%' => c = self.process_percent()?,
            _ => {}
        }
        let frame = self.input_mut();
        if c == '\n' {
            frame.line += 1;
            frame.column = 1;
        } else {
            frame.column += 1;
        }
        Ok(c)
    }

    fn process_ampersand(&mut self) -> Result<char> {
        match self.entity_state {
            EntityState::Dtd => {
                Err(self.syntax_error("Invalid general entity reference or character reference."))
            }
            EntityState::AttValue => {
                if self.get_char()? == '#' {
                    self.char_ref()?;
                } else {
                    self.restore();
                    self.general_entity_ref()?;
                }
                self.next_char()
            }
            EntityState::EntityValue => {
                // General references are bypassed in entity values; only
                // character references expand.
                if self.get_char()? == '#' {
                    self.char_ref()?;
                    self.next_char()
                } else {
                    self.restore();
                    Ok('&')
                }
            }
            EntityState::OutsideDtd | EntityState::Comment | EntityState::Ignore => Ok('&'),
        }
    }

    fn process_percent(&mut self) -> Result<char> {
        match self.entity_state {
            EntityState::Dtd => {
                // A '%' followed by whitespace is the parameter-entity
                // marker of an entity declaration, not a reference.
                let c = self.get_char()?;
                self.restore();
                if is_xml_whitespace(c) {
                    return Ok('%');
                }
                self.parameter_entity_ref()?;
                self.next_char()
            }
            EntityState::EntityValue => {
                self.parameter_entity_ref()?;
                self.next_char()
            }
            EntityState::AttValue
            | EntityState::OutsideDtd
            | EntityState::Comment
            | EntityState::Ignore => Ok('%'),
        }
    }

    /// Parse a character reference (`&#` already consumed) and replay the
    /// referenced character through a one-character frame whose quote and
    /// markup interpretation are both disabled.
    fn char_ref(&mut self) -> Result<()> {
        let mut hex = false;
        let mut c = self.get_char()?;
        if c == 'x' {
            hex = true;
            c = self.get_char()?;
        }
        let radix = if hex { 16 } else { 10 };
        let mut value: u32 = 0;
        while c != ';' {
            let Some(digit) = c.to_digit(radix) else {
                return Err(
                    self.syntax_error(format!("Invalid character in character reference: '{c}'"))
                );
            };
            value = value.saturating_mul(radix).saturating_add(digit);
            c = self.get_char()?;
        }
        // Code points past the 16-bit range are out of bounds, and the
        // surrogate block forms no character at all.
        if value > u16::MAX as u32 {
            return Err(self.syntax_error(format!("Invalid character reference: {value}")));
        }
        let Some(referenced) = char::from_u32(value) else {
            return Err(self.syntax_error(format!("Invalid character reference: {value}")));
        };
        tracing::trace!(value, "expanding character reference");
        self.push_string_frame(&referenced.to_string(), true, true);
        Ok(())
    }

    /// Expand a general entity reference inside an attribute value (`&`
    /// already consumed). The five predefined entities are always
    /// available; an external entity is forbidden here.
    fn general_entity_ref(&mut self) -> Result<()> {
        let mut name = String::new();
        loop {
            let c = self.get_char()?;
            if c == ';' {
                break;
            }
            name.push(c);
        }

        let entity = self
            .dtd
            .parsed_general_entities
            .get(&name)
            .or_else(|| self.predefined_entities.get(&name));
        let Some(entity) = entity else {
            return Err(
                self.semantic_error(format!("Reference to undefined parsed general entity: {name}"))
            );
        };
        let Some(value) = entity.value().map(str::to_owned) else {
            return Err(self.semantic_error(format!(
                "Reference to external parsed general entity in attribute value: {name}"
            )));
        };
        tracing::trace!(entity = %name, "expanding general entity");
        self.push_string_frame(&value, true, false);
        Ok(())
    }

    /// Expand a parameter entity reference (`%` already consumed).
    ///
    /// In the DTD proper the replacement text is padded with one space on
    /// each side (included as PE); in an entity value it is included
    /// literally. The frames stack trailing-space first so the leading
    /// space is read first.
    fn parameter_entity_ref(&mut self) -> Result<()> {
        let mut name = String::new();
        loop {
            let c = self.get_char()?;
            if c == ';' {
                break;
            }
            name.push(c);
        }

        let Some(entity) = self.dtd.parameter_entities.get(&name) else {
            return Err(
                self.semantic_error(format!("Reference to undefined parameter entity: {name}"))
            );
        };
        let value = entity.value().map(str::to_owned);
        let system_id = entity.system_id().map(str::to_owned);
        let public_id = entity.public_id().map(str::to_owned);
        tracing::trace!(entity = %name, internal = value.is_some(), "expanding parameter entity");

        let pad = self.entity_state == EntityState::Dtd;
        if pad {
            self.push_string_frame(" ", false, false);
        }
        match value {
            Some(value) => self.push_string_frame(&value, false, false),
            None => self.push_resolved_frame(public_id.as_deref(), system_id.as_deref())?,
        }
        if pad {
            self.push_string_frame(" ", false, false);
        }
        Ok(())
    }
}
