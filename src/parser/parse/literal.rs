//! Quoted literals: attribute values, entity values, system and public
//! literals, encoding names.
//!
//! Most of these scan for a closing quote that matches the opening one.
//! Inside attribute and entity values the match is moderated by the
//! current frame's flags: a quote replayed from an expanded reference is
//! data, and markup characters are only legal when they arrived through a
//! character reference. Attribute values are not normalized per XML
//! §3.3.3.

use crate::chvalid::is_pubid_char;
use crate::error::Result;
use crate::parser::{DtdParser, EntityState};

impl DtdParser {
    /// The opening quote of a literal, single or double.
    pub(crate) fn scan_quote(&mut self) -> Result<char> {
        let quote = self.next_char()?;
        if quote != '\'' && quote != '"' {
            return Err(self.syntax_error("Quote character required."));
        }
        Ok(quote)
    }

    /// AttValue. May be empty.
    pub(crate) fn scan_att_value(&mut self) -> Result<String> {
        self.entity_state = EntityState::AttValue;
        let quote = self.scan_quote()?;
        let mut value = String::new();
        let mut c = self.next_char()?;
        while c != quote || self.input().ignore_quote {
            if (c == '<' || c == '&') && !self.input().ignore_markup {
                return Err(self.syntax_error(format!(
                    "Markup character '{c}' not allowed in default attribute value."
                )));
            }
            value.push(c);
            c = self.next_char()?;
        }
        self.entity_state = EntityState::Dtd;
        Ok(value)
    }

    /// EntityValue. May be empty.
    pub(crate) fn scan_entity_value(&mut self) -> Result<String> {
        self.entity_state = EntityState::EntityValue;
        let quote = self.scan_quote()?;
        let mut value = String::new();
        let mut c = self.next_char()?;
        while c != quote || self.input().ignore_quote {
            if (c == '<' || c == '%') && !self.input().ignore_markup {
                return Err(self.syntax_error(format!(
                    "Markup character '{c}' not allowed in entity value."
                )));
            }
            value.push(c);
            c = self.next_char()?;
        }
        self.entity_state = EntityState::Dtd;
        Ok(value)
    }

    /// SystemLiteral: any characters up to the closing quote.
    pub(crate) fn scan_system_literal(&mut self) -> Result<String> {
        let quote = self.scan_quote()?;
        let mut value = String::new();
        loop {
            let c = self.next_char()?;
            if c == quote {
                break;
            }
            value.push(c);
        }
        Ok(value)
    }

    /// `SYSTEM` already consumed: required whitespace, then the literal.
    pub(crate) fn parse_system_literal(&mut self) -> Result<String> {
        self.require_whitespace()?;
        self.scan_system_literal()
    }

    /// PubidLiteral: restricted to the PubidChar set.
    pub(crate) fn scan_pubid_literal(&mut self) -> Result<String> {
        let quote = self.scan_quote()?;
        let mut value = String::new();
        loop {
            let c = self.next_char()?;
            if c == quote {
                break;
            }
            if !is_pubid_char(c) {
                return Err(
                    self.syntax_error(format!("Invalid character in public identifier: '{c}'"))
                );
            }
            value.push(c);
        }
        Ok(value)
    }

    /// `PUBLIC` already consumed: required whitespace, then the literal.
    pub(crate) fn parse_public_id(&mut self) -> Result<String> {
        self.require_whitespace()?;
        self.scan_pubid_literal()
    }

    /// EncName: `[A-Za-z][A-Za-z0-9._-]*`, quoted.
    pub(crate) fn scan_encoding_name(&mut self) -> Result<String> {
        let quote = self.scan_quote()?;
        let mut name = String::new();
        let c = self.next_char()?;
        if !c.is_ascii_alphabetic() {
            return Err(
                self.syntax_error(format!("Invalid starting character in encoding name: '{c}'"))
            );
        }
        name.push(c);
        loop {
            let c = self.next_char()?;
            if c == quote {
                break;
            }
            if !c.is_ascii_alphanumeric() && !matches!(c, '.' | '_' | '-') {
                return Err(self.syntax_error(format!("Invalid character in encoding name: '{c}'")));
            }
            name.push(c);
        }
        Ok(name)
    }

    /// The quoted `yes`/`no` of a standalone declaration.
    pub(crate) fn scan_yes_no(&mut self) -> Result<String> {
        let quote = self.scan_quote()?;
        let no = if self.is_string("no")? {
            true
        } else {
            self.require_string("yes")?;
            false
        };
        self.require_char(quote)?;
        Ok(if no { "no" } else { "yes" }.to_owned())
    }
}
