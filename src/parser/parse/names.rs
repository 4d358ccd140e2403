//! Name and Nmtoken scanning.
//!
//! A Name starts with a Letter, `_` or `:` — the colon is allowed here so
//! the scanner itself does not enforce namespace validity — and continues
//! with NameChars. An Nmtoken drops the start-character restriction. Both
//! stop at the first non-NameChar and restore it.

use crate::chvalid::{is_name_char, is_name_start_char};
use crate::error::Result;
use crate::name::XmlName;
use crate::parser::DtdParser;

impl DtdParser {
    /// Name. Must be non-empty.
    pub(crate) fn scan_name(&mut self) -> Result<String> {
        let mut name = String::new();
        let mut c = self.next_char()?;
        if !is_name_start_char(c) {
            return Err(self.syntax_error(format!("Invalid name start character: '{c}'")));
        }
        while is_name_char(c) {
            name.push(c);
            c = self.next_char()?;
        }
        self.restore();
        Ok(name)
    }

    /// Nmtoken. Must be non-empty.
    pub(crate) fn scan_nmtoken(&mut self) -> Result<String> {
        let mut token = String::new();
        let mut c = self.next_char()?;
        if !is_name_char(c) {
            return Err(self.syntax_error(format!("Invalid Nmtoken start character: '{c}'")));
        }
        while is_name_char(c) {
            token.push(c);
            c = self.next_char()?;
        }
        self.restore();
        Ok(token)
    }

    /// Scan a (possibly qualified) name and canonicalize it against the
    /// active prefix table, when one is present.
    pub(crate) fn scan_xml_name(&mut self) -> Result<XmlName> {
        let qualified = self.scan_name()?;
        XmlName::from_qualified(&qualified, self.namespace_uris.as_ref())
    }
}
