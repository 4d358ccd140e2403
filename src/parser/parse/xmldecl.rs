//! XML declarations and text declarations.
//!
//! ```text
//! [23] XMLDecl  ::= '<?xml' VersionInfo EncodingDecl? SDDecl? S? '?>'
//! [77] TextDecl ::= '<?xml' VersionInfo? EncodingDecl S? '?>'
//! ```
//!
//! The encoding name is scanned and validated but does not re-drive
//! decoding; byte inputs were decoded from their byte order mark before
//! scanning began.

use crate::error::Result;
use crate::parser::DtdParser;

impl DtdParser {
    /// Parse an XML declaration — or the processing instruction it turns
    /// out to be when no whitespace follows the target (`<?xml` already
    /// consumed).
    pub(crate) fn parse_xml_decl(&mut self) -> Result<()> {
        if !self.is_whitespace()? {
            return self.parse_pi();
        }
        self.discard_whitespace()?;
        self.require_string("version")?;
        self.parse_version()?;

        if self.is_whitespace()? {
            self.discard_whitespace()?;
            if self.is_string("encoding")? {
                self.parse_encoding_decl()?;
                if !self.is_whitespace()? {
                    return self.require_string("?>");
                }
                self.discard_whitespace()?;
            }
            if self.is_string("standalone")? {
                self.parse_standalone()?;
                self.discard_whitespace()?;
            }
        }
        self.require_string("?>")
    }

    /// Parse a text declaration (`<?xml` already consumed).
    pub(crate) fn parse_text_decl(&mut self) -> Result<()> {
        self.require_whitespace()?;
        if self.is_string("version")? {
            self.parse_version()?;
            self.require_whitespace()?;
        }
        self.require_string("encoding")?;
        self.parse_encoding_decl()?;
        self.discard_whitespace()?;
        self.require_string("?>")
    }

    fn parse_version(&mut self) -> Result<()> {
        self.parse_equals()?;
        let quote = self.scan_quote()?;
        self.require_string("1.0")?;
        self.require_char(quote)
    }

    fn parse_encoding_decl(&mut self) -> Result<()> {
        self.parse_equals()?;
        self.scan_encoding_name()?;
        Ok(())
    }

    fn parse_standalone(&mut self) -> Result<()> {
        self.parse_equals()?;
        self.scan_yes_no()?;
        Ok(())
    }

    fn parse_equals(&mut self) -> Result<()> {
        self.discard_whitespace()?;
        self.require_char('=')?;
        self.discard_whitespace()
    }
}
