//! The DTD parser engine.
//!
//! A [`DtdParser`] is a single-threaded, synchronous processor: one parse
//! invocation owns one in-progress DTD. The scanner is character-level;
//! every character flows through the entity-expansion layer before the
//! lexical primitives here and the declaration parsers in [`parse`] see
//! it. Errors are fatal to the current parse — there is no recovery.

mod input;
mod parse;
mod post;

use std::collections::{HashMap, HashSet};

use crate::chvalid::is_xml_whitespace;
use crate::dtd::{Dtd, ParsedGeneralEntity};
use crate::error::{DtdError, Result};
use crate::io::{decode_bytes, EntityResolver, InputSource, NullResolver};
use crate::name::XmlName;

use input::ReaderFrame;

/// How `&` and `%` are interpreted at the current point of the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityState {
    OutsideDtd,
    Dtd,
    AttValue,
    EntityValue,
    Comment,
    Ignore,
}

/// Token codes for the keywords that drive declaration dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DtdKeyword {
    Element,
    Attlist,
    Entity,
    Notation,
    System,
    Public,
    Cdata,
    Id,
    Idref,
    Idrefs,
    Entities,
    Nmtoken,
    Nmtokens,
    Required,
    Implied,
    Fixed,
    Unknown,
}

impl DtdKeyword {
    fn recognize(name: &str) -> DtdKeyword {
        match name {
            "ELEMENT" => DtdKeyword::Element,
            "ATTLIST" => DtdKeyword::Attlist,
            "ENTITY" => DtdKeyword::Entity,
            "NOTATION" => DtdKeyword::Notation,
            "SYSTEM" => DtdKeyword::System,
            "PUBLIC" => DtdKeyword::Public,
            "CDATA" => DtdKeyword::Cdata,
            "ID" => DtdKeyword::Id,
            "IDREF" => DtdKeyword::Idref,
            "IDREFS" => DtdKeyword::Idrefs,
            "ENTITIES" => DtdKeyword::Entities,
            "NMTOKEN" => DtdKeyword::Nmtoken,
            "NMTOKENS" => DtdKeyword::Nmtokens,
            "REQUIRED" => DtdKeyword::Required,
            "IMPLIED" => DtdKeyword::Implied,
            "FIXED" => DtdKeyword::Fixed,
            _ => DtdKeyword::Unknown,
        }
    }
}

/// Parses an external DTD or the DTD of an XML document into a [`Dtd`].
///
/// The parser checks for most syntactic errors but not all of them;
/// results are undetermined if the input is not syntactically reasonable.
/// External resources — the external subset and external parameter
/// entities — are fetched exclusively through the [`EntityResolver`]
/// given at construction.
pub struct DtdParser {
    resolver: Box<dyn EntityResolver>,
    dtd: Dtd,
    namespace_uris: Option<HashMap<String, String>>,
    predefined_entities: HashMap<String, ParsedGeneralEntity>,
    declared_element_types: HashSet<XmlName>,
    entity_state: EntityState,
    input_tab: Vec<ReaderFrame>,
}

impl Default for DtdParser {
    fn default() -> Self {
        DtdParser::new()
    }
}

impl DtdParser {
    /// A parser with no entity resolver; any external fetch fails with a
    /// diagnostic naming the unresolved identifier.
    pub fn new() -> Self {
        let mut predefined_entities = HashMap::new();
        for (name, value) in [
            ("lt", "<"),
            ("gt", ">"),
            ("amp", "&"),
            ("apos", "'"),
            ("quot", "\""),
        ] {
            predefined_entities.insert(
                name.to_owned(),
                ParsedGeneralEntity {
                    name: name.to_owned(),
                    system_id: None,
                    public_id: None,
                    value: Some(value.to_owned()),
                },
            );
        }
        DtdParser {
            resolver: Box::new(NullResolver),
            dtd: Dtd::default(),
            namespace_uris: None,
            predefined_entities,
            declared_element_types: HashSet::new(),
            entity_state: EntityState::OutsideDtd,
            input_tab: Vec::new(),
        }
    }

    pub fn with_resolver(resolver: impl EntityResolver + 'static) -> Self {
        let mut parser = DtdParser::new();
        parser.resolver = Box::new(resolver);
        parser
    }

    /// Parse the DTD of an XML document: the XML declaration, prolog
    /// miscellanea and the DOCTYPE declaration (internal subset, external
    /// subset, or both). The rest of the document is abandoned.
    ///
    /// `namespace_uris` maps prefixes (the empty string for the default
    /// namespace) to namespace URIs. When absent, a table is derived from
    /// `xmlns` attribute declarations after parsing.
    pub fn parse_xml_document(
        &mut self,
        src: InputSource,
        namespace_uris: Option<HashMap<String, String>>,
    ) -> Result<Dtd> {
        self.init(namespace_uris);
        self.open_input_source(src)?;
        self.parse_document()?;
        self.post_process()?;
        Ok(std::mem::take(&mut self.dtd))
    }

    /// Parse `src` as a standalone external DTD subset, optionally
    /// starting with a text declaration.
    pub fn parse_external_subset(
        &mut self,
        src: InputSource,
        namespace_uris: Option<HashMap<String, String>>,
    ) -> Result<Dtd> {
        self.init(namespace_uris);
        self.open_input_source(src)?;
        self.external_subset(true)?;
        self.post_process()?;
        Ok(std::mem::take(&mut self.dtd))
    }

    fn init(&mut self, namespace_uris: Option<HashMap<String, String>>) {
        self.dtd = Dtd::default();
        self.namespace_uris = namespace_uris;
        self.declared_element_types.clear();
        self.entity_state = EntityState::OutsideDtd;
        self.input_tab.clear();
    }

    // ---- source opening ------------------------------------------------

    fn open_input_source(&mut self, src: InputSource) -> Result<()> {
        let InputSource {
            text,
            bytes,
            system_id,
            public_id,
        } = src;
        if let Some(text) = text {
            self.input_tab
                .push(ReaderFrame::new(&text, system_id, public_id));
        } else if let Some(mut bytes) = bytes {
            let text = decode_bytes(&mut *bytes)?;
            self.input_tab
                .push(ReaderFrame::new(&text, system_id, public_id));
        } else if system_id.is_some() {
            self.push_resolved_frame(public_id.as_deref(), system_id.as_deref())?;
        } else {
            return Err(DtdError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "InputSource does not have a character stream, byte stream, or system ID",
            )));
        }
        Ok(())
    }

    /// Open an external entity through the resolver and push a frame over
    /// it. A relative system ID is first resolved against the including
    /// frame's system ID when that base is an absolute URL.
    pub(crate) fn push_resolved_frame(
        &mut self,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<()> {
        let base = self.input_tab.last().and_then(|f| f.system_id.clone());
        let resolved_system = match system_id {
            Some(system_id) => Some(resolve_system_id(base.as_deref(), system_id)?),
            None => None,
        };
        tracing::debug!(?public_id, system_id = ?resolved_system, "opening external entity");

        let source = self
            .resolver
            .resolve_entity(public_id, resolved_system.as_deref())?;
        let Some(source) = source else {
            let what = if let Some(public_id) = public_id {
                format!("public ID '{public_id}'")
            } else if let Some(system_id) = resolved_system.as_deref() {
                format!("system ID '{system_id}'")
            } else {
                "an entity with no identifier".to_owned()
            };
            return Err(DtdError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("entity resolver returned no input for {what}"),
            )));
        };

        let InputSource {
            text,
            bytes,
            system_id: source_system,
            public_id: source_public,
        } = source;
        let text = if let Some(text) = text {
            text
        } else if let Some(mut bytes) = bytes {
            decode_bytes(&mut *bytes)?
        } else {
            return Err(DtdError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "resolved entity has neither a character stream nor a byte stream",
            )));
        };
        let frame_system = source_system.or(resolved_system);
        let frame_public = source_public.or_else(|| public_id.map(str::to_owned));
        self.input_tab
            .push(ReaderFrame::new(&text, frame_system, frame_public));
        Ok(())
    }

    // ---- checking primitives -------------------------------------------
    //
    // All of these test starting at the *next* character; the ones that
    // stop only by hitting something else restore the last character read.

    /// Consume one whitespace character if the next character is one.
    pub(crate) fn is_whitespace(&mut self) -> Result<bool> {
        if is_xml_whitespace(self.next_char()?) {
            return Ok(true);
        }
        self.restore();
        Ok(false)
    }

    /// Insist on at least one whitespace character, then greedily consume
    /// the rest of the run.
    pub(crate) fn require_whitespace(&mut self) -> Result<()> {
        if !self.is_whitespace()? {
            return Err(self.syntax_error("Whitespace required."));
        }
        self.discard_whitespace()
    }

    pub(crate) fn discard_whitespace(&mut self) -> Result<()> {
        while self.is_whitespace()? {}
        Ok(())
    }

    /// Discard characters through the first occurrence of `stop`.
    pub(crate) fn discard_until(&mut self, stop: &str) -> Result<()> {
        let stop: Vec<char> = stop.chars().collect();
        let mut pos = 0;
        while pos < stop.len() {
            let c = self.next_char()?;
            pos = if c == stop[pos] { pos + 1 } else { 0 };
        }
        Ok(())
    }

    /// Consume `s` if the input matches it; restore the consumed prefix
    /// (and the mismatching character) otherwise.
    pub(crate) fn is_string(&mut self, s: &str) -> Result<bool> {
        let mut consumed = String::new();
        for expected in s.chars() {
            let c = self.next_char()?;
            consumed.push(c);
            if c != expected {
                self.restore_str(&consumed);
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub(crate) fn is_char(&mut self, c: char) -> Result<bool> {
        if self.next_char()? == c {
            return Ok(true);
        }
        self.restore();
        Ok(false)
    }

    pub(crate) fn require_string(&mut self, s: &str) -> Result<()> {
        if !self.is_string(s)? {
            return Err(self.syntax_error(format!("String required: {s}")));
        }
        Ok(())
    }

    pub(crate) fn require_char(&mut self, c: char) -> Result<()> {
        if !self.is_char(c)? {
            return Err(self.syntax_error(format!("Character required: {c}")));
        }
        Ok(())
    }

    // ---- error construction --------------------------------------------

    fn position(&self) -> (u32, u32) {
        self.input_tab
            .last()
            .map(|frame| (frame.line, frame.column))
            .unwrap_or((1, 1))
    }

    pub(crate) fn syntax_error(&self, message: impl Into<String>) -> DtdError {
        let (line, column) = self.position();
        DtdError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    pub(crate) fn semantic_error(&self, message: impl Into<String>) -> DtdError {
        let (line, column) = self.position();
        DtdError::Semantic {
            message: message.into(),
            line,
            column,
        }
    }

    pub(crate) fn eof_error(&self) -> DtdError {
        let (line, column) = self.position();
        DtdError::UnexpectedEof { line, column }
    }
}

/// Resolve `system_id` against `base` when the base parses as an absolute
/// URL; otherwise the ID passes through unchanged for the resolver to
/// interpret.
fn resolve_system_id(base: Option<&str>, system_id: &str) -> Result<String> {
    let Some(base) = base else {
        return Ok(system_id.to_owned());
    };
    match url::Url::parse(base) {
        Ok(base_url) => base_url
            .join(system_id)
            .map(|joined| joined.to_string())
            .map_err(|source| DtdError::MalformedUri {
                uri: system_id.to_owned(),
                source,
            }),
        Err(_) => Ok(system_id.to_owned()),
    }
}
