//! Input bundles and external-entity resolution.
//!
//! An [`InputSource`] carries at least one of an in-memory character
//! stream, a byte stream, or a system identifier. Byte streams are
//! BOM-sniffed and decoded before scanning; the scanner itself only ever
//! sees characters. The parser never opens URLs — every external resource
//! is fetched through the caller's [`EntityResolver`].

use std::fmt;
use std::io::Read;

/// A source of DTD text for the parser or for an entity resolver to
/// return.
pub struct InputSource {
    pub(crate) text: Option<String>,
    pub(crate) bytes: Option<Box<dyn Read>>,
    pub(crate) system_id: Option<String>,
    pub(crate) public_id: Option<String>,
}

impl InputSource {
    /// A source over in-memory text.
    pub fn from_str(text: impl Into<String>) -> Self {
        InputSource {
            text: Some(text.into()),
            bytes: None,
            system_id: None,
            public_id: None,
        }
    }

    /// A source over a byte stream; the encoding is detected from a byte
    /// order mark, defaulting to UTF-8.
    pub fn from_reader(reader: impl Read + 'static) -> Self {
        InputSource {
            text: None,
            bytes: Some(Box::new(reader)),
            system_id: None,
            public_id: None,
        }
    }

    /// A source identified only by a system ID; opening it requires an
    /// entity resolver.
    pub fn from_system_id(system_id: impl Into<String>) -> Self {
        InputSource {
            text: None,
            bytes: None,
            system_id: Some(system_id.into()),
            public_id: None,
        }
    }

    /// Attach a system ID, the base against which relative system IDs of
    /// referenced entities are resolved.
    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(system_id.into());
        self
    }

    pub fn with_public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = Some(public_id.into());
        self
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSource")
            .field("text", &self.text.as_deref().map(|t| t.len()))
            .field("bytes", &self.bytes.is_some())
            .field("system_id", &self.system_id)
            .field("public_id", &self.public_id)
            .finish()
    }
}

/// Maps (public ID, system ID) pairs to input sources.
///
/// This is the sole mechanism by which external subsets and external
/// parameter entities are fetched. Returning `Ok(None)` fails the parse
/// with a diagnostic naming whichever ID was supplied.
pub trait EntityResolver {
    fn resolve_entity(
        &self,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> std::io::Result<Option<InputSource>>;
}

/// The resolver used when the caller supplies none: resolves nothing, so
/// any external fetch fails with a diagnostic.
pub(crate) struct NullResolver;

impl EntityResolver for NullResolver {
    fn resolve_entity(
        &self,
        _public_id: Option<&str>,
        _system_id: Option<&str>,
    ) -> std::io::Result<Option<InputSource>> {
        Ok(None)
    }
}

/// Drain a byte stream and decode it, honoring a UTF-8 or UTF-16 byte
/// order mark and defaulting to UTF-8. Malformed sequences fail the read.
pub(crate) fn decode_bytes(reader: &mut dyn Read) -> std::io::Result<String> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    let encoding = encoding_rs::Encoding::for_bom(&raw)
        .map(|(encoding, _)| encoding)
        .unwrap_or(encoding_rs::UTF_8);
    let (text, had_errors) = encoding.decode_with_bom_removal(&raw);
    if had_errors {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("input is not valid {}", encoding.name()),
        ));
    }
    Ok(text.into_owned())
}
