//! Canonicalized XML names.
//!
//! An [`XmlName`] records the local, qualified (`prefix:local`) and
//! universal (`uri^local`) forms of a name together with its prefix and
//! namespace URI. The universal form separates the URI from the local part
//! with a caret because a caret is legal in neither, so the result is a
//! unique, hashable key for a namespace-qualified name.
//!
//! Names created without any namespace information are *namespace-unaware*
//! when the local part contains a colon; the three name forms then all
//! equal the local part and no URI or prefix is recorded. Two names are
//! equal iff their (URI, local) pairs are equal, whatever their prefixes.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{DtdError, Result};

/// Separates the URI from the local part in a universal name.
pub const UNIVERSAL_SEPARATOR: char = '^';

pub(crate) const XMLNS: &str = "xmlns";
const XML: &str = "xml";
/// Namespace bound to the `xml` prefix by definition.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// Namespace bound to the `xmlns` prefix by definition.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

#[derive(Debug, Clone)]
pub struct XmlName {
    local: String,
    prefix: Option<String>,
    uri: Option<String>,
    // Unset while a URI is present but no prefix has been chosen yet.
    qualified: Option<String>,
    universal: String,
    namespace_aware: bool,
}

impl XmlName {
    /// Construct a name from a namespace URI, local part and prefix.
    ///
    /// With a URI the name is namespace-aware; the prefix may be omitted,
    /// in which case the qualified form stays unset until
    /// [`set_prefix`](Self::set_prefix) is called. Without a URI the name
    /// is namespace-aware exactly when the local part contains no colon,
    /// and no prefix may be given.
    pub fn with_parts(uri: Option<&str>, local: &str, prefix: Option<&str>) -> Result<XmlName> {
        if prefix.is_some() && uri.is_none() {
            return Err(DtdError::Name(format!(
                "prefix '{}' given without a namespace URI",
                prefix.unwrap_or_default()
            )));
        }

        if let Some(uri) = uri {
            check_local_name(local, true)?;
            check_uri(uri)?;
            if let Some(prefix) = prefix {
                check_prefix(prefix)?;
            }
            Ok(XmlName {
                local: local.to_owned(),
                prefix: prefix.map(str::to_owned),
                uri: Some(uri.to_owned()),
                qualified: prefix.map(|p| build_qualified(p, local)),
                universal: build_universal(uri, local),
                namespace_aware: true,
            })
        } else {
            let namespace_aware = !local.contains(':');
            check_local_name(local, namespace_aware)?;
            Ok(XmlName {
                local: local.to_owned(),
                prefix: None,
                uri: None,
                qualified: Some(local.to_owned()),
                universal: local.to_owned(),
                namespace_aware,
            })
        }
    }

    /// Construct a name from a qualified form and an optional table mapping
    /// prefixes to namespace URIs (the empty-string key denotes the default
    /// namespace).
    ///
    /// Without a table the name carries no namespace information and is
    /// namespace-unaware when it contains a colon. With a table, an
    /// unprefixed name falls into the default namespace when one is mapped,
    /// the `xml` and `xmlns` prefixes resolve to their fixed namespaces,
    /// and any other prefix must be present in the table.
    pub fn from_qualified(
        qualified: &str,
        uris: Option<&HashMap<String, String>>,
    ) -> Result<XmlName> {
        check_qualified_name(qualified, uris.is_some())?;

        let Some(uris) = uris else {
            return XmlName::with_parts(None, qualified, None);
        };

        match qualified.split_once(':') {
            None => {
                // An unprefixed name lands in the default namespace when
                // one is declared; otherwise it is in no namespace.
                match uris.get("") {
                    Some(uri) => XmlName::with_parts(Some(uri), qualified, Some("")),
                    None => XmlName::with_parts(None, qualified, None),
                }
            }
            Some((prefix, local)) => {
                let uri = if prefix.eq_ignore_ascii_case(XML) {
                    XML_NAMESPACE
                } else if prefix.eq_ignore_ascii_case(XMLNS) {
                    XMLNS_NAMESPACE
                } else {
                    uris.get(prefix).map(String::as_str).ok_or_else(|| {
                        DtdError::Name(format!(
                            "no namespace URI corresponding to prefix '{prefix}'"
                        ))
                    })?
                };
                XmlName::with_parts(Some(uri), local, Some(prefix))
            }
        }
    }

    /// Construct a name from its universal (`uri^local`) form.
    pub fn from_universal(universal: &str) -> Result<XmlName> {
        match universal.split_once(UNIVERSAL_SEPARATOR) {
            Some((uri, local)) => XmlName::with_parts(Some(uri), local, None),
            None => XmlName::with_parts(None, universal, None),
        }
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// The qualified form; `None` while a URI is present but no prefix has
    /// been set.
    pub fn qualified_name(&self) -> Option<&str> {
        self.qualified.as_deref()
    }

    pub fn universal_name(&self) -> &str {
        &self.universal
    }

    /// The namespace prefix; the empty string denotes the default
    /// namespace, `None` a name with no namespace or an unaware name.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn is_namespace_aware(&self) -> bool {
        self.namespace_aware
    }

    /// Choose a prefix for a name that has a URI but none yet; this also
    /// fixes the qualified form.
    pub fn set_prefix(&mut self, prefix: &str) -> Result<()> {
        if self.uri.is_none() {
            return Err(DtdError::Name(
                "cannot set a prefix when the URI is not set".into(),
            ));
        }
        check_prefix(prefix)?;
        self.qualified = Some(build_qualified(prefix, &self.local));
        self.prefix = Some(prefix.to_owned());
        Ok(())
    }

    /// Re-resolve this name's qualified form against a prefix table,
    /// overriding any namespace information it already carries.
    pub fn resolve_namespace(&mut self, uris: &HashMap<String, String>) -> Result<()> {
        let qualified = self.qualified.clone().ok_or_else(|| {
            DtdError::Name("cannot resolve a name whose prefix is not set".into())
        })?;
        *self = XmlName::from_qualified(&qualified, Some(uris))?;
        Ok(())
    }
}

impl PartialEq for XmlName {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri && self.local == other.local
    }
}

impl Eq for XmlName {}

impl Hash for XmlName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.universal.hash(state);
    }
}

impl fmt::Display for XmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.universal)
    }
}

/// The local part when the prefix is empty, `prefix:local` otherwise.
fn build_qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_owned()
    } else {
        format!("{prefix}:{local}")
    }
}

fn build_universal(uri: &str, local: &str) -> String {
    format!("{uri}{UNIVERSAL_SEPARATOR}{local}")
}

fn check_local_name(local: &str, namespace_aware: bool) -> Result<()> {
    if local.is_empty() {
        return Err(DtdError::Name("local name is empty".into()));
    }
    if namespace_aware && local.contains(':') {
        return Err(DtdError::Name(format!("local name contains a colon: '{local}'")));
    }
    if local.contains(UNIVERSAL_SEPARATOR) {
        return Err(DtdError::Name(format!("local name contains a caret: '{local}'")));
    }
    Ok(())
}

fn check_prefix(prefix: &str) -> Result<()> {
    if prefix.contains(':') {
        return Err(DtdError::Name(format!("prefix contains a colon: '{prefix}'")));
    }
    if prefix.contains(UNIVERSAL_SEPARATOR) {
        return Err(DtdError::Name(format!("prefix contains a caret: '{prefix}'")));
    }
    Ok(())
}

fn check_uri(uri: &str) -> Result<()> {
    if uri.is_empty() {
        return Err(DtdError::Name("namespace URI is empty".into()));
    }
    if uri.contains(UNIVERSAL_SEPARATOR) {
        return Err(DtdError::Name(format!("namespace URI contains a caret: '{uri}'")));
    }
    Ok(())
}

fn check_qualified_name(qualified: &str, namespace_aware: bool) -> Result<()> {
    if qualified.is_empty() {
        return Err(DtdError::Name("qualified name is empty".into()));
    }
    match qualified.split_once(':') {
        Some((prefix, local)) if namespace_aware => {
            check_prefix(prefix)?;
            check_local_name(local, true)
        }
        _ => check_local_name(qualified, namespace_aware && !qualified.contains(':')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(name: &XmlName) -> u64 {
        let mut h = DefaultHasher::new();
        name.hash(&mut h);
        h.finish()
    }

    #[test]
    fn equality_ignores_prefix() {
        let a = XmlName::with_parts(Some("http://foo"), "e", Some("a")).unwrap();
        let b = XmlName::with_parts(Some("http://foo"), "e", Some("b")).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.universal_name(), "http://foo^e");
        assert_eq!(a.qualified_name(), Some("a:e"));
        assert_eq!(b.qualified_name(), Some("b:e"));
    }

    #[test]
    fn no_namespace_forms_collapse() {
        let n = XmlName::with_parts(None, "title", None).unwrap();
        assert!(n.is_namespace_aware());
        assert_eq!(n.local_name(), "title");
        assert_eq!(n.qualified_name(), Some("title"));
        assert_eq!(n.universal_name(), "title");
        assert_eq!(n.prefix(), None);
        assert_eq!(n.uri(), None);
    }

    #[test]
    fn colon_without_namespace_info_is_unaware() {
        let n = XmlName::from_qualified("foo:e", None).unwrap();
        assert!(!n.is_namespace_aware());
        assert_eq!(n.local_name(), "foo:e");
        assert_eq!(n.universal_name(), "foo:e");
        assert_eq!(n.uri(), None);
    }

    #[test]
    fn default_namespace_applies_to_unprefixed_names() {
        let mut uris = HashMap::new();
        uris.insert(String::new(), "http://d".to_string());
        let n = XmlName::from_qualified("e", Some(&uris)).unwrap();
        assert_eq!(n.uri(), Some("http://d"));
        assert_eq!(n.prefix(), Some(""));
        assert_eq!(n.qualified_name(), Some("e"));
        assert_eq!(n.universal_name(), "http://d^e");
    }

    #[test]
    fn xml_and_xmlns_prefixes_are_predefined() {
        let uris = HashMap::new();
        let xml = XmlName::from_qualified("xml:lang", Some(&uris)).unwrap();
        assert_eq!(xml.uri(), Some(XML_NAMESPACE));
        let xmlns = XmlName::from_qualified("xmlns:epub", Some(&uris)).unwrap();
        assert_eq!(xmlns.uri(), Some(XMLNS_NAMESPACE));
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        let uris = HashMap::new();
        assert!(XmlName::from_qualified("foo:e", Some(&uris)).is_err());
    }

    #[test]
    fn caret_is_rejected_everywhere() {
        assert!(XmlName::with_parts(None, "a^b", None).is_err());
        assert!(XmlName::with_parts(Some("u^v"), "a", None).is_err());
        assert!(XmlName::with_parts(Some("http://foo"), "a", Some("p^q")).is_err());
    }

    #[test]
    fn prefix_requires_uri() {
        assert!(XmlName::with_parts(None, "a", Some("p")).is_err());
    }

    #[test]
    fn set_prefix_fixes_qualified_form() {
        let mut n = XmlName::with_parts(Some("http://foo"), "e", None).unwrap();
        assert_eq!(n.qualified_name(), None);
        n.set_prefix("p").unwrap();
        assert_eq!(n.qualified_name(), Some("p:e"));
        assert_eq!(n.prefix(), Some("p"));
    }

    #[test]
    fn resolve_namespace_rewrites_all_forms() {
        let mut uris = HashMap::new();
        uris.insert("p".to_string(), "http://p".to_string());
        let mut n = XmlName::from_qualified("p:e", None).unwrap();
        assert!(!n.is_namespace_aware());
        n.resolve_namespace(&uris).unwrap();
        assert!(n.is_namespace_aware());
        assert_eq!(n.uri(), Some("http://p"));
        assert_eq!(n.local_name(), "e");
        assert_eq!(n.universal_name(), "http://p^e");
    }

    #[test]
    fn universal_round_trip() {
        let n = XmlName::from_universal("http://foo^e").unwrap();
        assert_eq!(n.uri(), Some("http://foo"));
        assert_eq!(n.local_name(), "e");
        let plain = XmlName::from_universal("e").unwrap();
        assert_eq!(plain.uri(), None);
    }
}
