//! End-to-end tests over XML documents and externally resolved resources.

use std::collections::HashMap;
use std::io::Cursor;

use anyhow::Result;
use exdtd::{
    ContentType, Dtd, DtdErrorKind, DtdParser, EntityResolver, InputSource, XmlName,
};

fn name(local: &str) -> XmlName {
    XmlName::with_parts(None, local, None).unwrap()
}

/// Serves DTD text for exact system IDs, the way a catalog would.
struct MapResolver {
    map: HashMap<String, String>,
}

impl MapResolver {
    fn new(entries: &[(&str, &str)]) -> Self {
        MapResolver {
            map: entries
                .iter()
                .map(|(id, text)| (id.to_string(), text.to_string()))
                .collect(),
        }
    }
}

impl EntityResolver for MapResolver {
    fn resolve_entity(
        &self,
        _public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> std::io::Result<Option<InputSource>> {
        Ok(system_id
            .and_then(|id| self.map.get(id).map(|text| (id, text.clone())))
            .map(|(id, text)| InputSource::from_str(text).with_system_id(id)))
    }
}

#[test]
fn doctype_with_internal_subset() -> Result<()> {
    let mut parser = DtdParser::new();
    let dtd = parser.parse_xml_document(
        InputSource::from_str(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<!-- a book catalog -->
<?format catalog?>
<!DOCTYPE catalog [
<!ELEMENT catalog (book*)>
<!ELEMENT book (#PCDATA)>
]>
<catalog><book>ignored instance content</book></catalog>
"#,
        ),
        None,
    )?;
    assert_eq!(dtd.element_types().len(), 2);
    assert_eq!(
        dtd.element_type(&name("catalog")).unwrap().content_type(),
        Some(ContentType::Element)
    );
    Ok(())
}

#[test]
fn document_without_doctype_yields_an_empty_model() -> Result<()> {
    let mut parser = DtdParser::new();
    let dtd = parser.parse_xml_document(
        InputSource::from_str("<?xml version=\"1.0\"?>\n<root/>\n"),
        None,
    )?;
    assert!(dtd.element_types().is_empty());
    assert!(dtd.notations().is_empty());
    Ok(())
}

#[test]
fn internal_subset_wins_over_external_entities() -> Result<()> {
    let resolver = MapResolver::new(&[(
        "root.dtd",
        "<!ENTITY % mode \"ANY\">\n<!ELEMENT r %mode;>\n<!ELEMENT a EMPTY>\n",
    )]);
    let mut parser = DtdParser::with_resolver(resolver);
    let dtd = parser.parse_xml_document(
        InputSource::from_str(
            "<!DOCTYPE r SYSTEM \"root.dtd\" [<!ENTITY % mode \"EMPTY\">]>\n<r/>",
        ),
        None,
    )?;
    // The internal subset's definition of %mode; was seen first.
    assert_eq!(
        dtd.element_type(&name("r")).unwrap().content_type(),
        Some(ContentType::Empty)
    );
    assert!(dtd.element_type(&name("a")).is_some());
    assert_eq!(
        dtd.parameter_entities().get("mode").unwrap().value(),
        Some("EMPTY")
    );
    Ok(())
}

#[test]
fn external_parameter_entity_contributes_declarations() -> Result<()> {
    let resolver = MapResolver::new(&[("mod.dtd", "<!ELEMENT z EMPTY>\n")]);
    let mut parser = DtdParser::with_resolver(resolver);
    let dtd = parser.parse_external_subset(
        InputSource::from_str("<!ENTITY % ext SYSTEM \"mod.dtd\">\n%ext;\n<!ELEMENT y (z)>\n"),
        None,
    )?;
    assert!(dtd.element_type(&name("z")).is_some());
    assert!(dtd
        .element_type(&name("y"))
        .unwrap()
        .children()
        .contains(&name("z")));
    Ok(())
}

#[test]
fn relative_system_ids_resolve_against_the_including_resource() -> Result<()> {
    let resolver = MapResolver::new(&[(
        "http://example.com/dtds/mod.dtd",
        "<!ELEMENT fetched EMPTY>\n",
    )]);
    let mut parser = DtdParser::with_resolver(resolver);
    let dtd = parser.parse_external_subset(
        InputSource::from_str("<!ENTITY % m SYSTEM \"mod.dtd\">\n%m;\n")
            .with_system_id("http://example.com/dtds/main.dtd"),
        None,
    )?;
    assert!(dtd.element_type(&name("fetched")).is_some());
    Ok(())
}

#[test]
fn public_ids_reach_the_resolver() -> Result<()> {
    struct PublicIdResolver;
    impl EntityResolver for PublicIdResolver {
        fn resolve_entity(
            &self,
            public_id: Option<&str>,
            system_id: Option<&str>,
        ) -> std::io::Result<Option<InputSource>> {
            assert_eq!(public_id, Some("-//Example//DTD r//EN"));
            assert_eq!(system_id, Some("r.dtd"));
            Ok(Some(InputSource::from_str("<!ELEMENT r EMPTY>")))
        }
    }
    let mut parser = DtdParser::with_resolver(PublicIdResolver);
    let dtd = parser.parse_xml_document(
        InputSource::from_str("<!DOCTYPE r PUBLIC \"-//Example//DTD r//EN\" \"r.dtd\">\n<r/>"),
        None,
    )?;
    assert!(dtd.element_type(&name("r")).is_some());
    Ok(())
}

#[test]
fn unresolved_external_subset_is_an_io_error() {
    let mut parser = DtdParser::new();
    let err = parser
        .parse_external_subset(InputSource::from_system_id("nowhere.dtd"), None)
        .expect_err("should fail");
    assert_eq!(err.kind(), DtdErrorKind::Io);
    assert!(err.to_string().contains("nowhere.dtd"));
}

#[test]
fn resolved_source_without_a_stream_is_rejected() {
    struct IdOnlyResolver;
    impl EntityResolver for IdOnlyResolver {
        fn resolve_entity(
            &self,
            _public_id: Option<&str>,
            system_id: Option<&str>,
        ) -> std::io::Result<Option<InputSource>> {
            Ok(system_id.map(InputSource::from_system_id))
        }
    }
    let mut parser = DtdParser::with_resolver(IdOnlyResolver);
    let err = parser
        .parse_external_subset(InputSource::from_system_id("loop.dtd"), None)
        .expect_err("should fail");
    assert_eq!(err.kind(), DtdErrorKind::Io);
    assert!(err.to_string().contains("neither"));
}

#[test]
fn byte_streams_are_decoded_from_their_bom() -> Result<()> {
    let mut raw = b"\xEF\xBB\xBF<!ELEMENT a EMPTY>".to_vec();
    let mut parser = DtdParser::new();
    let dtd = parser.parse_external_subset(InputSource::from_reader(Cursor::new(raw)), None)?;
    assert!(dtd.element_type(&name("a")).is_some());

    raw = vec![0xFF, 0xFE];
    for unit in "<!ELEMENT b EMPTY>".encode_utf16() {
        raw.extend_from_slice(&unit.to_le_bytes());
    }
    let dtd = parser.parse_external_subset(InputSource::from_reader(Cursor::new(raw)), None)?;
    assert!(dtd.element_type(&name("b")).is_some());
    Ok(())
}

#[test]
fn a_parser_can_be_reused() -> Result<()> {
    let mut parser = DtdParser::new();
    let first = parser.parse_external_subset(InputSource::from_str("<!ELEMENT a EMPTY>"), None)?;
    let second = parser.parse_external_subset(InputSource::from_str("<!ELEMENT b EMPTY>"), None)?;
    assert!(first.element_type(&name("a")).is_some());
    assert!(second.element_type(&name("a")).is_none());
    assert!(second.element_type(&name("b")).is_some());
    Ok(())
}

fn parse_external(text: &str) -> Result<Dtd> {
    let mut parser = DtdParser::new();
    Ok(parser.parse_external_subset(InputSource::from_str(text), None)?)
}

#[test]
fn nested_ignore_terminates_at_the_matching_close() -> Result<()> {
    let dtd = parse_external(
        "<![IGNORE[\n<![INCLUDE[ <!ELEMENT x EMPTY> ]]>\n<!ELEMENT hidden EMPTY>\n]]>\n<!ELEMENT visible EMPTY>\n",
    )?;
    assert_eq!(dtd.element_types().len(), 1);
    assert!(dtd.element_type(&name("visible")).is_some());
    Ok(())
}

#[test]
fn unclosed_ignore_section_reports_eof() {
    let mut parser = DtdParser::new();
    let err = parser
        .parse_external_subset(
            InputSource::from_str("<![IGNORE[ <!ELEMENT hidden EMPTY> "),
            None,
        )
        .expect_err("should fail");
    assert_eq!(err.kind(), DtdErrorKind::UnexpectedEof);
}
