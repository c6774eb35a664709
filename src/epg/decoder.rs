//! Streaming decoder from guide XML to [`Guide`].

use std::io::{BufRead, BufReader, Read};

use quick_xml::Reader;
use quick_xml::errors::IllFormedError;
use quick_xml::escape::{EscapeError, resolve_predefined_entity};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesRef, BytesStart, Event};
use tracing::{debug, trace};

use super::Timestamp;
use super::model::*;
use crate::error::{Error, Result};

/// Decode a guide document from a byte stream.
///
/// The stream is read forward once. Decoding stops at the end of the first
/// `tv` element; anything after it is never read. A stream without a `tv`
/// element decodes to an empty guide.
pub fn decode<R: Read>(stream: R) -> Result<Guide> {
    Decoder::new(BufReader::new(stream)).decode_document()
}

/// Decode a guide document held in memory.
pub fn decode_str(content: &str) -> Result<Guide> {
    Decoder::new(content.as_bytes()).decode_document()
}

/// Attributes of `programme`, rejected when written as child elements.
const BROADCAST_ATTRIBUTES: [&[u8]; 4] = [b"channel", b"id", b"start", b"stop"];

struct Decoder<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> Decoder<R> {
    fn new(input: R) -> Self {
        Decoder {
            reader: Reader::from_reader(input),
            buf: Vec::new(),
        }
    }

    fn decode_document(mut self) -> Result<Guide> {
        loop {
            match self.next_event()? {
                Event::Start(e) if local_name(e.name().as_ref()) == b"tv" => {
                    let guide = self.decode_guide()?;
                    debug!(broadcasts = guide.len(), "decoded guide");
                    return Ok(guide);
                }
                Event::Empty(e) if local_name(e.name().as_ref()) == b"tv" => {
                    debug!(broadcasts = 0, "decoded guide");
                    return Ok(Guide::default());
                }
                Event::Start(e) => self.skip(&e)?,
                Event::Eof => {
                    debug!("no <tv> element in document");
                    return Ok(Guide::default());
                }
                _ => {}
            }
        }
    }

    fn decode_guide(&mut self) -> Result<Guide> {
        let mut guide = Guide::default();

        loop {
            match self.next_event()? {
                Event::Start(e) if local_name(e.name().as_ref()) == b"programme" => {
                    guide.broadcasts.push(self.decode_broadcast(&e, false)?);
                }
                Event::Empty(e) if local_name(e.name().as_ref()) == b"programme" => {
                    guide.broadcasts.push(self.decode_broadcast(&e, true)?);
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => return Ok(guide),
                Event::Eof => return Err(self.missing_end("tv")),
                _ => {}
            }
        }
    }

    fn decode_broadcast(&mut self, start: &BytesStart, empty: bool) -> Result<Broadcast> {
        let mut broadcast = Broadcast::default();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.malformed_here(e.into()))?;
            match local_name(attr.key.as_ref()) {
                b"channel" => broadcast.channel = self.attr_value(&attr)?,
                b"id" => broadcast.id = self.attr_value(&attr)?,
                b"start" => broadcast.start = Some(self.timestamp("start", &attr)?),
                b"stop" => broadcast.stop = Some(self.timestamp("stop", &attr)?),
                _ => {}
            }
        }

        if empty {
            return Ok(broadcast);
        }

        loop {
            match self.next_event()? {
                Event::Start(e) => self.broadcast_child(&mut broadcast, &e, false)?,
                Event::Empty(e) => self.broadcast_child(&mut broadcast, &e, true)?,
                Event::End(_) => return Ok(broadcast),
                Event::Eof => return Err(self.missing_end("programme")),
                _ => {}
            }
        }
    }

    fn broadcast_child(
        &mut self,
        broadcast: &mut Broadcast,
        child: &BytesStart,
        empty: bool,
    ) -> Result<()> {
        match local_name(child.name().as_ref()) {
            b"catchup" => broadcast.catchup = Some(self.text(child, empty)?.into()),
            b"category" => broadcast.category = Some(self.text(child, empty)?.into()),
            b"cna-rating" => broadcast.rating = Some(self.text(child, empty)?.into()),
            b"desc" => broadcast.description = Some(self.text(child, empty)?.into()),
            b"format" => broadcast.format = Some(self.text(child, empty)?.into()),
            b"replay" => broadcast.replay = Some(self.text(child, empty)?.into()),
            b"title" => broadcast.title = Some(self.text(child, empty)?.into()),
            b"credits" => {
                self.skip_unless(child, empty)?;
                broadcast.credits = Some(Credits {});
            }
            b"icon" => broadcast.icon = Some(self.icon(child, empty)?),
            b"series" => broadcast.series = Some(self.series(empty)?),
            attr if BROADCAST_ATTRIBUTES.contains(&attr) => {
                return Err(self.mismatch(
                    "programme",
                    format!(
                        "`{}` must be an attribute, not an element",
                        String::from_utf8_lossy(attr)
                    ),
                ));
            }
            _ => self.skip_unless(child, empty)?,
        }

        Ok(())
    }

    fn series(&mut self, empty: bool) -> Result<SeriesInfo> {
        let mut series = SeriesInfo::default();

        if empty {
            return Ok(series);
        }

        loop {
            let (child, empty) = match self.next_event()? {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::End(_) => return Ok(series),
                Event::Eof => return Err(self.missing_end("series")),
                _ => continue,
            };

            match local_name(child.name().as_ref()) {
                b"episode-num" => series.episode_num = Some(self.text(&child, empty)?.into()),
                b"season-num" => series.season_num = Some(self.text(&child, empty)?.into()),
                b"series-id" => series.series_id = Some(self.text(&child, empty)?.into()),
                b"series-name" => series.series_name = Some(self.text(&child, empty)?.into()),
                _ => self.skip_unless(&child, empty)?,
            }
        }
    }

    fn icon(&mut self, start: &BytesStart, empty: bool) -> Result<Icon> {
        let mut icon = Icon::default();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.malformed_here(e.into()))?;
            if local_name(attr.key.as_ref()) == b"src" {
                icon.src = Some(self.attr_value(&attr)?);
            }
        }

        if empty {
            return Ok(icon);
        }

        loop {
            match self.next_event()? {
                Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"src" => {
                    return Err(self.mismatch(
                        "icon",
                        "`src` must be an attribute, not an element".to_string(),
                    ));
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => return Ok(icon),
                Event::Eof => return Err(self.missing_end("icon")),
                _ => {}
            }
        }
    }

    /// Collect the character data of a leaf element up to its end tag.
    fn text(&mut self, start: &BytesStart, empty: bool) -> Result<String> {
        let mut text = String::new();

        if empty {
            return Ok(text);
        }

        loop {
            match self.next_event()? {
                Event::Text(e) => {
                    let decoded = e.decode().map_err(|e| self.malformed_here(e.into()))?;
                    text.push_str(&decoded);
                }
                Event::CData(e) => {
                    let decoded = e.decode().map_err(|e| self.malformed_here(e.into()))?;
                    text.push_str(&decoded);
                }
                Event::GeneralRef(e) => text.push_str(&self.reference_text(&e)?),
                Event::Start(e) | Event::Empty(e) => {
                    let element = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    let reason = format!(
                        "expected text, found element <{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    );
                    return Err(self.mismatch(&element, reason));
                }
                Event::End(_) => return Ok(text),
                Event::Eof => {
                    return Err(self.missing_end(&String::from_utf8_lossy(start.name().as_ref())));
                }
                _ => {}
            }
        }
    }

    /// Resolve a `&...;` reference to the text it stands for.
    fn reference_text(&self, reference: &BytesRef) -> Result<String> {
        if let Some(ch) = reference
            .resolve_char_ref()
            .map_err(|e| self.malformed_here(e.into()))?
        {
            return Ok(ch.to_string());
        }

        let name = reference
            .decode()
            .map_err(|e| self.malformed_here(e.into()))?;
        match resolve_predefined_entity(&name) {
            Some(resolved) => Ok(resolved.to_string()),
            None => Err(self.malformed_here(quick_xml::Error::Escape(
                EscapeError::UnrecognizedEntity(0..name.len(), name.into_owned()),
            ))),
        }
    }

    fn attr_value(&self, attr: &Attribute) -> Result<String> {
        attr.unescape_value()
            .map(|value| value.into_owned())
            .map_err(|e| self.malformed_here(e.into()))
    }

    fn timestamp(&self, attribute: &'static str, attr: &Attribute) -> Result<Timestamp> {
        let value = self.attr_value(attr)?;
        Timestamp::parse(&value).map_err(|source| Error::TimestampFormat { attribute, source })
    }

    /// Read the next event, detached from the read buffer.
    ///
    /// Character data, names and attribute values are checked as UTF-8 and
    /// entity references are checked as resolvable wherever they appear, so
    /// unmodeled content fails the same way as modeled content.
    fn next_event(&mut self) -> Result<Event<'static>> {
        self.buf.clear();
        let event = self
            .reader
            .read_event_into(&mut self.buf)
            .map(Event::into_owned)
            .map_err(|source| Error::MalformedXml {
                position: self.reader.error_position(),
                source,
            })?;

        match &event {
            Event::Start(e) | Event::Empty(e) => self.check_start(e)?,
            Event::Text(e) => {
                e.decode().map_err(|e| self.malformed_here(e.into()))?;
            }
            Event::CData(e) => {
                e.decode().map_err(|e| self.malformed_here(e.into()))?;
            }
            Event::GeneralRef(e) => {
                self.reference_text(e)?;
            }
            _ => {}
        }
        Ok(event)
    }

    fn check_start(&self, start: &BytesStart) -> Result<()> {
        let decoder = self.reader.decoder();
        decoder
            .decode(start.name().as_ref())
            .map_err(|e| self.malformed_here(e.into()))?;

        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.malformed_here(e.into()))?;
            decoder
                .decode(attr.key.as_ref())
                .map_err(|e| self.malformed_here(e.into()))?;
            self.attr_value(&attr)?;
        }
        Ok(())
    }

    /// Consume an unmodeled element and everything inside it.
    fn skip(&mut self, start: &BytesStart) -> Result<()> {
        trace!(
            element = %String::from_utf8_lossy(start.name().as_ref()),
            "skipping element"
        );

        let mut depth = 0usize;
        loop {
            match self.next_event()? {
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => return Ok(()),
                Event::End(_) => depth -= 1,
                Event::Eof => {
                    return Err(self.missing_end(&String::from_utf8_lossy(start.name().as_ref())));
                }
                _ => {}
            }
        }
    }

    fn skip_unless(&mut self, start: &BytesStart, empty: bool) -> Result<()> {
        if empty { Ok(()) } else { self.skip(start) }
    }

    fn malformed_here(&self, source: quick_xml::Error) -> Error {
        Error::MalformedXml {
            position: self.reader.buffer_position(),
            source,
        }
    }

    fn missing_end(&self, element: &str) -> Error {
        self.malformed_here(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(
            element.to_string(),
        )))
    }

    fn mismatch(&self, element: &str, reason: String) -> Error {
        Error::SchemaMismatch {
            element: element.to_string(),
            position: self.reader.buffer_position(),
            reason,
        }
    }
}

/// Extract local name from namespaced XML name (e.g., "xmltv:programme" -> "programme").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"programme"), b"programme");
        assert_eq!(local_name(b"xmltv:programme"), b"programme");
        assert_eq!(local_name(b"cna-rating"), b"cna-rating");
        assert_eq!(local_name(b""), b"");
    }

    #[test]
    fn test_text_keeps_whitespace_and_references() {
        let guide = decode_str(
            "<tv><programme><desc>  Fish &amp; Chips &#65;&#x42; <![CDATA[<raw>]]> </desc></programme></tv>",
        )
        .unwrap();
        let desc = guide.broadcasts[0].description.as_ref().unwrap();
        assert_eq!(desc.as_str(), "  Fish & Chips AB <raw> ");
    }

    #[test]
    fn test_comment_inside_text_is_ignored() {
        let guide = decode_str("<tv><programme><title>Ne<!-- x -->ws</title></programme></tv>")
            .unwrap();
        assert_eq!(guide.broadcasts[0].title_str(), Some("News"));
    }

    #[test]
    fn test_unknown_entity_is_malformed() {
        let err = decode_str("<tv><programme><title>&bogus;</title></programme></tv>")
            .unwrap_err();
        assert!(err.is_malformed_xml(), "{err:?}");
    }

    #[test]
    fn test_unclosed_guide_is_malformed() {
        let err = decode_str("<tv><programme channel=\"1\">").unwrap_err();
        assert!(err.is_malformed_xml(), "{err:?}");
    }

    #[test]
    fn test_mismatched_end_tag_is_malformed() {
        let err = decode_str("<tv><programme></tv>").unwrap_err();
        assert!(err.is_malformed_xml(), "{err:?}");
    }

    #[test]
    fn test_duplicate_attribute_is_malformed() {
        let err = decode_str("<tv><programme id=\"a\" id=\"b\"/></tv>").unwrap_err();
        assert!(err.is_malformed_xml(), "{err:?}");
    }

    #[test]
    fn test_attribute_as_element_is_mismatch() {
        let err = decode_str("<tv><programme><id>a</id></programme></tv>").unwrap_err();
        match err {
            Error::SchemaMismatch { element, .. } => assert_eq!(element, "programme"),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = decode_str("<tv><programme><icon><src>x</src></icon></programme></tv>")
            .unwrap_err();
        assert!(err.is_schema_mismatch(), "{err:?}");
    }

    #[test]
    fn test_nested_element_in_leaf_is_mismatch() {
        let err = decode_str("<tv><programme><title>A<b>B</b></title></programme></tv>")
            .unwrap_err();
        match err {
            Error::SchemaMismatch { element, reason, .. } => {
                assert_eq!(element, "title");
                assert!(reason.contains("<b>"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timestamp_error_names_attribute() {
        let err = decode_str("<tv><programme stop=\"2024\"/></tv>").unwrap_err();
        match err {
            Error::TimestampFormat { attribute, source } => {
                assert_eq!(attribute, "stop");
                assert_eq!(source.value, "2024");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_last_duplicate_child_wins() {
        let guide =
            decode_str("<tv><programme><title>First</title><title>Second</title></programme></tv>")
                .unwrap();
        assert_eq!(guide.broadcasts[0].title_str(), Some("Second"));
    }

    #[test]
    fn test_leaf_attributes_are_ignored() {
        let guide =
            decode_str("<tv><programme><title lang=\"en\">News</title></programme></tv>").unwrap();
        assert_eq!(guide.broadcasts[0].title_str(), Some("News"));
    }

    #[test]
    fn test_invalid_utf8_outside_text_is_malformed() {
        let docs: [&[u8]; 4] = [
            b"<tv>\xff<programme id=\"a\"/></tv>",
            b"<tv><programme id=\"a\" extra=\"\xfe\"/></tv>",
            b"<tv><programme><unknown>\xff</unknown></programme></tv>",
            b"<tv><channel id=\"1\"><display-name>\xfe</display-name></channel></tv>",
        ];
        for doc in docs {
            let err = decode(doc).unwrap_err();
            assert!(err.is_malformed_xml(), "{err:?}");
        }
    }

    #[test]
    fn test_skipped_subtree_keeps_nesting() {
        let guide = decode_str(
            "<tv><programme><extra><extra/><extra>x</extra></extra><title>T</title></programme></tv>",
        )
        .unwrap();
        assert_eq!(guide.broadcasts[0].title_str(), Some("T"));
    }
}
