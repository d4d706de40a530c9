//! Event-level access to the XML parts of an XLSX template: worksheet,
//! shared strings, workbook and its relationship list.

use crate::error::TravelSheetError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use thiserror::Error;

const EVENT_BUFFER_CAPACITY: usize = 1024;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    ParseEntityError(String),
}

/// Pull reader that hands out one event at a time from a reused buffer.
///
/// Empty elements are expanded into start/end pairs so `<c r="A1"/>` and
/// `<c r="A1"></c>` look the same to callers, and whitespace inside text
/// runs is kept because template cells may hold it on purpose.
pub(crate) struct XmlReader<R: BufRead> {
    inner: Reader<R>,
    event_buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut inner = Reader::from_reader(source);
        let settings = inner.config_mut();
        settings.expand_empty_elements = true;
        settings.check_end_names = false;
        settings.check_comments = false;
        settings.trim_text(false);
        XmlReader {
            inner,
            event_buffer: Vec::with_capacity(EVENT_BUFFER_CAPACITY),
        }
    }

    /// Returns the next event, or `None` once the part is exhausted
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, TravelSheetError> {
        self.event_buffer.clear();
        let event = self.inner.read_event_into(&mut self.event_buffer)?;
        Ok((!matches!(event, Event::Eof)).then_some(event))
    }
}

pub(crate) trait XmlAttributeHelper<'a> {
    /// Attribute value with XML escapes resolved
    fn get_value(&self) -> Result<Cow<'a, str>, TravelSheetError>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, TravelSheetError> {
        self.unescape_value().map_err(TravelSheetError::from)
    }
}

pub(crate) trait XmlNodeHelper<'a> {
    /// Looks up `name` on the element, `None` when the attribute is absent
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, TravelSheetError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, TravelSheetError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.get_value()?)),
            None => Ok(None),
        }
    }
}

/// Accumulates cell text split across text events and entity references
pub(crate) trait XmlTextContextHelper {
    fn push_bytes_ref(&mut self, reference: &BytesRef) -> Result<(), TravelSheetError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_ref(&mut self, reference: &BytesRef) -> Result<(), TravelSheetError> {
        let name = reference.xml_content()?;
        match name.strip_prefix('#') {
            Some(code_point) => {
                // Code points outside the scalar range are dropped.
                if let Some(character) = char::from_u32(parse_code_point(code_point)?) {
                    self.push(character);
                }
            }
            None => match resolve_xml_entity(&name) {
                Some(replacement) => self.push_str(replacement),
                None => Err(XmlError::ParseEntityError(name.into_owned()))?,
            },
        }
        Ok(())
    }
}

/// Parses the body of `&#NNN;` or `&#xHHH;`
fn parse_code_point(body: &str) -> Result<u32, TravelSheetError> {
    let code = match body.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16)?,
        None => body.parse()?,
    };
    Ok(code)
}

/// Drives an [`XmlReader`] to the end of the part, dispatching each event to
/// the given match arms. Unmatched events are skipped.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                $($arms)*
                _ => {}
            }
        }
    };
}
