//! # Envelope Codec
//!
//! Wire format of every signed document:
//!
//! ```text
//! <Gepg><payloadElement>...</payloadElement><gepgSignature>BASE64</gepgSignature></Gepg>
//! ```
//!
//! `unwrap` returns the payload element as the exact byte span it occupied in
//! the received document, so verification sees what the counterparty signed.
//! It never returns a partial result: any structural violation is
//! [`EnvelopeError::Malformed`].

use super::errors::EnvelopeError;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

pub const ENVELOPE_ROOT: &str = "Gepg";
pub const SIGNATURE_TAG: &str = "gepgSignature";

/// Unwrapped envelope: payload bytes and the Base64 signature text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    payload: Vec<u8>,
    signature: String,
}

impl Envelope {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn into_parts(self) -> (Vec<u8>, String) {
        (self.payload, self.signature)
    }
}

/// Embed a canonical payload and its signature in a `<Gepg>` envelope.
///
/// The payload must be a single element span (`<` ... `>`); it is copied
/// verbatim.
pub fn wrap(payload: &[u8], signature: &str) -> Result<Vec<u8>, EnvelopeError> {
    if payload.is_empty() {
        return Err(malformed("payload is empty"));
    }
    if payload.first() != Some(&b'<') || payload.last() != Some(&b'>') {
        return Err(malformed("payload is not a single element"));
    }

    let signature = escape(signature);
    let mut out = Vec::with_capacity(payload.len() + signature.len() + 64);
    out.extend_from_slice(b"<");
    out.extend_from_slice(ENVELOPE_ROOT.as_bytes());
    out.extend_from_slice(b">");
    out.extend_from_slice(payload);
    out.extend_from_slice(b"<");
    out.extend_from_slice(SIGNATURE_TAG.as_bytes());
    out.extend_from_slice(b">");
    out.extend_from_slice(signature.as_bytes());
    out.extend_from_slice(b"</");
    out.extend_from_slice(SIGNATURE_TAG.as_bytes());
    out.extend_from_slice(b"></");
    out.extend_from_slice(ENVELOPE_ROOT.as_bytes());
    out.extend_from_slice(b">");
    Ok(out)
}

/// Split a received envelope into payload bytes and signature.
pub fn unwrap(bytes: &[u8]) -> Result<Envelope, EnvelopeError> {
    let mut reader = Reader::from_reader(bytes);

    let mut depth = 0usize;
    let mut seen_root = false;
    let mut closed_root = false;
    let mut in_signature = false;
    let mut open_payload: Option<usize> = None;
    let mut payload: Option<(usize, usize)> = None;
    let mut signature: Option<String> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| malformed(format!("not well-formed XML: {e}")))?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                match depth {
                    0 => {
                        check_root(e.name().as_ref(), closed_root)?;
                        seen_root = true;
                    }
                    1 if e.name().as_ref() == SIGNATURE_TAG.as_bytes() => {
                        if signature.is_some() {
                            return Err(malformed("more than one signature element"));
                        }
                        signature = Some(String::new());
                        in_signature = true;
                    }
                    1 => {
                        if payload.is_some() {
                            return Err(malformed("more than one payload element"));
                        }
                        open_payload = Some(element_start(bytes, before)?);
                    }
                    _ if in_signature => {
                        return Err(malformed("signature element has child elements"))
                    }
                    _ => {}
                }
                depth += 1;
            }
            Event::Empty(e) => match depth {
                0 => {
                    check_root(e.name().as_ref(), closed_root)?;
                    return Err(malformed("payload element is absent"));
                }
                1 if e.name().as_ref() == SIGNATURE_TAG.as_bytes() => {
                    if signature.is_some() {
                        return Err(malformed("more than one signature element"));
                    }
                    signature = Some(String::new());
                }
                1 => {
                    if payload.is_some() {
                        return Err(malformed("more than one payload element"));
                    }
                    payload = Some((element_start(bytes, before)?, after));
                }
                _ if in_signature => {
                    return Err(malformed("signature element has child elements"))
                }
                _ => {}
            },
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed("closing tag without opening tag"))?;
                match depth {
                    0 => closed_root = true,
                    1 if in_signature => in_signature = false,
                    1 => {
                        if let Some(start) = open_payload.take() {
                            payload = Some((start, after));
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                if in_signature && depth == 2 {
                    let text = t
                        .unescape()
                        .map_err(|e| malformed(format!("bad signature text: {e}")))?;
                    if let Some(sig) = signature.as_mut() {
                        sig.push_str(&text);
                    }
                } else if depth <= 1 && !t.iter().all(u8::is_ascii_whitespace) {
                    return Err(malformed("text outside of the payload element"));
                }
            }
            Event::CData(c) => {
                if in_signature && depth == 2 {
                    let text = std::str::from_utf8(&c)
                        .map_err(|e| malformed(format!("bad signature text: {e}")))?;
                    if let Some(sig) = signature.as_mut() {
                        sig.push_str(text);
                    }
                } else if depth <= 1 {
                    return Err(malformed("text outside of the payload element"));
                }
            }
            Event::Decl(_) if depth == 0 && !seen_root => {}
            Event::Comment(_) => {}
            Event::Eof => break,
            // PI, DocType and misplaced declarations belong to the payload or nowhere.
            _ if open_payload.is_some() && depth >= 2 => {}
            _ => return Err(malformed("unexpected markup in envelope")),
        }
    }

    if !seen_root {
        return Err(malformed(format!("missing <{ENVELOPE_ROOT}> root element")));
    }
    if depth != 0 {
        return Err(malformed("document ends inside an element"));
    }
    let (start, end) = payload.ok_or_else(|| malformed("payload element is absent"))?;
    let signature =
        signature.ok_or_else(|| malformed(format!("<{SIGNATURE_TAG}> element is absent")))?;

    Ok(Envelope {
        payload: bytes[start..end].to_vec(),
        signature,
    })
}

fn check_root(name: &[u8], closed_root: bool) -> Result<(), EnvelopeError> {
    if closed_root {
        return Err(malformed("trailing element after the envelope"));
    }
    if name != ENVELOPE_ROOT.as_bytes() {
        return Err(malformed(format!(
            "root element is <{}>, expected <{ENVELOPE_ROOT}>",
            String::from_utf8_lossy(name)
        )));
    }
    Ok(())
}

/// Offset of the `<` opening the element the reader just returned.
///
/// When text precedes the tag the reader has already consumed the `<`
/// together with the text, so the tag body starts at `before`.
fn element_start(bytes: &[u8], before: usize) -> Result<usize, EnvelopeError> {
    let start = if bytes.get(before) == Some(&b'<') {
        before
    } else {
        before.saturating_sub(1)
    };
    if bytes.get(start) != Some(&b'<') {
        return Err(malformed("cannot locate the payload element"));
    }
    Ok(start)
}

fn malformed(reason: impl Into<String>) -> EnvelopeError {
    EnvelopeError::Malformed(reason.into())
}
