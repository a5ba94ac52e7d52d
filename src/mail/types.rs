//! Provider-neutral message shapes, body decoding, address parsing.
//!
//! The serde layout mirrors Gmail's `users.messages` resource so the Gmail
//! client can deserialize straight into these types.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Gmail emits unpadded base64url, but padded and standard-alphabet bodies
/// show up from other producers.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A search hit: an opaque message id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Full message representation returned by a fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Epoch milliseconds, as a decimal string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<MessagePart>,
}

/// One node of the MIME tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<PartBody>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Encoded body content of a part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl RawMessage {
    /// Look up a top-level header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .as_ref()?
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Provider-side receive time, if present.
    pub fn internal_timestamp(&self) -> Option<DateTime<Utc>> {
        self.internal_date
            .as_deref()
            .and_then(|d| d.trim().parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
    }

    /// Decode the primary text content of the message.
    ///
    /// Order: first `text/plain` part anywhere in the tree, then the
    /// top-level body, then the first `text/html` part (tags stripped).
    /// A message with none of these has an empty body.
    pub fn text_body(&self) -> Result<String, base64::DecodeError> {
        let Some(payload) = &self.payload else {
            return Ok(String::new());
        };

        if let Some(data) = find_part_data(&payload.parts, "text/plain") {
            return decode_body_data(data);
        }

        if let Some(data) = payload.data() {
            let text = decode_body_data(data)?;
            return Ok(if payload.is_mime("text/html") {
                strip_html(&text)
            } else {
                text
            });
        }

        if let Some(data) = find_part_data(&payload.parts, "text/html") {
            return decode_body_data(data).map(|html| strip_html(&html));
        }

        Ok(String::new())
    }
}

impl MessagePart {
    fn data(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
    }

    fn is_mime(&self, mime: &str) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case(mime))
    }
}

/// Depth-first search for the first part of `mime` type carrying data.
fn find_part_data<'a>(parts: &'a [MessagePart], mime: &str) -> Option<&'a str> {
    for part in parts {
        if part.is_mime(mime)
            && let Some(data) = part.data()
        {
            return Some(data);
        }
        if let Some(data) = find_part_data(&part.parts, mime) {
            return Some(data);
        }
    }
    None
}

/// Decode base64 body data into text. Invalid UTF-8 is replaced, not rejected.
pub fn decode_body_data(data: &str) -> Result<String, base64::DecodeError> {
    let bytes = URL_SAFE_LENIENT
        .decode(data)
        .or_else(|_| STANDARD_LENIENT.decode(data))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Strip HTML tags and collapse whitespace (basic).
pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                result.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    let text = result
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A parsed `From`-style address: `"Name" <addr@example.com>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub name: Option<String>,
    pub address: String,
}

impl Mailbox {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if let Some(start) = value.find('<')
            && let Some(end) = value[start..].find('>')
        {
            let address = value[start + 1..start + end].trim().to_string();
            let name = value[..start].replace('"', "").trim().to_string();
            return Self {
                name: (!name.is_empty()).then_some(name),
                address,
            };
        }
        Self {
            name: None,
            address: value.to_string(),
        }
    }

    /// Display name, falling back to the bare address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}
