//! # Domain Models
//!
//! These structs represent the entities the notice writer moves around:
//! the draft being edited, the image pulled out of it, and what travels
//! to and from the notice backend.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::error::{NoticeError, Result};

/// Hard cap of the title input, in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Lenient decoding of data URI bodies: padding optional, stray trailing bits ignored.
const FORGIVING_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// The notice being written. Lives only as long as the form does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeDraft {
    pub title: String,
    /// Rich-text HTML as produced by the editor
    pub content: String,
}

impl NoticeDraft {
    /// Replaces the title, dropping anything past [`TITLE_MAX_CHARS`].
    pub fn set_title(&mut self, title: &str) {
        self.title = title.chars().take(TITLE_MAX_CHARS).collect();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }
}

/// Identifier the backend hands back for a stored notice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoticeNo(String);

impl NoticeNo {
    pub fn new(no: impl Into<String>) -> Self {
        Self(no.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads a `notice_no` field, accepting any truthy scalar.
    ///
    /// `null`, `false`, `0`, and `""` count as absent. Arrays and objects
    /// are not identifiers and are rejected as well.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Bool(true) => Some(Self::new("true")),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    (i != 0).then(|| Self::new(i.to_string()))
                } else if let Some(u) = n.as_u64() {
                    Some(Self::new(u.to_string()))
                } else {
                    let f = n.as_f64()?;
                    if f == 0.0 || f.is_nan() {
                        None
                    } else if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                        Some(Self::new((f as i64).to_string()))
                    } else {
                        Some(Self::new(f.to_string()))
                    }
                }
            }
            Value::String(s) if !s.is_empty() => Some(Self::new(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for NoticeNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Places the composer can send the user to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Detail view of one notice
    NoticeContent(NoticeNo),
    /// The notice list, target of "back"
    NoticeList,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::NoticeContent(no) => write!(f, "/NoticeContent/{}", no),
            Route::NoticeList => f.write_str("/NoticeList"),
        }
    }
}

/// An image inlined as `data:<mime>[;params],<payload>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Everything between `data:` and the first comma
    header: String,
    payload: String,
}

impl DataUri {
    /// Whether a `src` attribute holds an embedded image rather than a link.
    pub fn is_embedded_image(src: &str) -> bool {
        src.starts_with("data:image")
    }

    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| NoticeError::InvalidDataUri("missing data: scheme".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| NoticeError::InvalidDataUri("missing payload separator".into()))?;
        Ok(Self {
            header: header.to_string(),
            payload: payload.to_string(),
        })
    }

    /// Wraps encoded bytes as a base64 data URI of the given media type.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self {
            header: format!("{};base64", mime),
            payload: STANDARD.encode(bytes),
        }
    }

    pub fn mime(&self) -> &str {
        self.header.split(';').next().unwrap_or_default()
    }

    pub fn is_base64(&self) -> bool {
        self.header
            .split(';')
            .skip(1)
            .any(|param| param.eq_ignore_ascii_case("base64"))
    }

    /// The body after the header. For base64 URIs this is what the backend stores.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        if !self.is_base64() {
            return Err(NoticeError::InvalidDataUri(format!(
                "{} is not base64 encoded",
                self.mime()
            )));
        }
        let compact: String = self
            .payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        FORGIVING_BASE64
            .decode(compact)
            .map_err(|e| NoticeError::InvalidDataUri(e.to_string()))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{},{}", self.header, self.payload)
    }
}

/// The first `<img>` element located in an HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageElement {
    /// Byte range of the whole tag within the fragment
    pub span: Range<usize>,
    /// Decoded `src` attribute, if the tag has one
    pub src: Option<String>,
}

/// Content split into its text and the detached embedded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatedContent {
    pub text: String,
    /// Present only when the first image was a `data:image` URI
    pub image_data: Option<String>,
}

/// A decoded raster, 8-bit RGBA, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// JSON body of `POST /noticeInsert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticePayload {
    pub title: String,
    pub content: String,
    /// Base64 image body without the `data:` header
    pub file: Option<String>,
}

/// A stored notice as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeItem {
    pub no: i64,
    pub title: String,
    pub content: Option<String>,
    pub date: NaiveDateTime,
    pub file: Option<String>,
}
