//! Item payloads and the builders that assemble them.
//!
//! Builders never validate: every field is passed through as given, and a
//! malformed value is left for the consumer to reject. The one structural
//! check, that an item carries exactly one payload, lives in [`Item::kind`].

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Fallback size used when the intrinsic size of a file cannot be detected
pub const DEFAULT_FILE_SIZE: i32 = 100;

/// Attributes of a text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPayload {
    pub text: String,
    pub font_size: u16,
    pub font_family: String,
    pub font_color: String,
    pub background_color: String,
    pub editable: bool,
}

impl Default for TextPayload {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 8,
            font_family: "Arial".to_string(),
            font_color: "black".to_string(),
            background_color: "white".to_string(),
            editable: false,
        }
    }
}

/// A file attachment, usually an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePayload {
    pub name: String,
    pub file_type: String,
    #[serde(with = "crate::codec::base64_bytes")]
    pub data: Vec<u8>,
    /// Intrinsic width in pixels
    pub width: i32,
    /// Intrinsic height in pixels
    pub height: i32,
}

/// A positioned element waiting to be placed on the canvas.
///
/// Items produced by the builders carry exactly one of `content` and `file`.
/// Hand-built values may not; see [`Item::kind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(deserialize_with = "crate::codec::required_nullable")]
    pub content: Option<TextPayload>,
    #[serde(deserialize_with = "crate::codec::required_nullable")]
    pub file: Option<FilePayload>,
    pub x: i32,
    pub y: i32,
    #[serde(deserialize_with = "crate::codec::required_nullable")]
    pub width: Option<i32>,
    #[serde(deserialize_with = "crate::codec::required_nullable")]
    pub height: Option<i32>,
    pub movable: bool,
}

/// Tagged view of an item's payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemKind<'a> {
    Text(&'a TextPayload),
    File(&'a FilePayload),
}

impl Item {
    /// Resolve which payload this item carries.
    ///
    /// Fails with [`Error::EncodingAmbiguity`] when both or neither payload
    /// is set, since such an item cannot be reconstructed by the consumer.
    pub fn kind(&self) -> Result<ItemKind<'_>> {
        match (&self.content, &self.file) {
            (Some(text), None) => Ok(ItemKind::Text(text)),
            (None, Some(file)) => Ok(ItemKind::File(file)),
            (Some(_), Some(_)) => Err(Error::EncodingAmbiguity(
                "both text content and file are set".into(),
            )),
            (None, None) => Err(Error::EncodingAmbiguity(
                "neither text content nor file is set".into(),
            )),
        }
    }
}

pub fn build_text_payload(
    text: impl Into<String>,
    font_size: u16,
    font_family: impl Into<String>,
    font_color: impl Into<String>,
    background_color: impl Into<String>,
    editable: bool,
) -> TextPayload {
    TextPayload {
        text: text.into(),
        font_size,
        font_family: font_family.into(),
        font_color: font_color.into(),
        background_color: background_color.into(),
        editable,
    }
}

/// Build a file payload, detecting the intrinsic size from the image header.
///
/// Data that isn't a recognized image keeps the payload but falls back to
/// [`DEFAULT_FILE_SIZE`] for both dimensions.
pub fn build_file_payload(
    name: impl Into<String>,
    file_type: impl Into<String>,
    data: Vec<u8>,
) -> FilePayload {
    let name = name.into();
    let (width, height) = intrinsic_size(&name, &data);
    FilePayload {
        name,
        file_type: file_type.into(),
        data,
        width,
        height,
    }
}

pub(crate) fn intrinsic_size(name: &str, data: &[u8]) -> (i32, i32) {
    match imagesize::blob_size(data) {
        Ok(size) => match (i32::try_from(size.width), i32::try_from(size.height)) {
            (Ok(width), Ok(height)) => (width, height),
            _ => {
                log::error!(
                    "Resolution of image {} ({}x{}) is out of range. Using default",
                    name,
                    size.width,
                    size.height
                );
                (DEFAULT_FILE_SIZE, DEFAULT_FILE_SIZE)
            }
        },
        Err(e) => {
            log::error!(
                "Failed to get resolution of image {}: {}. Using default",
                name,
                e
            );
            (DEFAULT_FILE_SIZE, DEFAULT_FILE_SIZE)
        }
    }
}

pub fn build_item(
    content: Option<TextPayload>,
    file: Option<FilePayload>,
    x: i32,
    y: i32,
    width: Option<i32>,
    height: Option<i32>,
    movable: bool,
) -> Item {
    Item {
        content,
        file,
        x,
        y,
        width,
        height,
        movable,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn build_text_item(
    text: impl Into<String>,
    font_size: u16,
    font_family: impl Into<String>,
    font_color: impl Into<String>,
    background_color: impl Into<String>,
    editable: bool,
    x: i32,
    y: i32,
    width: Option<i32>,
    height: Option<i32>,
    movable: bool,
) -> Item {
    let content = build_text_payload(
        text,
        font_size,
        font_family,
        font_color,
        background_color,
        editable,
    );
    build_item(Some(content), None, x, y, width, height, movable)
}

#[allow(clippy::too_many_arguments)]
pub fn build_file_item(
    name: impl Into<String>,
    file_type: impl Into<String>,
    data: Vec<u8>,
    x: i32,
    y: i32,
    width: Option<i32>,
    height: Option<i32>,
    movable: bool,
) -> Item {
    let file = build_file_payload(name, file_type, data);
    build_item(None, Some(file), x, y, width, height, movable)
}
