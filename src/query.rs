//! Page URL query parameters.
//!
//! Besides plain lookups this reads the items a page is opened with. Every
//! item attribute is a repeated key and values line up by position:
//!
//! ```text
//! ?type=text&type=image&x=10&x=40&value=Hello&value=<base64>&font_size=16&name=logo.png
//! ```
//!
//! `type`, `value`, `x`, `y`, `width`, `height` and `movable` are indexed by
//! item. Text-only keys (`font_size`, `font_family`, `font_color`,
//! `background_color`, `editable`) are indexed among text items, and `name`
//! among image items. Image values are base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as Base64Engine;
use log::warn;
use std::str::FromStr;
use url::Url;

use crate::items::{build_file_payload, build_item, build_text_payload, Item, TextPayload};
use crate::{Error, Result};

/// Canvas dimensions requested by the page URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanvasSettings {
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Decoded query string, keeping every value in URL order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse the query of a full URL
    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self {
            pairs: url.query_pairs().into_owned().collect(),
        })
    }

    /// Parse a bare query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// All values of a repeated key in URL order; empty when the key is absent
    pub fn get_param(&self, name: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Canvas size from the first `canvas_width` / `canvas_height` values
    pub fn parse_canvas_settings(&self) -> CanvasSettings {
        let first = |key: &str| {
            self.get_param(key)
                .first()
                .and_then(|v| v.parse::<i32>().ok())
        };
        CanvasSettings {
            width: first("canvas_width"),
            height: first("canvas_height"),
        }
    }

    /// Build the items described by the query string, in `type` order.
    ///
    /// Unparsable values fall back to defaults. Entries with an unknown
    /// `type` are skipped.
    pub fn parse_items(&self) -> Vec<Item> {
        let types = self.get_param("type");
        let values = self.get_param("value");
        let xs = self.get_param("x");
        let ys = self.get_param("y");
        let widths = self.get_param("width");
        let heights = self.get_param("height");
        let movables = self.get_param("movable");
        let editables = self.get_param("editable");
        let font_sizes = self.get_param("font_size");
        let font_families = self.get_param("font_family");
        let font_colors = self.get_param("font_color");
        let background_colors = self.get_param("background_color");
        let names = self.get_param("name");

        let defaults = TextPayload::default();
        let mut items = Vec::new();
        let mut text_i = 0;
        let mut image_i = 0;

        for (i, kind) in types.iter().enumerate() {
            let x = parse_at(&xs, i, "x").unwrap_or(0);
            let y = parse_at(&ys, i, "y").unwrap_or(0);
            let width = parse_at(&widths, i, "width");
            let height = parse_at(&heights, i, "height");
            let movable = parse_at(&movables, i, "movable").unwrap_or(false);

            match kind.as_str() {
                "text" => {
                    let content = build_text_payload(
                        values.get(i).cloned().unwrap_or_else(|| defaults.text.clone()),
                        parse_at(&font_sizes, text_i, "font_size").unwrap_or(defaults.font_size),
                        font_families
                            .get(text_i)
                            .cloned()
                            .unwrap_or_else(|| defaults.font_family.clone()),
                        font_colors
                            .get(text_i)
                            .cloned()
                            .unwrap_or_else(|| defaults.font_color.clone()),
                        background_colors
                            .get(text_i)
                            .cloned()
                            .unwrap_or_else(|| defaults.background_color.clone()),
                        parse_at(&editables, text_i, "editable").unwrap_or(false),
                    );
                    items.push(build_item(Some(content), None, x, y, width, height, movable));
                    text_i += 1;
                }
                "image" => {
                    let name = names.get(image_i).cloned().unwrap_or_default();
                    let data = values
                        .get(i)
                        .map(|v| decode_image_value(&name, v))
                        .unwrap_or_default();
                    let file = build_file_payload(name, "image/png", data);
                    items.push(build_item(None, Some(file), x, y, width, height, movable));
                    image_i += 1;
                }
                other => warn!("Skipping query item {} with unknown type '{}'", i, other),
            }
        }

        items
    }
}

fn parse_at<T: FromStr>(values: &[String], index: usize, key: &str) -> Option<T> {
    let raw = values.get(index)?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            if !raw.is_empty() {
                warn!("Ignoring unparsable value '{}' for '{}'", raw, key);
            }
            None
        }
    }
}

fn decode_image_value(name: &str, value: &str) -> Vec<u8> {
    // form-urlencoding turns an unescaped '+' into a space
    let value = value.trim().replace(' ', "+");
    STANDARD.decode(value.as_bytes()).unwrap_or_else(|e| {
        warn!("Image '{}' is not valid base64: {}", name, e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_keep_url_order() {
        let q = QueryParams::parse("https://phote.example/?a=1&b=x&a=2&a=3").unwrap();
        assert_eq!(q.get_param("a"), vec!["1", "2", "3"]);
        assert_eq!(q.get_param("b"), vec!["x"]);
        assert!(q.get_param("missing").is_empty());
    }

    #[test]
    fn invalid_url_is_reported() {
        assert!(matches!(QueryParams::parse("not a url"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn bare_query_is_accepted() {
        let q = QueryParams::from_query("?font_family=Comic%20Sans&x=1");
        assert_eq!(q.get_param("font_family"), vec!["Comic Sans"]);
    }

    #[test]
    fn canvas_settings_use_first_value() {
        let q = QueryParams::from_query("canvas_width=640&canvas_width=10&canvas_height=abc");
        let s = q.parse_canvas_settings();
        assert_eq!(s.width, Some(640));
        assert_eq!(s.height, None);
    }

    #[test]
    fn text_and_image_keys_are_indexed_per_type() {
        // 1x1 PNG header for the image value
        let mut png = b"\x89PNG\r\n\x1a\n\0\0\0\x0dIHDR".to_vec();
        png.extend_from_slice(&1u32.to_be_bytes());
        png.extend_from_slice(&1u32.to_be_bytes());
        png.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
        let encoded = url::form_urlencoded::byte_serialize(STANDARD.encode(&png).as_bytes())
            .collect::<String>();

        let query = format!(
            "type=text&type=image&type=text&value=first&value={}&value=third\
             &x=1&x=2&x=3&movable=true&movable=false&movable=true\
             &font_size=20&font_size=oops&name=logo.png&width=50",
            encoded
        );
        let items = QueryParams::from_query(&query).parse_items();
        assert_eq!(items.len(), 3);

        let first = items[0].content.as_ref().unwrap();
        assert_eq!(first.text, "first");
        assert_eq!(first.font_size, 20);
        assert_eq!(items[0].width, Some(50));
        assert!(items[0].movable);

        let image = items[1].file.as_ref().unwrap();
        assert_eq!(image.name, "logo.png");
        assert_eq!(image.file_type, "image/png");
        assert_eq!(image.data, png);
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(items[1].x, 2);
        assert!(!items[1].movable);

        let third = items[2].content.as_ref().unwrap();
        assert_eq!(third.text, "third");
        assert_eq!(third.font_size, 8);
        assert_eq!(third.font_family, "Arial");
    }

    #[test]
    fn unknown_types_are_skipped() {
        let items =
            QueryParams::from_query("type=video&type=text&value=ignored&value=hi").parse_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content.as_ref().unwrap().text, "hi");
    }
}
