//! Element screenshots offered as a download.
//!
//! [`capture`] clears the element's inline border, hands it to a
//! [`Rasterizer`], restores the border and wraps the PNG as `image.png`. It
//! never touches the pending-update buffer.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as Base64Engine;
use log::debug;

use crate::page::{Element, Page};
use crate::{Error, Result};

/// File name offered for every capture
pub const DOWNLOAD_FILE_NAME: &str = "image.png";

/// A rasterized element
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

/// Turns an element into PNG bytes
pub trait Rasterizer {
    fn rasterize(&self, element: &Element) -> Result<Screenshot>;
}

/// A one-shot download produced by [`capture`]
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub screenshot: Screenshot,
}

impl Download {
    /// `data:` URL suitable for an anchor's `href`
    pub fn data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            STANDARD.encode(&self.screenshot.png_data)
        )
    }
}

/// Rasterize the element matching `selector` (`#id`) without its border.
///
/// The element's inline style is put back exactly as it was, whether or not
/// rasterization succeeds.
pub fn capture(page: &mut Page, selector: &str, rasterizer: &dyn Rasterizer) -> Result<Download> {
    let id = page.query_selector_id(selector)?.to_string();
    let element = page
        .element_mut(&id)
        .ok_or_else(|| Error::ConfigError(format!("No element matches '{}'", selector)))?;

    // Put back verbatim, not re-serialized
    let old_style = element.attributes.get("style").cloned();
    element.set_style_property("border", Some("none"));
    let result = rasterizer.rasterize(element);
    match old_style {
        Some(style) => {
            element.attributes.insert("style".to_string(), style);
        }
        None => {
            element.attributes.remove("style");
        }
    }

    let screenshot = result?;
    debug!(
        "Captured '{}' at {}x{} ({} bytes)",
        id,
        screenshot.width,
        screenshot.height,
        screenshot.png_data.len()
    );
    Ok(Download {
        file_name: DOWNLOAD_FILE_NAME.to_string(),
        screenshot,
    })
}

/// Upper bound on either side of a solid-fill capture
#[cfg(feature = "capture")]
const MAX_SIDE: u32 = 16384;

/// Paints the element's box in its background color, with a 1px black frame
/// when a border is set.
#[cfg(feature = "capture")]
#[derive(Debug, Clone, Copy)]
pub struct SolidFillRasterizer {
    pub default_width: u32,
    pub default_height: u32,
}

#[cfg(feature = "capture")]
impl SolidFillRasterizer {
    pub fn from_config(config: &crate::CanvasConfig) -> Self {
        Self {
            default_width: config.default_canvas_width,
            default_height: config.default_canvas_height,
        }
    }
}

#[cfg(feature = "capture")]
impl Default for SolidFillRasterizer {
    fn default() -> Self {
        Self::from_config(&crate::CanvasConfig::default())
    }
}

#[cfg(feature = "capture")]
impl Rasterizer for SolidFillRasterizer {
    fn rasterize(&self, element: &Element) -> Result<Screenshot> {
        let width = element
            .style_property("width")
            .and_then(|v| parse_px(&v))
            .unwrap_or(self.default_width);
        let height = element
            .style_property("height")
            .and_then(|v| parse_px(&v))
            .unwrap_or(self.default_height);
        if width == 0 || height == 0 || width > MAX_SIDE || height > MAX_SIDE {
            return Err(Error::CaptureError(format!(
                "Unsupported capture size {}x{}",
                width, height
            )));
        }

        let fill = element
            .style_property("background-color")
            .and_then(|c| parse_color(&c))
            .unwrap_or([255, 255, 255, 255]);
        let framed = element
            .style_property("border")
            .map(|b| !b.eq_ignore_ascii_case("none") && !b.is_empty())
            .unwrap_or(false);

        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let edge = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                if framed && edge {
                    pixels.extend_from_slice(&[0, 0, 0, 255]);
                } else {
                    pixels.extend_from_slice(&fill);
                }
            }
        }

        let mut png_data = Vec::new();
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| Error::CaptureError(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(&pixels)
            .map_err(|e| Error::CaptureError(format!("PNG data: {}", e)))?;
        writer
            .finish()
            .map_err(|e| Error::CaptureError(format!("PNG finish: {}", e)))?;

        Ok(Screenshot {
            width,
            height,
            png_data,
        })
    }
}

#[cfg(feature = "capture")]
fn parse_px(value: &str) -> Option<u32> {
    let v = value.trim();
    v.strip_suffix("px").unwrap_or(v).trim().parse().ok()
}

/// `#rgb`, `#rrggbb` and a handful of named colors
#[cfg(feature = "capture")]
fn parse_color(value: &str) -> Option<[u8; 4]> {
    let v = value.trim().to_ascii_lowercase();
    if let Some(hex) = v.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    rgb[i] = channel(&c.to_string())? * 17;
                }
                Some([rgb[0], rgb[1], rgb[2], 255])
            }
            6 => Some([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            ]),
            _ => None,
        };
    }
    match v.as_str() {
        "white" => Some([255, 255, 255, 255]),
        "black" => Some([0, 0, 0, 255]),
        "red" => Some([255, 0, 0, 255]),
        "green" => Some([0, 128, 0, 255]),
        "blue" => Some([0, 0, 255, 255]),
        "transparent" => Some([0, 0, 0, 0]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingRasterizer {
        seen_border: RefCell<Option<String>>,
        fail: bool,
    }

    impl Rasterizer for RecordingRasterizer {
        fn rasterize(&self, element: &Element) -> Result<Screenshot> {
            *self.seen_border.borrow_mut() = element.style_property("border");
            if self.fail {
                return Err(Error::CaptureError("boom".into()));
            }
            Ok(Screenshot {
                width: 1,
                height: 1,
                png_data: vec![1, 2, 3],
            })
        }
    }

    fn page() -> Page {
        let mut page = Page::new();
        page.insert(
            "photo-canvas",
            Element::new("div").with_attribute("style", "width: 4px; border: 2px dashed red"),
        );
        page
    }

    #[test]
    fn border_is_cleared_then_restored() {
        let mut page = page();
        let r = RecordingRasterizer { seen_border: RefCell::new(None), fail: false };
        let download = capture(&mut page, "#photo-canvas", &r).unwrap();

        assert_eq!(r.seen_border.borrow().as_deref(), Some("none"));
        assert_eq!(
            page.element("photo-canvas").unwrap().style_property("border").as_deref(),
            Some("2px dashed red")
        );
        assert_eq!(download.file_name, "image.png");
        assert_eq!(download.data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn border_is_restored_on_failure() {
        let mut page = page();
        let r = RecordingRasterizer { seen_border: RefCell::new(None), fail: true };
        assert!(matches!(
            capture(&mut page, "#photo-canvas", &r),
            Err(Error::CaptureError(_))
        ));
        assert_eq!(
            page.element("photo-canvas").unwrap().style_property("border").as_deref(),
            Some("2px dashed red")
        );
    }

    #[test]
    fn element_without_border_stays_without() {
        let mut page = Page::new();
        page.insert("c", Element::new("div"));
        let r = RecordingRasterizer { seen_border: RefCell::new(None), fail: false };
        capture(&mut page, "#c", &r).unwrap();
        assert!(page.element("c").unwrap().style_property("border").is_none());
        assert!(!page.element("c").unwrap().attributes.contains_key("style"));
    }

    #[test]
    fn other_style_declarations_survive_capture() {
        let style = "background-image: url(data:image/png;base64,AAAA); border: 1px solid red";
        let mut page = Page::new();
        page.insert("c", Element::new("div").with_attribute("style", style));
        let r = RecordingRasterizer { seen_border: RefCell::new(None), fail: false };
        capture(&mut page, "#c", &r).unwrap();
        assert_eq!(page.element("c").unwrap().attributes["style"], style);

        let failing = RecordingRasterizer { seen_border: RefCell::new(None), fail: true };
        assert!(capture(&mut page, "#c", &failing).is_err());
        assert_eq!(page.element("c").unwrap().attributes["style"], style);
    }

    #[test]
    fn unknown_selector_is_rejected() {
        let mut page = page();
        let r = RecordingRasterizer { seen_border: RefCell::new(None), fail: false };
        assert!(matches!(capture(&mut page, "#nope", &r), Err(Error::ConfigError(_))));
    }

    #[cfg(feature = "capture")]
    #[test]
    fn parse_colors() {
        assert_eq!(parse_color("#fff"), Some([255, 255, 255, 255]));
        assert_eq!(parse_color("#10ff00"), Some([16, 255, 0, 255]));
        assert_eq!(parse_color("Black"), Some([0, 0, 0, 255]));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_px("250px"), Some(250));
        assert_eq!(parse_px("auto"), None);
    }
}
