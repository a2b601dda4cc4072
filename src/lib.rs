//! Phote canvas adapter
//!
//! Lets a browser-hosted canvas editor accept new items (text blocks or file
//! attachments) and queue them for the rendering layer, plus a helper that
//! rasterizes a page element to a downloadable `image.png`.
//!
//! # Features
//!
//! - **Item builders**: plain constructors for text and file items
//! - **Null-preserving encoding**: absent fields survive transport as `null`
//! - **Pending-update buffer**: append-only, delimited page state with an
//!   explicit flush handler instead of a simulated click
//! - **Query items**: items and canvas settings read from the page URL
//!
//! # Example
//!
//! ```
//! use phote::{build_text_item, CanvasConfig, ItemQueue, Page};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CanvasConfig::default();
//! let mut queue = ItemQueue::new(Page::canvas_scaffold(&config), config);
//! queue.on_flush(|_page| println!("new items waiting"));
//!
//! let item = build_text_item(
//!     "Hello", 16, "Arial", "black", "white", true, 10, 20, None, None, true,
//! );
//! queue.add_item(&item)?;
//! assert_eq!(queue.drain()?.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod buffer;
pub mod codec;
pub mod items;
pub mod page;
pub mod query;

// Element screenshots (solid-fill rasterizer needs `png`)
pub mod capture;

pub use buffer::ItemQueue;
pub use codec::{decode, decode_buffer, encode, split_entries};
pub use items::{
    build_file_item, build_file_payload, build_item, build_text_item, build_text_payload,
    FilePayload, Item, ItemKind, TextPayload,
};
pub use page::{Element, Page, PageStore};
pub use query::{CanvasSettings, QueryParams};

/// Configuration for the item queue
///
/// The defaults match the element ids and attribute the canvas app renders:
/// a hidden `extra-data-div` holding `data-extra-data`, and the
/// `canvas-update-trigger` button the consumer listens on.
///
/// # Examples
///
/// ```
/// let cfg = phote::CanvasConfig::default();
/// assert_eq!(cfg.delimiter, ',');
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    /// Id of the element holding the pending-update buffer
    pub storage_element_id: String,
    /// Attribute of the storage element holding the buffer
    pub storage_attribute: String,
    /// Id of the element whose activation signals the consumer
    pub trigger_element_id: String,
    /// Separator between encoded entries
    pub delimiter: char,
    /// Canvas width used when the page doesn't specify one
    pub default_canvas_width: u32,
    /// Canvas height used when the page doesn't specify one
    pub default_canvas_height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            storage_element_id: "extra-data-div".to_string(),
            storage_attribute: "data-extra-data".to_string(),
            trigger_element_id: "canvas-update-trigger".to_string(),
            delimiter: ',',
            default_canvas_width: 800,
            default_canvas_height: 800,
        }
    }
}
