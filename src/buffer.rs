//! The pending-update buffer and its flush trigger.
//!
//! Items submitted by the page are encoded and appended to a delimited string
//! kept in an attribute of the storage element. After each append the
//! registered flush handler is told that new entries are waiting. The queue
//! only ever appends; clearing belongs to the consumer through [`ItemQueue::drain`].

use std::sync::Arc;

use log::debug;

use crate::codec::{encode, split_entries};
use crate::items::{build_file_item, build_text_item, Item};
use crate::page::PageStore;
use crate::{CanvasConfig, Error, Result};

type OnFlushHandler<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Producer side of the pending-update buffer
pub struct ItemQueue<S: PageStore> {
    store: S,
    config: CanvasConfig,
    on_flush: Option<OnFlushHandler<S>>,
}

impl<S: PageStore> ItemQueue<S> {
    pub fn new(store: S, config: CanvasConfig) -> Self {
        Self {
            store,
            config,
            on_flush: None,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Register the flush handler. It runs once per successful append, after
    /// the buffer has been written, and receives a read-only view of the store.
    pub fn on_flush<F>(&mut self, cb: F)
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.on_flush = Some(Arc::new(cb));
    }

    /// Remove the flush handler if any
    pub fn clear_on_flush(&mut self) {
        self.on_flush = None;
    }

    /// Current buffer contents; an absent attribute reads as empty
    pub fn buffer(&self) -> Result<String> {
        self.require_storage()?;
        Ok(self
            .store
            .get_attribute(&self.config.storage_element_id, &self.config.storage_attribute)?
            .unwrap_or_default())
    }

    /// Append one encoded entry and fire the flush trigger.
    ///
    /// Fails with [`Error::ConfigError`] before touching the buffer when the
    /// storage element, the trigger element or the flush handler is missing.
    pub fn append_and_flush(&mut self, encoded: &str) -> Result<()> {
        self.require_storage()?;
        if !self.store.has_element(&self.config.trigger_element_id) {
            return Err(Error::ConfigError(format!(
                "Trigger element '{}' not found",
                self.config.trigger_element_id
            )));
        }
        let handler = self
            .on_flush
            .clone()
            .ok_or_else(|| Error::ConfigError("No flush handler registered".into()))?;

        let mut data = self.buffer()?;
        if !data.is_empty() && !data.ends_with(self.config.delimiter) {
            data.push(self.config.delimiter);
        }
        data.push_str(encoded);

        self.store.set_attribute(
            &self.config.storage_element_id,
            &self.config.storage_attribute,
            &data,
        )?;
        debug!("Appended item to pending buffer ({} bytes)", data.len());

        handler(&self.store);
        debug!("Flush trigger '{}' fired", self.config.trigger_element_id);
        Ok(())
    }

    /// Encode an item and append it
    pub fn add_item(&mut self, item: &Item) -> Result<()> {
        let encoded = encode(item)?;
        self.append_and_flush(&encoded)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_text_item(
        &mut self,
        text: &str,
        font_size: u16,
        font_family: &str,
        font_color: &str,
        background_color: &str,
        editable: bool,
        x: i32,
        y: i32,
        width: Option<i32>,
        height: Option<i32>,
        movable: bool,
    ) -> Result<()> {
        let item = build_text_item(
            text,
            font_size,
            font_family,
            font_color,
            background_color,
            editable,
            x,
            y,
            width,
            height,
            movable,
        );
        self.add_item(&item)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_file_item(
        &mut self,
        name: &str,
        file_type: &str,
        data: Vec<u8>,
        x: i32,
        y: i32,
        width: Option<i32>,
        height: Option<i32>,
        movable: bool,
    ) -> Result<()> {
        let item = build_file_item(name, file_type, data, x, y, width, height, movable);
        self.add_item(&item)
    }

    /// Consumer side: take every pending entry in order and clear the buffer.
    ///
    /// Entries are separated with [`split_entries`], so a raw entry with an
    /// unbalanced quote or bracket absorbs the entries appended after it.
    /// Encoded items are always balanced.
    pub fn drain(&mut self) -> Result<Vec<String>> {
        let data = self.buffer()?;
        let entries = split_entries(&data, self.config.delimiter)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.store.set_attribute(
            &self.config.storage_element_id,
            &self.config.storage_attribute,
            "",
        )?;
        Ok(entries)
    }

    fn require_storage(&self) -> Result<()> {
        if self.store.has_element(&self.config.storage_element_id) {
            Ok(())
        } else {
            Err(Error::ConfigError(format!(
                "Storage element '{}' not found",
                self.config.storage_element_id
            )))
        }
    }
}
