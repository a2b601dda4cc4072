//! Page state shared between the item producer and the canvas consumer.
//!
//! The queue never reaches for ambient globals: it is handed a [`PageStore`]
//! and talks to it through element ids and attribute names only. [`Page`] is
//! the in-memory store used by the CLI and in tests.

use std::collections::BTreeMap;

use crate::{CanvasConfig, Error, Result};

/// Element/attribute storage the queue reads and writes
pub trait PageStore {
    /// Whether an element with the given id exists
    fn has_element(&self, id: &str) -> bool;

    /// Read an attribute. `Ok(None)` means the element exists without it.
    fn get_attribute(&self, id: &str, name: &str) -> Result<Option<String>>;

    /// Write an attribute on an existing element
    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> Result<()>;
}

/// A page element with its attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Look up a single property of the inline `style` attribute
    pub fn style_property(&self, property: &str) -> Option<String> {
        let style = self.attributes.get("style")?;
        parse_style(style)
            .into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(property))
            .map(|(_, v)| v)
    }

    /// Set or, with `None`, remove a property of the inline `style` attribute.
    /// Other properties keep their order.
    pub fn set_style_property(&mut self, property: &str, value: Option<&str>) {
        let mut decls = self
            .attributes
            .get("style")
            .map(|s| parse_style(s))
            .unwrap_or_default();

        match (decls.iter().position(|(k, _)| k.eq_ignore_ascii_case(property)), value) {
            (Some(i), Some(v)) => decls[i].1 = v.to_string(),
            (Some(i), None) => {
                decls.remove(i);
            }
            (None, Some(v)) => decls.push((property.to_string(), v.to_string())),
            (None, None) => {}
        }

        if decls.is_empty() {
            self.attributes.remove("style");
        } else {
            let style = decls
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            self.attributes.insert("style".to_string(), style);
        }
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    split_declarations(style)
        .into_iter()
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}

/// Split on `;` outside parentheses and quotes
fn split_declarations(style: &str) -> Vec<&str> {
    let mut decls = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in style.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                decls.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    decls.push(&style[start..]);
    decls
}

/// In-memory page: elements indexed by id
#[derive(Debug, Clone, Default)]
pub struct Page {
    elements: BTreeMap<String, Element>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page holding the storage element and the update trigger the queue
    /// expects under `config`
    pub fn canvas_scaffold(config: &CanvasConfig) -> Self {
        let mut page = Page::new();
        page.insert(
            config.storage_element_id.clone(),
            Element::new("div")
                .with_attribute(config.storage_attribute.clone(), "")
                .with_attribute("style", "display: none"),
        );
        page.insert(config.trigger_element_id.clone(), Element::new("button"));
        page
    }

    /// Index every element of an HTML document that carries an `id`.
    #[cfg(feature = "html")]
    pub fn from_html(html: &str) -> Result<Self> {
        let document = scraper::Html::parse_document(html);
        let selector = scraper::Selector::parse("[id]")
            .map_err(|e| Error::Other(format!("Invalid selector: {:?}", e)))?;

        let mut page = Page::new();
        for node in document.select(&selector) {
            let value = node.value();
            let Some(id) = value.id() else { continue };
            let element = Element {
                tag: value.name().to_string(),
                attributes: value
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            };
            // First element wins on duplicate ids, like getElementById
            page.elements.entry(id.to_string()).or_insert(element);
        }
        Ok(page)
    }

    pub fn insert(&mut self, id: impl Into<String>, element: Element) {
        self.elements.insert(id.into(), element);
    }

    pub fn remove(&mut self, id: &str) -> Option<Element> {
        self.elements.remove(id)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    /// Resolve a `#id` selector. A bare id is accepted too.
    pub fn query_selector_id<'a>(&self, selector: &'a str) -> Result<&'a str> {
        let id = selector.trim().strip_prefix('#').unwrap_or(selector.trim());
        if id.is_empty() || id.contains(|c: char| c.is_whitespace() || ".[>:#".contains(c)) {
            return Err(Error::ConfigError(format!(
                "Unsupported selector '{}': only #id selectors are supported",
                selector
            )));
        }
        if !self.has_element(id) {
            return Err(Error::ConfigError(format!("No element matches '{}'", selector)));
        }
        Ok(id)
    }
}

impl PageStore for Page {
    fn has_element(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn get_attribute(&self, id: &str, name: &str) -> Result<Option<String>> {
        self.elements
            .get(id)
            .map(|e| e.attributes.get(name).cloned())
            .ok_or_else(|| Error::ConfigError(format!("Element '{}' not found", id)))
    }

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> Result<()> {
        let element = self
            .elements
            .get_mut(id)
            .ok_or_else(|| Error::ConfigError(format!("Element '{}' not found", id)))?;
        element.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }
}
