//! Availability predicate over page HTML.

use scraper::{Html, Selector};

use slotwatch_common::error::WatchError;

/// Looks for an enabled element matching a CSS selector.
pub struct ElementDetector {
    selector: Selector,
    raw: String,
}

impl ElementDetector {
    /// Fails with a configuration error when the selector does not parse.
    pub fn new(selector: &str) -> Result<Self, WatchError> {
        let parsed = Selector::parse(selector)
            .map_err(|e| WatchError::Config(format!("invalid element selector '{selector}': {e}")))?;
        Ok(Self {
            selector: parsed,
            raw: selector.to_string(),
        })
    }

    pub fn selector(&self) -> &str {
        &self.raw
    }

    /// True when a matching element exists and is not `disabled`.
    ///
    /// Malformed markup is parsed leniently; anything unrecognisable simply
    /// yields no match.
    pub fn evaluate(&self, content: &str) -> bool {
        let document = Html::parse_document(content);
        document
            .select(&self.selector)
            .any(|element| element.value().attr("disabled").is_none())
    }
}
