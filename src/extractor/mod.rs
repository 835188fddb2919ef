pub mod addon;
pub mod errors;
pub mod model;
pub mod search;
pub mod selectors;

#[cfg(test)]
mod tests;

pub use addon::AddonPage;
pub use errors::ExtractError;
pub use model::{ExtractedRecord, FieldValue};
pub use search::SearchEntry;
pub use selectors::{Cardinality, ExtractMode, FieldSelector, SelectorTable, Selectors};

use scraper::Html;
use tracing::trace;

use crate::extractor::selectors::CompiledSelector;
use crate::fetcher::types::RemoteDocument;

/// Parse a fetched page. html5ever recovers from any malformed markup, so the
/// only unparseable input is one with no markup at all.
pub fn parse_document(doc: &RemoteDocument) -> Result<Html, ExtractError> {
    if doc.body_utf8.trim().is_empty() {
        return Err(ExtractError::EmptyDocument(doc.url_final.to_string()));
    }
    Ok(Html::parse_document(&doc.body_utf8))
}

/// Read one field. `None` means the selector matched nothing usable.
pub fn lookup(document: &Html, field: &CompiledSelector) -> Option<FieldValue> {
    let mut matches = document.select(&field.selector);
    let mode = field.rule.mode;
    match field.rule.cardinality {
        Cardinality::First => {
            let value = mode.read(matches.next()?)?;
            Some(match mode {
                ExtractMode::Html => FieldValue::Fragment(value),
                ExtractMode::Text | ExtractMode::Attr(_) => FieldValue::Text(value),
            })
        }
        Cardinality::All => {
            let items: Vec<String> = matches.filter_map(|el| mode.read(el)).collect();
            (!items.is_empty()).then_some(FieldValue::List(items))
        }
    }
}

/// Build a record holding every field of `table`, defaulting the ones that
/// did not match.
pub fn extract(document: &Html, table: &SelectorTable) -> ExtractedRecord {
    let mut record = ExtractedRecord::default();
    for field in table.iter() {
        let value = lookup(document, field).unwrap_or_else(|| {
            trace!(field = field.rule.name, css = field.rule.css, "no match, using default");
            field.rule.default_value()
        });
        record.insert(field.rule.name, value);
    }
    record
}
