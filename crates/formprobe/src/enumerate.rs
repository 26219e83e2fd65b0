//! Field Enumerator
//!
//! Walks the rendered form once and yields its top-level fields in
//! document order. Field items nested inside another field item (sub-forms
//! rendered with the same markup) are left out so nothing is counted
//! twice.

use crate::driver::{FormDriver, FormDriverExt};
use crate::field::Field;
use crate::markers::MarkerTable;
use crate::result::FormResult;
use crate::selector::TEST_ID_ATTR;

/// Discovers fields using a [`MarkerTable`]
#[derive(Debug, Clone, Copy)]
pub struct FieldEnumerator<'a> {
    table: &'a MarkerTable,
}

impl<'a> FieldEnumerator<'a> {
    /// Create an enumerator
    #[must_use]
    pub const fn new(table: &'a MarkerTable) -> Self {
        Self { table }
    }

    /// Enumerate the visible top-level fields
    ///
    /// An empty result is not an error.
    pub async fn enumerate(&self, driver: &dyn FormDriver) -> FormResult<Vec<Field>> {
        let mut fields = Vec::new();
        for item in driver.query_all(None, &self.table.field_item).await? {
            if driver.has_ancestor(item, &self.table.field_item).await? {
                tracing::trace!(node = %item, "nested field item skipped");
                continue;
            }
            if !driver.is_visible(item).await? {
                tracing::trace!(node = %item, "hidden field item skipped");
                continue;
            }
            let index = fields.len();
            let id = driver
                .attribute(item, TEST_ID_ATTR)
                .await?
                .and_then(|tid| {
                    tid.strip_prefix(&self.table.field_id_prefix)
                        .map(str::to_string)
                })
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("field-{index}"));
            let required = driver
                .query_first(Some(item), &self.table.required_marker)
                .await?
                .is_some();
            fields.push(Field::new(id, index, item, required));
        }
        Ok(fields)
    }
}
