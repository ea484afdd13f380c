use crate::types::{ContentCategory, Item, Priority, Result};
use async_trait::async_trait;

/// A configured content source.
///
/// Construction never performs I/O; all network access and parsing happen
/// in [`Resource::fetch`].
#[async_trait]
pub trait Resource: Send + Sync {
    /// Unique key of this resource within a registry
    fn id(&self) -> &str;

    /// Category every item from this resource is grouped under
    fn category(&self) -> ContentCategory;

    fn priority(&self) -> Priority;

    /// Fetch, validate and normalize the current items of this source.
    ///
    /// Schema mismatches fail with `ResourceValidation`; transport errors
    /// are returned unchanged.
    async fn fetch(&self) -> Result<Vec<Item>>;
}
