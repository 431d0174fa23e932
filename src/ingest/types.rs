// src/ingest/types.rs
use anyhow::Result;

use crate::types::Item;

/// A feed that can be polled for its latest items.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<Item>>;
    fn name(&self) -> &str;
}
