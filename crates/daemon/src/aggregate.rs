//! Cross-kind listing: one concurrent GetAll per kind, merged through the
//! shared fan-in group. A kind that fails contributes zero records.

use std::sync::Arc;

use common::prelude::{CancelSignal, Cancelled, FanIn, Owner, SecretRecord};

use crate::repository::KindListing;

pub type KindSources = Arc<Vec<Arc<dyn KindListing>>>;

pub async fn list_all(
    sources: &KindSources,
    owner: Owner,
    cancel: CancelSignal,
) -> Result<Vec<SecretRecord>, Cancelled> {
    let mut group = FanIn::default();
    for source in sources.iter() {
        let source = source.clone();
        group.spawn(source.kind(), async move { source.list(&owner).await });
    }

    let merged = group.collect(cancel).await?;
    tracing::debug!(%owner, count = merged.len(), "aggregated listing");
    Ok(merged)
}
