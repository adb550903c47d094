use tracing::{error, info, warn};

use crate::seed::SeedData;
use crate::store::{CatalogStore, StoreError};

/// Clears and repopulates the catalog collections from the seed set.
///
/// A failed clear for one collection is tolerated (the following bulk
/// insert will still produce a complete collection if it succeeds, and
/// a partial clear is no worse than the stale data we started with). A
/// failed insert is fatal: the caller must leave the service unready,
/// since the store may now hold an incomplete catalog.
pub async fn load_data(
    store: &(dyn CatalogStore + Send + Sync),
    seed: &SeedData,
) -> Result<(), StoreError> {
    info!("starting data initialization");

    for (collection, _) in seed.collections() {
        match store.delete_all(collection).await {
            Ok(removed) => info!("cleared {} collection: {} records", collection, removed),
            Err(err) => warn!("failed to clear {}: {}", collection, err),
        }
    }

    for (collection, records) in seed.collections() {
        match store.insert_many(collection, records).await {
            Ok(inserted) => info!("loaded {}: {} records", collection, inserted),
            Err(err) => {
                error!("failed to load {}: {}", collection, err);
                return Err(err);
            }
        }
    }

    info!("data initialization completed successfully");
    Ok(())
}

/// Runs the initializer and applies the readiness policy: success flips
/// the service ready, failure marks it unhealthy so orchestrators
/// restart it rather than route traffic at an incomplete catalog.
pub async fn initialize(
    store: &(dyn CatalogStore + Send + Sync),
    seed: &SeedData,
    flags: &health::HealthFlags,
) {
    match load_data(store, seed).await {
        Ok(()) => {
            flags.set_ready(true);
            info!("service is ready to accept requests");
        }
        Err(err) => {
            flags.set_ready(false);
            flags.set_healthy(false);
            error!("failed to load initial data: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{DEALS, PRODUCTS};
    use crate::store::MemoryStore;
    use health::HealthFlags;
    use serde_json::json;

    fn small_seed() -> SeedData {
        SeedData::new(
            vec![json!({"id": "d1"}), json!({"id": "d2"})],
            vec![json!({"id": "p1"})],
        )
    }

    #[tokio::test]
    async fn seeds_all_collections_and_flips_ready() {
        let store = MemoryStore::new();
        let flags = HealthFlags::new();

        initialize(&store, &small_seed(), &flags).await;

        assert_eq!(store.records(DEALS).len(), 2);
        assert_eq!(store.records(PRODUCTS).len(), 1);
        assert!(flags.report_ready());
        assert!(flags.report_healthy());
    }

    #[tokio::test]
    async fn replaces_existing_records() {
        let store = MemoryStore::new();
        store
            .insert_many(DEALS, &[json!({"id": "stale"})])
            .await
            .unwrap();

        load_data(&store, &small_seed()).await.unwrap();

        let deals = store.records(DEALS);
        assert_eq!(deals.len(), 2);
        assert!(deals.iter().all(|record| record["id"] != "stale"));
    }

    #[tokio::test]
    async fn delete_failure_is_not_fatal() {
        let store = MemoryStore::new();
        store.fail_deletes_on(DEALS);
        let flags = HealthFlags::new();

        initialize(&store, &small_seed(), &flags).await;

        assert_eq!(store.records(DEALS).len(), 2);
        assert_eq!(store.records(PRODUCTS).len(), 1);
        assert!(flags.report_ready());
    }

    #[tokio::test]
    async fn insert_failure_marks_unhealthy_and_unready() {
        let store = MemoryStore::new();
        store.fail_inserts_on(PRODUCTS);
        let flags = HealthFlags::new();

        initialize(&store, &small_seed(), &flags).await;

        // deals were inserted before the products failure aborted seeding
        assert_eq!(store.records(DEALS).len(), 2);
        assert!(store.records(PRODUCTS).is_empty());
        assert!(!flags.report_ready());
        assert!(!flags.report_healthy());
    }

    #[tokio::test]
    async fn initialize_runs_on_a_spawned_task() {
        // The server runs the initializer in the background while the
        // listener is already serving, so the future must be Send.
        let store = std::sync::Arc::new(MemoryStore::new());
        let flags = HealthFlags::new();

        let task_store = store.clone();
        let task_flags = flags.clone();
        tokio::spawn(async move {
            initialize(task_store.as_ref(), &small_seed(), &task_flags).await;
        })
        .await
        .unwrap();

        assert_eq!(store.records(DEALS).len(), 2);
        assert!(flags.report_ready());
    }

    #[tokio::test]
    async fn first_collection_insert_failure_aborts_remaining() {
        let store = MemoryStore::new();
        store.fail_inserts_on(DEALS);

        assert!(load_data(&store, &small_seed()).await.is_err());
        assert!(store.records(PRODUCTS).is_empty());
    }
}
