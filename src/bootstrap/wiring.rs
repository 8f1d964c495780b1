//! Adapter construction for one owner collection.

use std::sync::Arc;

use anyhow::Context;
use illu_core::ports::{DerivativeStorePort, IllustrationRecordPort, ImagePipelinePort};
use illu_core::IllustrationConfig;
use illu_infra::db::pool::init_db_pool;
use illu_infra::{
    CodecRegistry, DieselIllustrationRepository, DieselSqliteExecutor, FsDerivativeStore,
    InMemoryRecordStore, RasterPipeline,
};
use tracing::info;

/// The three ports the use cases run on.
pub struct Adapters {
    pub records: Arc<dyn IllustrationRecordPort>,
    pub store: Arc<dyn DerivativeStorePort>,
    pub pipeline: Arc<dyn ImagePipelinePort>,
}

/// SQLite-backed record store when `database_url` is set, in-memory otherwise.
pub fn build_record_store(
    database_url: Option<&str>,
    collection: &str,
) -> anyhow::Result<Arc<dyn IllustrationRecordPort>> {
    match database_url {
        Some(url) => {
            let pool = init_db_pool(url)
                .with_context(|| format!("Failed to open illustration database: {}", url))?;
            info!(database_url = url, collection, "Using SQLite record store");
            Ok(Arc::new(DieselIllustrationRepository::new(
                DieselSqliteExecutor::new(pool),
                collection,
            )))
        }
        None => {
            info!(collection, "Using in-memory record store");
            Ok(Arc::new(InMemoryRecordStore::new()))
        }
    }
}

pub fn build_adapters(
    config: &IllustrationConfig,
    database_url: Option<&str>,
) -> anyhow::Result<Adapters> {
    let records = build_record_store(database_url, &config.layout.collection)?;
    let store = Arc::new(FsDerivativeStore::new(config.layout.clone()));
    let pipeline = Arc::new(RasterPipeline::new(
        Arc::new(CodecRegistry::default()),
        config.threshold,
    ));
    Ok(Adapters {
        records,
        store,
        pipeline,
    })
}
