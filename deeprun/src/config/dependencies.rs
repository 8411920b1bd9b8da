use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use deeprun_pipeline::chain::RpcChainClient;
use deeprun_pipeline::engine::ActionEngine;
use deeprun_pipeline::estimator::CostEstimator;
use deeprun_pipeline::indexer::ChainIndexer;
use deeprun_pipeline::metrics::ActionMetrics;
use deeprun_pipeline::worker::{ActionWorker, WorkerConfig};
use deeprun_repository::postgres::MIGRATOR;
use deeprun_repository::{PostgresActionQueue, PostgresIndexerStore};

use crate::config::ServiceConfig;
use crate::errors::ServiceError;

/// `Dependencies` holds the wired components of the deeprun service.
///
/// It includes the database pool, the chain client, the queue and indexer
/// stores, shared metrics, the cost estimator, and the chain indexer itself.
pub struct Dependencies {
    pub pool: sqlx::PgPool,
    pub chain: Arc<RpcChainClient>,
    pub queue: Arc<PostgresActionQueue>,
    pub store: Arc<PostgresIndexerStore>,
    pub metrics: Arc<ActionMetrics>,
    pub estimator: Arc<CostEstimator>,
    pub indexer: Arc<ChainIndexer>,
}

impl Dependencies {
    /// Creates a new `Dependencies` instance.
    ///
    /// Connects the database pool, runs pending migrations, connects the RPC
    /// client, and wires the stores, the estimator, and the indexer.
    ///
    /// # Returns
    ///
    /// A `Result` which is `Ok(Self)` on successful initialization or a
    /// `ServiceError` if any dependency fails to initialize.
    pub async fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_pool_max)
            .connect(&config.database_url)
            .await?;
        MIGRATOR.run(&pool).await?;

        let chain = Arc::new(
            RpcChainClient::connect(
                &config.rpc_url,
                config.signer,
                config.confirmations,
                config.addresses,
            )
            .await?,
        );

        let queue = Arc::new(PostgresActionQueue::new(pool.clone()));
        let store = Arc::new(PostgresIndexerStore::new(pool.clone(), config.chain_id));
        let metrics = Arc::new(ActionMetrics::new());
        let estimator = Arc::new(CostEstimator::new(chain.clone(), config.signer));
        let indexer = Arc::new(ChainIndexer::new(
            chain.clone(),
            store.clone(),
            config.indexer.clone(),
        ));

        Ok(Dependencies {
            pool,
            chain,
            queue,
            store,
            metrics,
            estimator,
            indexer,
        })
    }

    /// Builds an action worker pool around a caller-provided execution
    /// engine, sharing this service's queue and metrics.
    pub fn action_worker(
        &self,
        engine: Arc<dyn ActionEngine>,
        config: WorkerConfig,
    ) -> Arc<ActionWorker> {
        Arc::new(ActionWorker::new(
            self.queue.clone(),
            engine,
            self.metrics.clone(),
            config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use deeprun_pipeline::chain::ContractAddresses;
    use deeprun_pipeline::indexer::IndexerConfig;

    fn test_config(database_url: &str) -> ServiceConfig {
        ServiceConfig {
            database_url: database_url.to_string(),
            database_pool_max: 4,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: 31337,
            confirmations: 0,
            signer: Address::ZERO,
            addresses: ContractAddresses {
                game_world: Address::ZERO,
                fee_vault: Address::ZERO,
                items: Address::ZERO,
                rfq_market: Address::ZERO,
                trade_escrow: Address::ZERO,
            },
            indexer: IndexerConfig::default(),
            worker: WorkerConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_invalid_database_url_fails_with_a_database_error() {
        let config = test_config("not-a-database-url");

        let result = Dependencies::new(&config).await;

        assert!(matches!(result, Err(ServiceError::Database(_))));
    }
}
