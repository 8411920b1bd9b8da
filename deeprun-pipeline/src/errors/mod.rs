mod chain;
mod estimator;
mod indexer;
mod worker;

pub use chain::ChainClientError;
pub use estimator::EstimatorError;
pub use indexer::IndexerError;
pub use worker::WorkerError;
