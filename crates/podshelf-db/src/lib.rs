//! PostgreSQL persistence for podshelf.
//!
//! Repository implementations for episodes, recommendations, aggregates,
//! and metrics, plus the pure aggregation fold and the bounded-backoff
//! retry helper for transient store contention.

pub mod aggregates;
pub mod episodes;
pub mod metrics;
pub mod pool;
pub mod recommendations;

pub use aggregates::{fold_aggregates, AggregationEngine, PgAggregateRepository};
pub use episodes::PgEpisodeRepository;
pub use metrics::{
    build_metric, estimate_cost, summarize_phase, PgMetricsRepository, PhaseSummary,
};
pub use pool::{create_pool, create_pool_with_config, ensure_schema, with_backoff,
    with_store_backoff, PoolConfig};
pub use recommendations::PgRecommendationRepository;
