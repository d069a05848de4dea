//! Infrastructure Layer
//!
//! Shared market state, the feed codec, external clients, configuration
//! and logging. Depends on the domain layer.

pub mod client;
pub mod config;
pub mod feed;
pub mod logging;
pub mod snapshot;
pub mod store;

pub use client::{
    ExecutionClient, ExecutionError, GammaClient, MarketMetadataProvider, MetadataError,
    OpenOrder, PaperCall, PaperExecutionClient,
};
pub use config::{ConfigError, EngineConfig, GammaConfig, RunMode, SnapshotConfig};
pub use feed::{parse_message, FeedError, FeedEvent, OrderEvent, OrderEventKind};
pub use logging::init_tracing;
pub use snapshot::{SnapshotRecorder, TopOfBook};
pub use store::{
    BookStore, FillOutcome, MarketDirectory, MarketPositions, MarketStore, OrderRegistry,
    PositionStore, SharedMarketStore,
};
