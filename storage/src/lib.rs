pub mod codec;
pub mod corpus;
pub mod loader;
pub mod stats;

pub use corpus::{discover, CachedCorpus, GraphCorpus};
pub use loader::{load, save, GraphLoader, RecordLoader};
pub use stats::{aggregate, Aggregator, RowOutcome, StatisticsRow, StatisticsTable};
