pub mod age;
pub mod config;
pub mod entry;
pub mod error;
pub mod genre;
pub mod schema;
pub mod store;
pub mod validation;
pub mod view;
pub mod watcher;

pub use config::Config;
pub use entry::WatchlistEntry;
pub use error::{Result, WatchStatsError};
pub use genre::GenreTaxonomy;
pub use store::{Snapshot, SnapshotReport, Store};
pub use view::{AggregateView, Report, ViewEngine, ViewName};
