pub mod alerts;
pub mod cache;
pub mod dispatch;
pub mod format;
pub mod indicators;
pub mod narrative;
pub mod rates;
pub mod summary;

pub use alerts::{AlertMonitor, Evaluation, MonitorSettings};
pub use cache::TtlCache;
pub use dispatch::NotificationDispatcher;
pub use rates::{convert, FxRates, RateSource};
pub use summary::{MarketContext, SummaryProvider};
