//! Bill metadata aggregation and identical-bill resolution.
//!
//! The batch side walks a congressional bill-status corpus and builds a
//! metadata index (`billsMeta.json`). The request side resolves which bills
//! are identical to a given bill and merges their cosponsor rosters.

pub mod config;
pub mod congress;
pub mod detail;
pub mod error;
pub mod processor;
pub mod repository;
pub mod roster;
pub mod selectors;
pub mod similarity;
pub mod store;
pub mod types;
pub mod walker;

pub use config::{Config, ConfigBuilder, FileConfig};
pub use congress::{normalize_bill_id, sort_bills_for_congress, BillKey, CongressSession};
pub use detail::{BillComparison, BillDetail, DetailContext};
pub use error::{Error, Result};
pub use processor::{AggregationReport, AggregatorState, BillsMetaAggregator, RecordOptions};
pub use repository::{BillRepository, MemoryRepository};
pub use similarity::{resolve_identical, summarize_similar, SimilarBillsSummary};
pub use types::{BillMetaEntry, BillRecord, BillSummary, BillsMeta, SimilarityMatch};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Config, ConfigBuilder, FileConfig};
    pub use crate::congress::{BillKey, CongressSession};
    pub use crate::detail::BillDetail;
    pub use crate::error::{Error, Result};
    pub use crate::processor::{BillsMetaAggregator, RecordOptions};
    pub use crate::repository::{BillRepository, MemoryRepository};
    pub use crate::selectors::Stage;
    pub use crate::types::{BillRecord, BillsMeta, SimilarityMatch};
    pub use futures::StreamExt;
}
