//! Catalog subsystem: what the routes do with fetched records.
//!
//! # Data Flow
//! ```text
//! FetchOutcome.records
//!     → integrity.rs (validate every record via product.rs, build report)
//!     → pagination.rs (filter + page) or summary.rs (mean/median/categories)
//!     → JSON response
//! ```
//!
//! # Design Decisions
//! - Invalid records are dropped and reported, never fatal
//! - Validation runs per request on the cached raw records, so the cache
//!   holds exactly what upstream sent

pub mod integrity;
pub mod pagination;
pub mod product;
pub mod summary;

pub use integrity::{validate_batch, IntegrityReport, ValidatedBatch};
pub use pagination::{paginate, ListParams, ListQuery, Page};
pub use product::{validate_record, ErrorKind, FieldError, Product, ProductMeta};
pub use summary::{summarize, CatalogSummary};
