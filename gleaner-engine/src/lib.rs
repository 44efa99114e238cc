pub mod aggregator;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod result;
pub mod schema;
pub mod walk;

pub use aggregator::{Extractor, ProgressCallback};
pub use error::{ExtractError, PageError};
pub use result::{AggregateResult, Diagnostic, ExtractionStatus, PageOutcome, Record};
pub use schema::ExtractionRequest;
