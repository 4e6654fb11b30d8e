//! Query handling: spelling correction, index lookup, live fallback,
//! and pagination
//!
//! The entry point is [`HybridSearch`], which merges stored-index matches
//! with freshly scraped search-engine results.

mod hybrid;
mod live;
mod pagination;
mod spelling;

pub use hybrid::{HybridSearch, SearchResponse, SearchSession};
pub use live::{parse_results, LiveResult, LiveSearch};
pub use pagination::{paginate, ResultPage, PAGE_SIZE};
pub use spelling::SpellingCorrector;
