pub mod executor;
pub mod parser;
pub mod ranker;
pub mod scorer;

pub use executor::QueryExecutor;
pub use parser::{parse_query, Query};
pub use ranker::{paginate, rank, total_pages};
pub use scorer::{partial_ratio, Scorer};
