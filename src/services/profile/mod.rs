pub mod analyzer;
pub mod report;
pub mod types;
pub mod utils;

pub use analyzer::TableProfiler;
pub use report::build_summary;
