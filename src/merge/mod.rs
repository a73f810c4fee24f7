pub mod error;
pub mod merge_report;
pub mod merger;
