pub mod collect_report;
pub mod data_loader;
pub mod day_file_store;
pub mod error;
