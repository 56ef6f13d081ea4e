pub mod error;
pub mod filter;
pub mod frame_utils;
pub mod ingestion;
pub mod reports;
pub mod session;
