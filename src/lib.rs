#![forbid(unsafe_code)]

pub mod batch;
pub mod cli;
pub mod columns;
pub mod edit;
pub mod error;
pub mod fetch;
pub mod fold;
pub mod formats;
pub mod heuristics;
pub mod import;
pub mod links;
pub mod logging;
pub mod output;
pub mod sheet_url;
pub mod store;
pub mod table;
