//! orgtidy: clean, dedupe and regroup the labels of a scraped org chart.
//!
//! The transform lives in [`domain`]; [`application`] runs it over files,
//! [`cli`] exposes it on the command line.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
