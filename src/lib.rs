//! hstsroll: maintenance tooling for the HSTS preload list
//!
//! Architecture:
//! - `domain`: line classification, band extraction, merge, validation
//! - `application`: roll / bulk / check services
//! - `infrastructure`: filesystem, HTTP sources, dependency wiring
//! - `cli`: argument parsing, dispatch, terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
