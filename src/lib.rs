//! prefman: preference pages addressed by identifier paths, a manager tracking the
//! current page, and key/value stores with layered defaults and file persistence.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
