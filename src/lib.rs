#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod download;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod logging;
pub mod notify;
pub mod run;
pub mod tracker;
