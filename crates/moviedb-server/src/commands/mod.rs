pub mod config;
pub mod dedupe;
pub mod serve;
