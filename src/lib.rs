pub mod changes;
pub mod config;
pub mod mapping;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod pricing;
pub mod report;
pub mod snapshot;
