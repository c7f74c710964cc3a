pub mod cli;
pub mod model;
pub mod provider;
pub mod report;
pub mod snapshot;
pub mod store;
pub mod update;
