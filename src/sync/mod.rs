pub mod engine;
pub mod error;
pub mod fetcher;
pub mod importer;
pub mod messages;
pub mod mutations;
pub mod poller;
pub mod projector;
pub mod selection;
pub mod store;
