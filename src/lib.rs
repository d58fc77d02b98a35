pub mod commands;
pub mod config;
pub mod contact;
pub mod convert;
pub mod error;
pub mod geocode;
pub mod importer;
pub mod model;
pub mod output;
pub mod store;
pub mod taxonomy;
