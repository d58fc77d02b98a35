pub mod importers;
pub mod run;
