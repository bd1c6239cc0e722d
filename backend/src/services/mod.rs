pub mod checks;
pub mod data_sources;
