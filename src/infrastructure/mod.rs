pub mod assets;
pub mod backends;
pub mod extractors;
