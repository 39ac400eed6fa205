pub mod config;
pub mod index;
pub mod pattern;
pub mod quality;
pub mod schema;
pub mod search;
