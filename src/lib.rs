pub mod analysis;
pub mod config;
pub mod console;
pub mod crawler;
pub mod persistence;
pub mod report;
