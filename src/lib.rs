pub mod blooms;
pub mod config;
pub mod ritual;
