//! Cooking Club backend: recipe storage and search, the recipe list
//! controller, and landing-page email signups.

pub mod app;
pub mod config;
pub mod error;
pub mod recipes;
pub mod signups;
pub mod state;
