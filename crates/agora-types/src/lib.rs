//! Records and wire types shared by the Agora crates.

pub mod api;
pub mod models;
