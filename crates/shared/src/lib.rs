pub mod engine;
pub mod geometry;
pub mod models;
pub mod predict;
pub mod styles;
pub mod utm;
