pub mod aggregate;
pub mod dashboard;
pub mod render;
