pub mod generator;
pub mod graph;
pub mod layout;
pub mod names;
