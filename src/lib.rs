pub mod common;
pub mod editor;
pub mod list;
pub mod model;
