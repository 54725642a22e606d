pub mod item;
pub mod parser;
