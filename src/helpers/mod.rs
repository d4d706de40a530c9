pub mod reader;
pub mod text;
pub mod xml;
pub mod zip;
