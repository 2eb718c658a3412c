// Docwright - LLM-assisted technical document generation
// Library exports

pub mod cli;
pub mod config;
pub mod document;
pub mod errors;
pub mod generators;
pub mod ideas;
pub mod prompts;
pub mod providers;
pub mod sources;
pub mod store;
pub mod testing;

pub use document::{Document, Section, SectionKind, Workbench};
pub use errors::DocError;
