// Console layer - a line-oriented adapter over the forum service.

pub mod command_parser;
pub mod dispatcher;
pub mod formatter;

pub use dispatcher::{run, Data};
