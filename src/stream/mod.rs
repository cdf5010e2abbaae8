//! Online (causal) separation for chunked input.

pub mod history;
pub mod processor;

pub use history::SpectrumHistory;
pub use processor::StreamSeparator;
