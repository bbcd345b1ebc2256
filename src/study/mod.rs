pub mod assemble;
pub mod error;
pub mod extractor;
pub mod model;
pub mod pipeline;
pub mod prompts;
