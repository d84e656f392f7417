pub mod gemini;
pub mod payload;

pub use gemini::*;
pub use payload::*;
