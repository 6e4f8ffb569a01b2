//! Generative Language API wire types

mod gemini;

pub use gemini::*;
