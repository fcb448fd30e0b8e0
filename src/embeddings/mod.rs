//! Text encoder integration.
//!
//! The encoder is an external collaborator: it takes an ordered batch of
//! texts and returns one unit-length vector of fixed dimension per text.
//! Vector normalization is the encoder's responsibility, which is what lets
//! the retrieval engine use plain dot products.

mod openai;

pub use openai::OpenAIEmbedder;
