//! Backend for the photo-poem web app
//!
//! Receives a photo with optional story and mood context, asks a
//! generative AI model for a matching public-domain Korean poem, screens
//! the answer for copyright refusals with one bounded strict retry, and
//! returns the raw poem text for the client to split into display fields.

pub mod ai;
pub mod error;
pub mod image;
pub mod models;
pub mod poem;
pub mod policy;
pub mod prompts;
pub mod server;
pub mod service;

pub use error::{Error, Result};
