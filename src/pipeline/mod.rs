//! Pipeline stages for one card side.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and a backend can be swapped without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ llm ──▶ parse
//! (path)    (base64)   (VLM)   (schema)
//! ```
//!
//! 1. [`input`]: read a JPEG/PNG file into an `ImagePayload`
//! 2. [`encode`]: decode, re-encode as PNG, base64-wrap for the request body
//! 3. [`llm`]: the only stage with network I/O; no retries
//! 4. [`parse`]: unwrap stray fences and deserialize into the side's schema

pub mod encode;
pub mod input;
pub mod llm;
pub mod parse;
