//! Pipeline stages for text-to-report generation.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the rendering backend can change without touching generation.
//!
//! ## Data Flow
//!
//! ```text
//! text ──▶ llm ──▶ sanitize ──▶ store ──▶ template ──▶ render
//!         (LLM)    (+literal)   (JSON)    (HTML)      (PDF)
//! ```
//!
//! 1. [`llm`]      — one completion call; the only stage with network I/O
//! 2. [`sanitize`] — recover a JSON value from the reply, falling back to
//!    the permissive [`literal`] parser
//! 3. [`store`]    — persist the structured record per request and load it
//!    back for rendering
//! 4. [`template`] — Tera HTML document
//! 5. [`render`]   — A4 page layout and PDF bytes; runs in `spawn_blocking`

pub mod literal;
pub mod llm;
pub mod render;
pub mod sanitize;
pub mod store;
pub mod template;
