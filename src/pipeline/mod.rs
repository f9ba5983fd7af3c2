//! Stage implementations for the newsletter pipeline.
//!
//! The template path runs these strictly in sequence; each stage's output is
//! the next stage's input and nothing runs concurrently within one job:
//!
//! ```text
//! PDF bytes
//!   │  convert   — ConvertAPI upload + converted-file download
//!   ▼
//! HTML bytes
//!   │  dom       — lenient decode (UTF-8 → windows-1252) + parse
//!   ▼
//! document tree
//!   │  extract   — classify paragraphs, write {{ key }} tokens
//!   │  assets    — capture image sources + inline styles
//!   │  budget    — per-key character limits
//!   ▼
//! tokenised template + budgets
//!   │  llm       — one chat call, JSON mapping reply, truncation
//!   ▼
//! key → text values
//!   │  reassemble — substitute, re-parse, restore assets
//!   ▼
//! finished HTML
//! ```
//!
//! `scratch` is the alternate path used when there is no PDF at all: it
//! skips everything above and asks the model for a complete styled document.

pub mod assets;
pub mod budget;
pub mod convert;
pub mod dom;
pub mod extract;
pub mod llm;
pub mod reassemble;
pub mod scratch;
