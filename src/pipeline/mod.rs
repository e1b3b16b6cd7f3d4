//! Pipeline stages for a single document analysis.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ request ──▶ llm ──▶ parse
//! (select)  (base64)   (prompt)    (API)   (unwrap + validate)
//! ```
//!
//! 1. [`input`]: resolve the path and apply the MIME/extension allow-list
//! 2. [`encode`]: base64-wrap the file bytes as an inline attachment
//! 3. [`request`]: join instruction, attachment and [`schema`] into one request
//! 4. [`llm`]: the only stage with network I/O; optional retry/backoff
//! 5. [`parse`]: strip code fences, decode JSON, check the result shape

pub mod encode;
pub mod input;
pub mod llm;
pub mod parse;
pub mod request;
pub mod schema;
