//! Quarry — one step of a web research loop.
//!
//! Given a topic, a research plan, gathered facts and prior observations,
//! an LLM writes a single search query, the query runs against a web search
//! provider, and the result URLs come back with a telemetry record of the
//! exchange.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod config;
pub mod logging;
pub mod providers;
pub mod research;
pub mod search;
pub mod telemetry;
