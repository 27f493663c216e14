//! AI trip planning: prompt construction, the one-shot generation call,
//! and formatting of the returned plan for display.

mod client;
mod format;
mod prompt;

pub use client::PlannerClient;
pub use format::{format_plan, PlanBlock};
pub use prompt::{build_prompt, TripRequest};
