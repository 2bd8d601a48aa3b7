// Review triage: sentiment → categories → priority.
// All oracle calls go through llm_client::Oracle: no direct API calls here.

pub mod categorize;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod priority;
pub mod process;
pub mod prompts;
pub mod sentiment;

#[cfg(test)]
pub mod test_support;
