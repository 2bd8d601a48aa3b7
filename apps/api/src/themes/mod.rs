// Theme clustering and action plan generation over high-priority reviews.
// All oracle calls go through llm_client::Oracle.

pub mod cluster;
pub mod generator;
pub mod handlers;
pub mod models;
pub mod plans;
pub mod prompts;
pub mod references;

#[cfg(test)]
pub mod test_support;
