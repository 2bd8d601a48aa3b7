pub mod plan;
pub mod review;
