// Read-only views over stored reviews: aggregate report, recent list, CSV export.

pub mod export;
pub mod handlers;
pub mod report;
