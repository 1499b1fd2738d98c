pub mod availability;
pub mod lifecycle;
pub mod pricing;
pub mod reviews;
