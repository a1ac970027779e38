pub mod ratings;
pub mod summary;
