pub mod rating_handlers;
pub mod summary_handlers;
