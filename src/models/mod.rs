pub mod queue;
pub mod settings;
pub mod summary;
pub mod transaction;
