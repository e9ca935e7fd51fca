pub mod commit_service;
pub mod projection_service;
pub mod submit_service;
pub mod summary_service;
pub mod sync_service;
