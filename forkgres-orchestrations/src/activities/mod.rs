pub mod delete_service;
pub mod fork_service;
pub mod wait_for_ready;
