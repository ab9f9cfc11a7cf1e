pub mod cleanup_instance;
pub mod fork_instance;
