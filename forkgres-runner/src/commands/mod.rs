pub mod cleanup;
pub mod fork;
