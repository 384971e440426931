pub mod begin;
pub mod complete;
pub mod info;
pub mod set_parent;
pub mod status;
