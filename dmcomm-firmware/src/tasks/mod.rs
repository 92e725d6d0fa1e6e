//! Embassy async tasks

pub mod comm;

pub use comm::comm_task;
