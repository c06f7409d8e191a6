//! The exchange engine: the office itself, its reports, bonus policies,
//! staff roles and a thread-safe handle.

pub mod bonus;
pub mod office;
pub mod report;
pub mod shared;
pub mod staff;
