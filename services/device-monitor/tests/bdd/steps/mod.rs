//! BDD step definitions for the device monitor

pub mod notification_steps;
pub mod subscription_steps;
pub mod write_steps;
