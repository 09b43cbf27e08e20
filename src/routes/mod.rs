pub mod admin;
pub mod appointments;
pub mod events;
pub mod public;
pub mod queue;
