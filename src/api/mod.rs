pub mod gateway;
pub mod submission;
pub mod uploads;
