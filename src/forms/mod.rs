pub mod catalog;
pub mod fields;
pub mod steps;
pub mod wizard;
