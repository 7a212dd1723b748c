pub mod reports;
pub mod system;
