pub mod health;
pub mod process;
pub mod projects;
pub mod steps;
