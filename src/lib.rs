pub mod ci_group;
pub mod config;
pub mod constraints;
pub mod drift;
pub mod output;
pub mod profile;
pub mod tasks;
