pub mod files;
pub mod report;
