pub mod loader;
pub mod process_file;
pub mod report;
pub mod simulate;
