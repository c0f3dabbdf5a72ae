//! Terminal output: live event stream and final report

pub mod console;
pub mod report;
