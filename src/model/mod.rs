pub mod stats;
pub mod timecourse;
