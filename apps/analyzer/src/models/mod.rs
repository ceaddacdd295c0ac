pub mod analysis;
pub mod cv;
pub mod job;
pub mod lenient;
