pub mod math;
pub mod timer;
