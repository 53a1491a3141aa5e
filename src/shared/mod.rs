pub mod histogram;
pub mod logging;
pub mod math;
pub mod paths;
pub mod progressbar;
