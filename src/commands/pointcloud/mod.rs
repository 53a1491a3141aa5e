pub mod convert;
pub mod pointcloud_utils;
pub mod summary;
