pub mod csv_scan;
pub mod math;
pub mod simd_helpers;
