pub mod csv;
pub mod fixed_width;
pub mod results;
