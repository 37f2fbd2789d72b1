pub mod analyze;
pub mod check;
pub mod dim;
pub mod submit;
