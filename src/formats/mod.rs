//! Binary format readers.

pub mod cgmg;
pub mod common;
pub mod gct0;
pub mod rmhg;
