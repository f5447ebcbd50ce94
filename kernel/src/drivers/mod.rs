// Peripheral drivers and the input translation layer on top of them.

pub mod input;
pub mod strip;
pub mod trackball;
