// "operating system" for the Waveshare ESP32-S3 AMOLED 1.91 + I2C trackball

#![no_std]

pub mod board;
pub mod drivers;
pub mod platform;
