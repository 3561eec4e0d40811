//! Conversion of grayscale images into the page-addressed memory layout of
//! SSD1306-style monochrome OLED controllers.

#![no_std]

pub mod framebuffer;
pub mod listing;
pub mod pack;

extern crate alloc;
