#![allow(dead_code)]

pub mod sites;

pub use sites::*;
