#![allow(dead_code)]

pub mod digitpad_env;
pub mod scripted;
