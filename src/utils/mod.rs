// src/utils/mod.rs

pub mod grading;
pub mod html;
pub mod json;
pub mod jwt;
pub mod mapping;
pub mod presentation;
