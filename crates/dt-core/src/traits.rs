//! Core types shared by the domain entities

/// Primary key type
pub type Id = i64;
