//! 账单模块

pub mod billing;
