//! Infant progress analytics: scoring of daily growth, sleep, feeding and
//! milestone records against reference tables, trend insights over a
//! baby's history, and the storage and reporting around them.

pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod paths;
pub mod reference;
pub mod report;
pub mod storage;
