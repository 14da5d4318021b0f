//! Menagerie
//!
//! Embedded SQLite walkthrough: two tables, a handful of literal inserts,
//! row counts and a dump of each table's last row.

pub mod build_info;
pub mod config;
pub mod db;
pub mod demo;
pub mod models;
