//! Command Handlers Module
//!
//! `backup` is the only command: the interactive menu followed by one run.

pub mod backup;
