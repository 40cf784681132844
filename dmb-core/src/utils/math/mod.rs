//! Math utilities for the dual-mode bot.
//!
//! This module provides the differential drive mixer used by both operating modes.

pub mod mixer;
