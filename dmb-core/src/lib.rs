//! Core control logic and drivers for the dual-mode bot on no-std embedded platforms.
//!
//! For a runnable host build, see the `dmb-app/mock-mcu` workspace member.
#![no_std]

pub mod utils;
