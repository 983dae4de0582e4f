//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in trundle-core for the classroom robot's hardware:
//!
//! - Quadrature encoder decoding
//! - DC motors on an H-bridge (PWM + two direction pins) with brake, coast and hold
//! - Potentiometer rotation sensor for the lift arm pivot
//! - Debounced bump switch
//! - Character grid backing the status screen
//! - A simulated robot for host-side testing of full routines

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod display;
pub mod encoder;
pub mod motor;
pub mod sensor;
pub mod sim;
