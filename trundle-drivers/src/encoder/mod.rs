//! Shaft encoder support
//!
//! The drive and lift motors report position through a quadrature
//! encoder. Decoding is split from counting so the count can live
//! wherever the platform keeps it (an interrupt-fed atomic on the robot,
//! a plain integer in tests).

pub mod quadrature;

pub use quadrature::{EncoderCounter, QuadratureDecoder};
