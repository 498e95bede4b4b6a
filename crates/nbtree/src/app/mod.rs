//! Application layer: scanning, packing, pairing, and writing files.

pub mod extract;
pub mod pack;
pub mod scan;
pub mod unpack;
