/// Module for the hybrid three-input forecast network.
pub mod hybrid;
