//! Consensus-critical data structures and per-network parameters for the
//! oasis proof-of-work/proof-of-stake chain.
//!
//! This crate holds the pieces of the chain that must be bit-for-bit
//! identical on every node: block and transaction structures, their
//! consensus serialization, the per-network parameter sets with their
//! height-based feature activations, and the zerocoin coin/spend encodings.
//! Rule *checks* over these types live in the `oasis-consensus` crate.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod amount;
pub mod block;
pub mod keys;
pub mod parameters;
pub mod serialization;
pub mod shutdown;
pub mod transaction;
pub mod transparent;
pub mod work;
pub mod zerocoin;
