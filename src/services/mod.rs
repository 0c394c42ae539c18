//! Background services: the continuation HTTP client and the channel bridge
//! that marshals its results back onto the main loop.

pub mod continuation_client;
pub mod suggest_bridge;
