//! Slack wire-protocol concerns: request signatures, inbound event
//! payloads, Block Kit reply construction, and the outbound API client.

pub mod blocks;
pub mod client;
pub mod event;
pub mod signature;
