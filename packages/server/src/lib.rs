//! Courier server: an HTTP gateway that routes unified request envelopes to
//! HTTP, RPC, gRPC and message-queue backends.

pub mod network;
pub mod service;
