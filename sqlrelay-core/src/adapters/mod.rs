//! Concrete implementations of the ports

pub mod rpc;

pub use rpc::RpcClient;
