pub mod rfcomm;
pub mod tcp;
pub mod traits;

#[cfg(test)]
pub(crate) mod memory;

pub use rfcomm::{RfcommAdapter, RfcommConfig, RfcommTransportStream};
pub use tcp::{TcpAdapter, TcpTransportStream};
pub use traits::{LinkAdapter, TransportStream};
