pub mod config;
pub mod message;
pub mod receiver;
pub mod sender;
pub mod wrap32;

// -- Re-export structs for more concise usage

pub use message::{TcpReceiverMessage, TcpSenderMessage};
pub use receiver::TcpReceiver;
pub use sender::TcpSender;
pub use wrap32::Wrap32;

// -- Unit tests --
