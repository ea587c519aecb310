pub mod net;
pub mod stream;
pub mod tcp;
pub mod wire;
