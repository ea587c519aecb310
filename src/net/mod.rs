pub mod interface;
pub mod router;

// -- Re-export structs for more concise usage

pub use interface::{NetworkInterface, OutputPort};
pub use router::Router;
