pub mod id;
pub mod protocol;

pub use id::{ConnectionId, IdAllocator};
pub use protocol::{InboundEvent, MalformedMessage, Notice};
