mod codec;
mod dump;
mod targets;

pub use codec::*;
pub use dump::*;
pub use targets::*;
