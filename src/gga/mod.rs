mod chromosome;
mod engine;
mod fitness;
mod mutation;

pub use chromosome::*;
pub use engine::*;
pub use fitness::*;
pub use mutation::*;
