mod joins;
mod traits;

pub use joins::{JoinFn, JoinRegistry};
pub use traits::Record;
