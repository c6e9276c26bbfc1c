pub extern crate serde;
pub extern crate serde_json;

mod arbiter;
mod message;
mod types;

pub use arbiter::*;
pub use message::*;
pub use types::*;
