mod chat;
mod search;
mod sessions;
mod types;

pub use chat::*;
pub use search::*;
pub use sessions::*;
pub use types::*;
