mod client;
mod components;
mod error;
mod server;
mod systems;

pub use self::client::Client;
pub use self::components::*;
pub use self::error::Error;
pub use self::server::{Server, ServerHandler};
pub use self::systems::*;

pub use protocol;
