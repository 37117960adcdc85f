mod dispatcher;
mod events;
mod registry;
mod rendezvous;

pub use dispatcher::{Completion, Dispatcher};
pub use events::EventQueue;
pub use registry::{AreaGuard, AreaRegistry};
pub use rendezvous::{PendingRequest, ReadWriteRequest, Rendezvous};
