mod area;
mod command;
mod session;
mod task;

pub use area::AreaKey;
pub use command::ServerTask;
pub use session::{Session, SessionStatus};
pub use task::{ItemResult, Job, Outcome, Task, WriteItem};
