use protocol::{ErrorCode, PlcServer};

use crate::{Error, Job};

/// Server lifecycle verbs that may block while the library spins its
/// listener up or down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTask {
    Start,
    StartTo { address: String },
    Stop,
}

impl<S: PlcServer> Job<S> for ServerTask {
    type Output = ();

    fn verb(&self) -> &'static str {
        match self {
            ServerTask::Start => "Start",
            ServerTask::StartTo { .. } => "StartTo",
            ServerTask::Stop => "Stop",
        }
    }

    fn validate(&self) -> Result<(), Error> {
        match self {
            ServerTask::StartTo { address } if address.trim().is_empty() => {
                Err(Error::InvalidArgument("bind address must not be empty"))
            }
            _ => Ok(()),
        }
    }

    fn execute(self, server: &mut S) -> Result<(), ErrorCode> {
        match self {
            ServerTask::Start => server.start(),
            ServerTask::StartTo { address } => server.start_to(&address),
            ServerTask::Stop => server.stop(),
        }
    }
}
