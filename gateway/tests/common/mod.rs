#![allow(dead_code)]

pub mod mock_client;
pub mod mock_server;

use std::time::Duration;

use gateway::{Error, PendingRequest, ServerHandler};
use protocol::SrvEvent;

pub use mock_client::{Call, MockClient, Controls};
pub use mock_server::{MockServer, Remote};

pub const DEADLINE: Duration = Duration::from_secs(5);

pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// Handler answering every read with `fill` and recording what it saw.
#[derive(Default)]
pub struct Recorder {
    pub fill: u8,
    pub events: Vec<SrvEvent>,
    pub requests: Vec<(protocol::Operation, protocol::Tag, Vec<u8>)>,
    pub errors: Vec<Error>,
    /// Requests kept without completion.
    pub parked: Vec<PendingRequest>,
    pub park: bool,
}

impl Recorder {
    pub fn filling(fill: u8) -> Self {
        Self {
            fill,
            ..Default::default()
        }
    }

    pub fn codes(&self) -> Vec<u32> {
        self.events.iter().map(|event| event.code).collect()
    }
}

impl ServerHandler for Recorder {
    fn on_event(&mut self, event: SrvEvent) {
        self.events.push(event);
    }

    fn on_read_write(&mut self, request: PendingRequest) {
        let seen = request.request();
        self.requests
            .push((seen.operation, seen.tag, seen.data.clone()));

        if self.park {
            self.parked.push(request);
            return;
        }

        let size = request.request().tag.size();
        if let Err(error) = request.respond(&vec![self.fill; size]) {
            self.errors.push(error);
        }
    }

    fn on_error(&mut self, error: Error) {
        self.errors.push(error);
    }
}
