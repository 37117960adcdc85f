use std::net::Ipv4Addr;
use std::sync::Arc;

use bytes::Bytes;
use log::{debug, info, warn};
use protocol::{
    event_text, Area, Config, CpuStatus, ErrorCode, EventCallback, Operation, Param, PlcServer, ReadWriteCallback,
    ServerStatus, SrvEvent, Tag,
};
use tokio::sync::Notify;

use crate::components::{AreaKey, ServerTask, Session, SessionStatus};
use crate::systems::{AreaGuard, AreaRegistry, Dispatcher, EventQueue, PendingRequest, Rendezvous};
use crate::Error;

/// Host-side reactions to server traffic. Every method runs on the host
/// context.
pub trait ServerHandler {
    fn on_event(&mut self, event: SrvEvent) {
        debug!("{}", event_text(&event));
    }

    /// Called for every area access while the server is resourceless. The
    /// request must be completed, responded to or released before
    /// returning, otherwise the remote request stays blocked.
    fn on_read_write(&mut self, request: PendingRequest) {
        request.release();
    }

    fn on_error(&mut self, error: Error) {
        warn!("Server handler error: {}", error);
    }
}

/// Host-facing handle of one server instance.
///
/// Event queue, rendezvous and area registry belong to the instance, so
/// several servers can run side by side in one process.
pub struct Server<S: PlcServer> {
    dispatcher: Dispatcher<S>,
    events: Arc<EventQueue>,
    rendezvous: Arc<Rendezvous>,
    registry: Arc<AreaRegistry>,
    closed: Notify,
}

impl<S: PlcServer> Server<S> {
    pub fn new(mut inner: S) -> Result<Self, Error> {
        let events = Arc::new(EventQueue::new());
        let registry = Arc::new(AreaRegistry::new());
        let rendezvous = Arc::new(Rendezvous::new(registry.clone()));

        let publisher = events.clone();
        let callback: EventCallback = Arc::new(move |event: &SrvEvent| publisher.publish(event.clone()));
        inner.set_events_callback(Some(callback))?;

        Ok(Self {
            dispatcher: Dispatcher::new(Arc::new(Session::new(inner))),
            events,
            rendezvous,
            registry,
            closed: Notify::new(),
        })
    }

    pub fn session(&self) -> &Arc<Session<S>> {
        self.dispatcher.session()
    }

    /// Applies the events mask and resourceless mode from `config`.
    pub fn configure(&self, config: &Config) -> Result<(), Error> {
        self.set_events_mask(config.events_mask)?;
        self.set_resourceless(config.resourceless)
    }

    /// Routes every area access through the host when enabled.
    pub fn set_resourceless(&self, enabled: bool) -> Result<(), Error> {
        let callback = enabled.then(|| {
            let rendezvous = self.rendezvous.clone();
            Arc::new(move |sender: Ipv4Addr, operation: Operation, tag: &Tag, data: &mut [u8]| {
                rendezvous.serve(sender, operation, tag, data);
                Ok::<(), ErrorCode>(())
            }) as ReadWriteCallback
        });

        self.session()
            .call(|server| server.set_read_write_callback(callback))?;
        info!("Resourceless mode {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    fn start_task(address: Option<&str>) -> ServerTask {
        match address {
            Some(address) => ServerTask::StartTo {
                address: address.to_owned(),
            },
            None => ServerTask::Start,
        }
    }

    /// Starts listening on `address`, or on the library default.
    pub fn start_sync(&self, address: Option<&str>) -> Result<(), Error> {
        self.dispatcher.submit_sync(Self::start_task(address))?;
        info!("Server started on {}", address.unwrap_or("default address"));
        Ok(())
    }

    pub async fn start(&self, address: Option<&str>) -> Result<(), Error> {
        self.dispatcher.submit(Self::start_task(address))?.await?;
        info!("Server started on {}", address.unwrap_or("default address"));
        Ok(())
    }

    pub async fn start_configured(&self, config: &Config) -> Result<(), Error> {
        self.start(Some(&config.bind)).await
    }

    fn ensure_started(&self) -> Result<(), Error> {
        match self.server_status()? {
            ServerStatus::Stopped => Err(Error::NotStarted),
            _ => Ok(()),
        }
    }

    /// Stops the listener on the calling thread.
    ///
    /// The library may wait for its protocol threads, so this must not run
    /// while a read/write request is outstanding; use [`Server::stop`] with
    /// [`Server::serve`] running instead.
    pub fn stop_sync(&self) -> Result<(), Error> {
        self.ensure_started()?;
        self.dispatcher.submit_sync(ServerTask::Stop)?;
        info!("Server stopped");
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), Error> {
        self.ensure_started()?;
        self.dispatcher.submit(ServerTask::Stop)?.await?;
        info!("Server stopped");
        Ok(())
    }

    pub fn register_area(&self, area: Area, index: u16, initial: &[u8]) -> Result<(), Error> {
        self.session().ensure_open()?;

        let key = AreaKey::new(area, index);
        let buffer = self.registry.register(key, initial)?;

        let registered = self
            .session()
            .call(|server| server.register_area(area, key.index, buffer));
        if registered.is_err() {
            self.registry.unregister(key)?;
        }
        registered
    }

    /// Removes the area from the library first. On a library failure the
    /// area stays registered on both sides.
    pub fn unregister_area(&self, area: Area, index: u16) -> Result<(), Error> {
        let key = AreaKey::new(area, index);
        self.session().with_session(|server| {
            if !self.registry.contains(key) {
                return Err(Error::UnknownArea(key.area, key.index));
            }
            server.unregister_area(area, key.index)?;
            self.registry.unregister(key).map(|_| ())
        })?
    }

    pub fn get_area(&self, area: Area, index: u16) -> Result<Bytes, Error> {
        self.session().ensure_open()?;
        self.registry.get(AreaKey::new(area, index))
    }

    pub fn set_area(&self, area: Area, index: u16, data: &[u8]) -> Result<(), Error> {
        self.session().ensure_open()?;
        self.registry.set(AreaKey::new(area, index), data)
    }

    /// Locks the area until the guard is dropped or unlocked.
    pub fn lock_area(&self, area: Area, index: u16) -> Result<AreaGuard, Error> {
        self.session().ensure_open()?;
        self.registry.lock(AreaKey::new(area, index))
    }

    pub fn registry(&self) -> &AreaRegistry {
        &self.registry
    }

    pub fn events_mask(&self) -> Result<u32, Error> {
        self.session().with_session(|server| server.events_mask())
    }

    pub fn set_events_mask(&self, mask: u32) -> Result<(), Error> {
        self.session()
            .with_session(|server| server.set_events_mask(mask))
    }

    pub fn get_param(&self, param: Param) -> Result<i32, Error> {
        self.session().call(|server| server.get_param(param))
    }

    pub fn set_param(&self, param: Param, value: i32) -> Result<(), Error> {
        self.session().call(|server| server.set_param(param, value))
    }

    pub fn server_status(&self) -> Result<ServerStatus, Error> {
        self.session().with_session(|server| server.status())
    }

    pub fn clients_count(&self) -> Result<usize, Error> {
        self.session().with_session(|server| server.clients_count())
    }

    pub fn cpu_status(&self) -> Result<CpuStatus, Error> {
        self.session().with_session(|server| server.cpu_status())
    }

    pub fn set_cpu_status(&self, status: CpuStatus) -> Result<(), Error> {
        self.session().call(|server| server.set_cpu_status(status))
    }

    pub fn last_error(&self) -> Result<ErrorCode, Error> {
        self.session().with_session(|server| server.last_error())
    }

    pub fn error_text(code: ErrorCode) -> String {
        code.server_text()
    }

    pub fn event_text(event: &SrvEvent) -> String {
        event_text(event)
    }

    /// Delivers queued events and the waiting read/write request, if any,
    /// then reports requests dropped without completion. Returns how many
    /// notifications were handled.
    pub fn poll<H: ServerHandler>(&self, handler: &mut H) -> usize {
        let mut handled = self.events.drain(|event| handler.on_event(event));

        if let Some(request) = self.rendezvous.take() {
            handler.on_read_write(request);
            handled += 1;
        }

        for _ in 0..self.rendezvous.take_misuse() {
            handler.on_error(Error::NotCompleted);
        }

        handled
    }

    /// Runs the host side of the server until [`Server::close`].
    pub async fn serve<H: ServerHandler>(&self, handler: &mut H) -> Result<(), Error> {
        self.session().ensure_open()?;

        loop {
            let closed = self.closed.notified();
            tokio::pin!(closed);
            closed.as_mut().enable();

            self.poll(handler);
            if self.session().status() != SessionStatus::Open {
                debug!("Server closing, leaving serve loop");
                return Ok(());
            }

            tokio::select! {
                _ = &mut closed => {}
                _ = self.events.wait() => {}
                _ = self.rendezvous.wait() => {}
            }
        }
    }

    /// Releases any blocked protocol thread, waits for in-flight tasks,
    /// stops the library server and ends [`Server::serve`].
    pub async fn close(&self) {
        self.rendezvous.shutdown();
        self.session()
            .close(|server| {
                if server.status() != ServerStatus::Stopped {
                    if let Err(code) = server.stop() {
                        warn!("Stop on close failed: {}", code.server_text());
                    }
                }
                if let Err(code) = server.set_read_write_callback(None) {
                    warn!("Clearing read/write callback on close failed: {}", code.server_text());
                }
                if let Err(code) = server.set_events_callback(None) {
                    warn!("Clearing events callback on close failed: {}", code.server_text());
                }
            })
            .await;
        self.closed.notify_waiters();
        info!("Server session released");
    }
}

impl<S: PlcServer> Drop for Server<S> {
    fn drop(&mut self) {
        self.rendezvous.shutdown();
    }
}
