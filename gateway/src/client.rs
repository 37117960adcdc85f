use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use log::{info, warn};
use protocol::{
    Area, BlockInfo, BlockType, BlocksList, ConnectionType, CpInfo, CpuInfo, CpuStatus, ErrorCode, OrderCode, Param,
    PlcClient, Protection, Target, VarSpec, WordLen,
};

use crate::components::{ItemResult, Job, Outcome, Session, Task, WriteItem};
use crate::systems::{Completion, Dispatcher};
use crate::Error;

/// Host-facing handle of one client session.
///
/// Every verb comes in two flavors: `*_sync` runs on the calling thread, the
/// plain `async` form runs on a worker thread and resolves on the awaiting
/// task. [`Client::submit_with`] offers the callback flavor.
pub struct Client<C: PlcClient> {
    dispatcher: Dispatcher<C>,
}

impl<C: PlcClient> Client<C> {
    pub fn new(inner: C) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::new(Session::new(inner))),
        }
    }

    pub fn session(&self) -> &Arc<Session<C>> {
        self.dispatcher.session()
    }

    pub fn execute_sync(&self, task: Task) -> Result<Outcome, Error> {
        self.dispatcher.submit_sync(task)
    }

    pub async fn execute(&self, task: Task) -> Result<Outcome, Error> {
        self.dispatcher.submit(task)?.await
    }

    pub fn submit(&self, task: Task) -> Result<Completion<Outcome>, Error> {
        self.dispatcher.submit(task)
    }

    /// Runs `task` on a worker and reports to `on_complete` on the current
    /// `LocalSet`. See [`Dispatcher::submit_with`].
    pub fn submit_with(&self, task: Task, on_complete: impl FnOnce(Result<Outcome, Error>) + 'static) -> Result<(), Error> {
        self.dispatcher.submit_with(task, on_complete)
    }

    fn run_sync<R>(&self, task: Task, extract: fn(Outcome) -> Option<R>) -> Result<R, Error> {
        let verb = <Task as Job<C>>::verb(&task);
        extract(self.execute_sync(task)?).ok_or(Error::UnexpectedOutcome(verb))
    }

    async fn run<R>(&self, task: Task, extract: fn(Outcome) -> Option<R>) -> Result<R, Error> {
        let verb = <Task as Job<C>>::verb(&task);
        extract(self.execute(task).await?).ok_or(Error::UnexpectedOutcome(verb))
    }

    fn connect_task(target: Option<&Target>) -> Task {
        match target {
            Some(target) => Task::ConnectTo {
                address: target.address.to_string(),
                rack: target.rack,
                slot: target.slot,
            },
            None => Task::Connect,
        }
    }

    /// Connects to `target`, or with the parameters set earlier when `None`.
    pub fn connect_sync(&self, target: Option<&Target>) -> Result<(), Error> {
        self.run_sync(Self::connect_task(target), Outcome::into_done)
    }

    pub async fn connect(&self, target: Option<&Target>) -> Result<(), Error> {
        self.run(Self::connect_task(target), Outcome::into_done).await
    }

    pub fn disconnect_sync(&self) -> Result<(), Error> {
        self.run_sync(Task::Disconnect, Outcome::into_done)
    }

    pub async fn disconnect(&self) -> Result<(), Error> {
        self.run(Task::Disconnect, Outcome::into_done).await
    }

    pub fn read_area_sync(&self, area: Area, db_number: u16, start: u32, amount: u32, word_len: WordLen) -> Result<Bytes, Error> {
        self.run_sync(Task::read_area(area, db_number, start, amount, word_len), Outcome::into_bytes)
    }

    pub async fn read_area(&self, area: Area, db_number: u16, start: u32, amount: u32, word_len: WordLen) -> Result<Bytes, Error> {
        self.run(Task::read_area(area, db_number, start, amount, word_len), Outcome::into_bytes)
            .await
    }

    pub fn write_area_sync(
        &self,
        area: Area,
        db_number: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
        data: impl Into<Bytes>,
    ) -> Result<(), Error> {
        self.run_sync(Task::write_area(area, db_number, start, amount, word_len, data), Outcome::into_done)
    }

    pub async fn write_area(
        &self,
        area: Area,
        db_number: u16,
        start: u32,
        amount: u32,
        word_len: WordLen,
        data: impl Into<Bytes>,
    ) -> Result<(), Error> {
        self.run(Task::write_area(area, db_number, start, amount, word_len, data), Outcome::into_done)
            .await
    }

    pub fn read_multi_vars_sync(&self, items: Vec<VarSpec>) -> Result<Vec<ItemResult>, Error> {
        self.run_sync(Task::ReadMultiVars { items }, Outcome::into_items)
    }

    pub async fn read_multi_vars(&self, items: Vec<VarSpec>) -> Result<Vec<ItemResult>, Error> {
        self.run(Task::ReadMultiVars { items }, Outcome::into_items).await
    }

    pub fn write_multi_vars_sync(&self, items: Vec<WriteItem>) -> Result<Vec<ErrorCode>, Error> {
        self.run_sync(Task::WriteMultiVars { items }, Outcome::into_statuses)
    }

    pub async fn write_multi_vars(&self, items: Vec<WriteItem>) -> Result<Vec<ErrorCode>, Error> {
        self.run(Task::WriteMultiVars { items }, Outcome::into_statuses).await
    }

    pub async fn db_read(&self, db_number: u16, start: u32, size: u32) -> Result<Bytes, Error> {
        self.read_area(Area::Db, db_number, start, size, WordLen::Byte).await
    }

    pub async fn db_write(&self, db_number: u16, start: u32, data: impl Into<Bytes>) -> Result<(), Error> {
        let data = data.into();
        self.write_area(Area::Db, db_number, start, data.len() as u32, WordLen::Byte, data)
            .await
    }

    pub async fn mb_read(&self, start: u32, size: u32) -> Result<Bytes, Error> {
        self.read_area(Area::Mk, 0, start, size, WordLen::Byte).await
    }

    pub async fn mb_write(&self, start: u32, data: impl Into<Bytes>) -> Result<(), Error> {
        let data = data.into();
        self.write_area(Area::Mk, 0, start, data.len() as u32, WordLen::Byte, data)
            .await
    }

    pub async fn eb_read(&self, start: u32, size: u32) -> Result<Bytes, Error> {
        self.read_area(Area::Pe, 0, start, size, WordLen::Byte).await
    }

    pub async fn eb_write(&self, start: u32, data: impl Into<Bytes>) -> Result<(), Error> {
        let data = data.into();
        self.write_area(Area::Pe, 0, start, data.len() as u32, WordLen::Byte, data)
            .await
    }

    pub async fn ab_read(&self, start: u32, size: u32) -> Result<Bytes, Error> {
        self.read_area(Area::Pa, 0, start, size, WordLen::Byte).await
    }

    pub async fn ab_write(&self, start: u32, data: impl Into<Bytes>) -> Result<(), Error> {
        let data = data.into();
        self.write_area(Area::Pa, 0, start, data.len() as u32, WordLen::Byte, data)
            .await
    }

    pub async fn tm_read(&self, start: u32, amount: u32) -> Result<Bytes, Error> {
        self.read_area(Area::Tm, 0, start, amount, WordLen::Timer).await
    }

    pub async fn tm_write(&self, start: u32, amount: u32, data: impl Into<Bytes>) -> Result<(), Error> {
        self.write_area(Area::Tm, 0, start, amount, WordLen::Timer, data).await
    }

    pub async fn ct_read(&self, start: u32, amount: u32) -> Result<Bytes, Error> {
        self.read_area(Area::Ct, 0, start, amount, WordLen::Counter).await
    }

    pub async fn ct_write(&self, start: u32, amount: u32, data: impl Into<Bytes>) -> Result<(), Error> {
        self.write_area(Area::Ct, 0, start, amount, WordLen::Counter, data).await
    }

    pub async fn list_blocks(&self) -> Result<BlocksList, Error> {
        self.run(Task::ListBlocks, Outcome::into_blocks).await
    }

    pub async fn list_blocks_of_type(&self, block_type: BlockType) -> Result<Vec<u16>, Error> {
        self.run(Task::ListBlocksOfType { block_type }, Outcome::into_block_numbers)
            .await
    }

    pub async fn get_ag_block_info(&self, block_type: BlockType, number: u16) -> Result<BlockInfo, Error> {
        self.run(Task::GetAgBlockInfo { block_type, number }, Outcome::into_block_info)
            .await
    }

    pub async fn upload(&self, block_type: BlockType, number: u16, size: usize) -> Result<Bytes, Error> {
        self.run(Task::Upload { block_type, number, size }, Outcome::into_bytes)
            .await
    }

    pub async fn full_upload(&self, block_type: BlockType, number: u16, size: usize) -> Result<Bytes, Error> {
        self.run(Task::FullUpload { block_type, number, size }, Outcome::into_bytes)
            .await
    }

    pub async fn download(&self, number: u16, data: impl Into<Bytes>) -> Result<(), Error> {
        self.run(
            Task::Download {
                number,
                data: data.into(),
            },
            Outcome::into_done,
        )
        .await
    }

    pub async fn delete(&self, block_type: BlockType, number: u16) -> Result<(), Error> {
        self.run(Task::Delete { block_type, number }, Outcome::into_done).await
    }

    pub async fn db_get(&self, db_number: u16, size: usize) -> Result<Bytes, Error> {
        self.run(Task::DbGet { db_number, size }, Outcome::into_bytes).await
    }

    pub async fn db_fill(&self, db_number: u16, fill: u8) -> Result<(), Error> {
        self.run(Task::DbFill { db_number, fill }, Outcome::into_done).await
    }

    pub async fn plc_date_time(&self) -> Result<SystemTime, Error> {
        self.run(Task::GetPlcDateTime, Outcome::into_date_time).await
    }

    pub async fn set_plc_date_time(&self, time: SystemTime) -> Result<(), Error> {
        self.run(Task::SetPlcDateTime { time }, Outcome::into_done).await
    }

    pub async fn set_plc_system_date_time(&self) -> Result<(), Error> {
        self.run(Task::SetPlcSystemDateTime, Outcome::into_done).await
    }

    pub async fn order_code(&self) -> Result<OrderCode, Error> {
        self.run(Task::GetOrderCode, Outcome::into_order_code).await
    }

    pub async fn cpu_info(&self) -> Result<CpuInfo, Error> {
        self.run(Task::GetCpuInfo, Outcome::into_cpu_info).await
    }

    pub async fn cp_info(&self) -> Result<CpInfo, Error> {
        self.run(Task::GetCpInfo, Outcome::into_cp_info).await
    }

    pub async fn plc_status(&self) -> Result<CpuStatus, Error> {
        self.run(Task::PlcStatus, Outcome::into_cpu_status).await
    }

    pub async fn plc_hot_start(&self) -> Result<(), Error> {
        self.run(Task::PlcHotStart, Outcome::into_done).await
    }

    pub async fn plc_cold_start(&self) -> Result<(), Error> {
        self.run(Task::PlcColdStart, Outcome::into_done).await
    }

    pub async fn plc_stop(&self) -> Result<(), Error> {
        self.run(Task::PlcStop, Outcome::into_done).await
    }

    pub async fn copy_ram_to_rom(&self, timeout: Duration) -> Result<(), Error> {
        self.run(Task::CopyRamToRom { timeout }, Outcome::into_done).await
    }

    pub async fn compress(&self, timeout: Duration) -> Result<(), Error> {
        self.run(Task::Compress { timeout }, Outcome::into_done).await
    }

    pub async fn protection(&self) -> Result<Protection, Error> {
        self.run(Task::GetProtection, Outcome::into_protection).await
    }

    pub async fn set_session_password(&self, password: &str) -> Result<(), Error> {
        self.run(
            Task::SetSessionPassword {
                password: password.to_owned(),
            },
            Outcome::into_done,
        )
        .await
    }

    pub async fn clear_session_password(&self) -> Result<(), Error> {
        self.run(Task::ClearSessionPassword, Outcome::into_done).await
    }

    pub fn set_connection_params(&self, address: &str, local_tsap: u16, remote_tsap: u16) -> Result<(), Error> {
        self.session()
            .call(|client| client.set_connection_params(address, local_tsap, remote_tsap))
    }

    pub fn set_connection_type(&self, connection_type: ConnectionType) -> Result<(), Error> {
        self.session()
            .call(|client| client.set_connection_type(connection_type))
    }

    pub fn get_param(&self, param: Param) -> Result<i32, Error> {
        self.session().call(|client| client.get_param(param))
    }

    pub fn set_param(&self, param: Param, value: i32) -> Result<(), Error> {
        self.session().call(|client| client.set_param(param, value))
    }

    pub fn connected(&self) -> bool {
        self.session()
            .with_session(|client| client.connected())
            .unwrap_or(false)
    }

    pub fn pdu_length(&self) -> Result<u16, Error> {
        self.session().with_session(|client| client.pdu_length())
    }

    pub fn exec_time(&self) -> Result<Duration, Error> {
        self.session().with_session(|client| client.exec_time())
    }

    pub fn last_error(&self) -> Result<ErrorCode, Error> {
        self.session().with_session(|client| client.last_error())
    }

    pub fn error_text(code: ErrorCode) -> String {
        code.client_text()
    }

    /// Waits for in-flight work, disconnects and releases the library
    /// client. Later calls fail with [`Error::Destroying`].
    pub async fn close(&self) {
        self.session()
            .close(|client| {
                if let Err(code) = client.disconnect() {
                    warn!("Disconnect on close failed: {}", code.client_text());
                }
            })
            .await;
        info!("Client session released");
    }
}
