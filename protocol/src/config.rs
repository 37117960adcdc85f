use std::env;
use std::str::FromStr;
use std::sync::Arc;

use log::warn;

use crate::EventCode;

/// Remote controller to connect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub address: Arc<str>,
    pub rack: u16,
    pub slot: u16,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub plc_address: Option<Arc<str>>,
    pub rack: u16,
    pub slot: u16,
    pub bind: Arc<str>,
    pub events_mask: u32,
    pub resourceless: bool,
}

impl Config {
    pub fn new() -> Self {
        Self {
            plc_address: env::var("PLC_ADDRESS").ok().map(Into::into),
            rack: parse_var("PLC_RACK").unwrap_or(0),
            slot: parse_var("PLC_SLOT").unwrap_or(1),
            bind: env::var("SERVER_BIND").map_or_else(|_| Config::default().bind, Into::into),
            events_mask: parse_var("SERVER_EVENTS_MASK").unwrap_or(EventCode::ALL),
            resourceless: parse_var("SERVER_RESOURCELESS").unwrap_or(false),
        }
    }

    pub fn target(&self) -> Option<Target> {
        self.plc_address.as_ref().map(|address| Target {
            address: address.clone(),
            rack: self.rack,
            slot: self.slot,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plc_address: None,
            rack: 0,
            slot: 1,
            bind: "0.0.0.0".into(),
            events_mask: EventCode::ALL,
            resourceless: false,
        }
    }
}

/// Reads `name` as decimal or `0x` hex. Unset yields `None`, a malformed
/// value is logged and yields `None` as well.
fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    let value = raw.trim();

    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16)
            .ok()
            .and_then(|number| number.to_string().parse().ok()),
        None => value.parse().ok(),
    };
    if parsed.is_none() {
        warn!("Ignoring malformed {}={:?}, using the default", name, raw);
    }
    parsed
}
