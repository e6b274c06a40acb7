use std::{path::PathBuf, time::Duration};

use crate::LogLevel;

//                          sec  min  hour
const DEFAULT_BAN_SECS: u64 = 60 * 60 * 24;
const DUMP_INTERVAL_SECS: u64 = 60 * 15;
const DISCOURAGED_CAPACITY: usize = 50_000;

pub(crate) struct BanManagerConfig {
    pub data_path: Option<PathBuf>,
    pub default_ban_time: Duration,
    pub dump_interval: Duration,
    pub discouragement_capacity: usize,
    pub log_level: LogLevel,
}

impl Default for BanManagerConfig {
    fn default() -> Self {
        Self {
            data_path: Default::default(),
            default_ban_time: Duration::from_secs(DEFAULT_BAN_SECS),
            dump_interval: Duration::from_secs(DUMP_INTERVAL_SECS),
            discouragement_capacity: DISCOURAGED_CAPACITY,
            log_level: Default::default(),
        }
    }
}
