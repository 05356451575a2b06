use std::io;
use crate::config::config::OutputFormat;

// 應用配置結構體，只存在於本次執行，不寫入磁碟
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub no_progress: bool,
    pub default_format: OutputFormat,
}

// 配置來源的 Port
pub trait ConfigPort {
    fn get_config(&self) -> io::Result<AppConfig>;
}
