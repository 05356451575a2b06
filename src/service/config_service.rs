use std::env;
use std::io;
use crate::config::config::OutputFormat;
use crate::config::ports::{AppConfig, ConfigPort};

pub const LOG_LEVEL_ENV: &str = "FONT_CONVERTER_LOG";
pub const NO_PROGRESS_ENV: &str = "FONT_CONVERTER_NO_PROGRESS";
pub const FORMAT_ENV: &str = "FONT_CONVERTER_FORMAT";

// 配置服務，負責選擇適當的配置適配器
pub struct ConfigService {
    config_port: Box<dyn ConfigPort>,
}

impl ConfigService {
    pub fn new(config_port: Box<dyn ConfigPort>) -> Self {
        ConfigService { config_port }
    }

    pub fn get_config(&self) -> io::Result<AppConfig> {
        self.config_port.get_config()
    }
}

// 預設配置適配器
pub struct DefaultConfigAdapter;

impl DefaultConfigAdapter {
    pub fn new() -> Self {
        DefaultConfigAdapter
    }
}

impl Default for DefaultConfigAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPort for DefaultConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        Ok(AppConfig {
            log_level: "info".to_string(),
            no_progress: false,
            default_format: OutputFormat::Ttf, // 與格式選單的第一項一致
        })
    }
}

// 環境變數配置適配器，未設定的項目沿用預設值
pub struct EnvConfigAdapter {
    lookup: Box<dyn Fn(&str) -> Option<String>>,
}

impl EnvConfigAdapter {
    pub fn new() -> Self {
        EnvConfigAdapter {
            lookup: Box::new(|key| env::var(key).ok()),
        }
    }

    /// 以自訂查詢函式取代行程環境變數
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        EnvConfigAdapter { lookup: Box::new(lookup) }
    }
}

impl Default for EnvConfigAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPort for EnvConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        let mut config = DefaultConfigAdapter.get_config()?;
        if let Some(level) = (self.lookup)(LOG_LEVEL_ENV) {
            config.log_level = match level.to_lowercase().as_str() {
                "error" | "warn" | "info" | "debug" | "trace" => level.to_lowercase(),
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("{} 的值無效：{}", LOG_LEVEL_ENV, level),
                    ))
                }
            };
        }
        if let Some(flag) = (self.lookup)(NO_PROGRESS_ENV) {
            config.no_progress = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(format) = (self.lookup)(FORMAT_ENV) {
            config.default_format = format.parse()?;
        }
        Ok(config)
    }
}
