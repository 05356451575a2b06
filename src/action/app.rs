use std::io;
use std::sync::Arc;
use log::info;
use tokio::runtime::{Builder, Runtime};

use crate::action::interactive::process_interactive_mode;
use crate::config::ports::{AppConfig, ConfigPort};
use crate::facade::conversion_facade::ConversionFacade;
use crate::service::config_service::{ConfigService, EnvConfigAdapter};
use crate::service::conversion_service::ConversionService;
use crate::service::font_service::FontService;
use crate::utils::utils::setup_logging;

/// 讀取環境配置、初始化日誌並進入互動選單
pub fn run_app() -> io::Result<()> {
    let config_port: Box<dyn ConfigPort> = Box::new(EnvConfigAdapter::new());
    let config = ConfigService::new(config_port).get_config()?;
    setup_logging(&config.log_level)?;
    info!("使用配置：{:?}", config);

    let runtime = build_runtime()?;
    run_with_config(&config, &runtime)
}

pub fn build_runtime() -> io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("font-converter")
        .enable_all()
        .build()
}

fn run_with_config(config: &AppConfig, runtime: &Runtime) -> io::Result<()> {
    let dispatcher = ConversionService::new(Box::new(FontService::new()));
    let facade = ConversionFacade::new(Arc::new(dispatcher), runtime.handle().clone());
    process_interactive_mode(config, &facade, runtime.handle())
}
