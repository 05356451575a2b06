use std::io;
use std::time::Instant;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use log;

pub fn setup_logging(log_level: &str) -> io::Result<()> {
    let log_level_filter = match log_level {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("日誌初始化失敗: {}", e)))
}

/// 轉換進度條，長度固定為 100，對應進度事件的百分比
pub struct ProgressManager {
    pb: ProgressBar,
    no_progress: bool,
    start: Instant,
}

impl ProgressManager {
    pub fn new(no_progress: bool) -> Self {
        let pb = if no_progress {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(100);
            let style = ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {pos}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-");
            pb.set_style(style);
            pb
        };
        ProgressManager {
            pb,
            no_progress,
            start: Instant::now(),
        }
    }

    pub fn set_progress(&self, percent: u8) {
        self.pb.set_position(u64::from(percent.min(100)));
    }

    /// 狀態訊息寫在進度條上方，並附上時間戳
    pub fn status(&self, message: &str) {
        let line = timestamped(message);
        if self.no_progress {
            println!("{}", line);
        } else {
            self.pb.println(line);
            self.pb.set_message(message.to_string());
        }
    }

    pub fn finish(&self) {
        log::debug!("轉換耗時 {:.2} 秒", self.start.elapsed().as_secs_f64());
        if !self.no_progress {
            self.pb.finish_and_clear();
        }
    }
}

/// 為狀態記錄加上目前時間，格式 [HH:MM:SS]
pub fn timestamped(message: &str) -> String {
    format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
}

pub fn format_file_size(size: usize) -> String {
    if size < 1024 * 1024 {
        format!("{:.2} KB", size as f64 / 1024.0)
    } else {
        format!("{:.2} MB", size as f64 / (1024.0 * 1024.0))
    }
}
