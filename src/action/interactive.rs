use dialoguer::{Input, Select};
use std::io;
use std::path::{Path, PathBuf};
use log::{info, warn};
use tokio::runtime::Handle;

use crate::config::config::{is_font_file, validate_selection, OutputFormat};
use crate::config::ports::AppConfig;
use crate::facade::traits::i_conversion::ConversionFacadeTrait;
use crate::models::conversion::ConversionJob;
use crate::models::event::{EventReceiver, WorkerEvent};
use crate::utils::file::{add_unique_files, collect_font_files};
use crate::utils::utils::{timestamped, ProgressManager};

/// 選單中累積的選擇，轉換結束後保留
#[derive(Debug, Clone)]
pub struct ShellState {
    pub font_files: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: OutputFormat,
}

impl ShellState {
    pub fn new(format: OutputFormat) -> Self {
        ShellState {
            font_files: Vec::new(),
            output_dir: None,
            format,
        }
    }

    /// 以目前的選擇建立不可變的轉換作業
    pub fn build_job(&self) -> io::Result<ConversionJob> {
        validate_selection(&self.font_files, self.output_dir.as_deref())?;
        let output_dir = self
            .output_dir
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "請選擇輸出目錄"))?;
        Ok(ConversionJob::new(self.font_files.clone(), self.format, output_dir))
    }
}

enum MenuAction {
    SelectSingle,
    SelectMultiple,
    ClearList,
    SelectOutputDir,
    SelectFormat,
    Start,
    Exit,
}

pub fn process_interactive_mode(
    config: &AppConfig,
    facade: &dyn ConversionFacadeTrait,
    runtime: &Handle,
) -> io::Result<()> {
    println!("=== 字型轉換工具 ===");
    let mut state = ShellState::new(config.default_format);
    loop {
        print_selection(&state);
        match get_menu_action(state.format)? {
            MenuAction::SelectSingle => {
                let file = get_single_font()?;
                info!("選擇字型：{}", file.display());
                state.font_files = vec![file];
            }
            MenuAction::SelectMultiple => {
                let files = get_multiple_fonts()?;
                let found = files.len();
                let added = add_unique_files(&mut state.font_files, files);
                println!("找到 {} 個字型檔案，新增 {} 個", found, added);
            }
            MenuAction::ClearList => {
                state.font_files.clear();
                println!("已清除檔案清單");
            }
            MenuAction::SelectOutputDir => {
                state.output_dir = Some(get_output_dir()?);
            }
            MenuAction::SelectFormat => {
                state.format = get_output_format(state.format)?;
            }
            MenuAction::Start => {
                let job = match state.build_job() {
                    Ok(job) => job,
                    Err(e) => {
                        warn!("無法開始轉換: {}", e);
                        println!("⚠ {}", e);
                        continue;
                    }
                };
                let (success, message) = run_conversion(facade, runtime, job, config.no_progress)?;
                println!("{}", timestamped(&final_line(success, &message)));
                acknowledge(success)?;
            }
            MenuAction::Exit => {
                info!("結束程式");
                return Ok(());
            }
        }
    }
}

fn print_selection(state: &ShellState) {
    println!();
    println!("已選擇 {} 個字型檔案", state.font_files.len());
    for file in &state.font_files {
        println!("  - {}", file.display());
    }
    match &state.output_dir {
        Some(dir) => println!("輸出目錄：{}", dir.display()),
        None => println!("輸出目錄：（未選擇）"),
    }
    println!("輸出格式：{}", state.format);
}

fn get_menu_action(format: OutputFormat) -> io::Result<MenuAction> {
    let format_item = format!("選擇輸出格式（目前：{}）", format);
    let items = [
        "選擇單一字型檔案",
        "選擇多個字型（檔案或目錄）",
        "清除已選檔案",
        "選擇輸出目錄",
        format_item.as_str(),
        "開始轉換",
        "離開",
    ];
    let choice = Select::new()
        .with_prompt("請選擇操作（使用方向鍵選擇，按 Enter 確認）")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("選單選擇失敗: {}", e)))?;
    Ok(match choice {
        0 => MenuAction::SelectSingle,
        1 => MenuAction::SelectMultiple,
        2 => MenuAction::ClearList,
        3 => MenuAction::SelectOutputDir,
        4 => MenuAction::SelectFormat,
        5 => MenuAction::Start,
        _ => MenuAction::Exit,
    })
}

pub fn get_single_font() -> io::Result<PathBuf> {
    let input: String = Input::new()
        .with_prompt("請輸入字型檔案路徑（.ttf、.otf、.woff、.woff2、.eot）")
        .validate_with(|input: &String| -> Result<(), String> {
            let path = Path::new(input.trim());
            if !path.is_file() {
                Err(format!("檔案 '{}' 不存在", input))
            } else if !is_font_file(path) {
                Err(format!("'{}' 不是支援的字型檔案", input))
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    Ok(PathBuf::from(input.trim()))
}

/// 輸入檔案或目錄；目錄會遞迴搜尋字型檔案
pub fn get_multiple_fonts() -> io::Result<Vec<PathBuf>> {
    let input: String = Input::new()
        .with_prompt("請輸入字型檔案或目錄路徑")
        .validate_with(|input: &String| -> Result<(), String> {
            if Path::new(input.trim()).exists() { Ok(()) } else { Err(format!("路徑 '{}' 不存在", input)) }
        })
        .interact_text()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let path = PathBuf::from(input.trim());
    if path.is_dir() {
        return collect_font_files(&path);
    }
    if is_font_file(&path) {
        Ok(vec![path])
    } else {
        warn!("略過非字型檔案：{}", path.display());
        Ok(Vec::new())
    }
}

pub fn get_output_dir() -> io::Result<PathBuf> {
    let input: String = Input::new()
        .with_prompt("請輸入輸出目錄（必須已存在）")
        .validate_with(|input: &String| -> Result<(), String> {
            if Path::new(input.trim()).is_dir() { Ok(()) } else { Err(format!("目錄 '{}' 不存在", input)) }
        })
        .interact_text()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    Ok(PathBuf::from(input.trim()))
}

pub fn get_output_format(current: OutputFormat) -> io::Result<OutputFormat> {
    let labels: Vec<&str> = OutputFormat::ALL.iter().map(|format| format.label()).collect();
    let default = OutputFormat::ALL
        .iter()
        .position(|format| *format == current)
        .unwrap_or(0);
    let choice = Select::new()
        .with_prompt("選擇輸出格式（使用方向鍵選擇，按 Enter 確認）")
        .items(&labels)
        .default(default)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("輸出格式選擇失敗: {}", e)))?;
    Ok(OutputFormat::ALL.get(choice).copied().unwrap_or(current))
}

/// 啟動作業並在目前執行緒上消化事件，直到收到結束事件
pub fn run_conversion(
    facade: &dyn ConversionFacadeTrait,
    runtime: &Handle,
    job: ConversionJob,
    no_progress: bool,
) -> io::Result<(bool, String)> {
    let receiver = facade.start_job(job)?;
    let progress = ProgressManager::new(no_progress);
    let outcome = runtime.block_on(drain_events(receiver, |event| match event {
        WorkerEvent::Status(text) => progress.status(text),
        WorkerEvent::Progress(percent) => progress.set_progress(*percent),
        WorkerEvent::Finished { .. } => progress.finish(),
    }));
    outcome.ok_or_else(|| io::Error::new(io::ErrorKind::Other, "轉換作業未送出結束事件"))
}

/// 依序處理事件，回傳結束事件的內容；通道在結束事件前關閉時回傳 None
pub async fn drain_events(
    mut receiver: EventReceiver,
    mut on_event: impl FnMut(&WorkerEvent),
) -> Option<(bool, String)> {
    while let Some(event) = receiver.recv().await {
        on_event(&event);
        if let WorkerEvent::Finished { success, message } = event {
            return Some((success, message));
        }
    }
    None
}

pub fn final_line(success: bool, message: &str) -> String {
    if success {
        format!("✅ {}", message)
    } else {
        format!("❌ {}", message)
    }
}

fn acknowledge(success: bool) -> io::Result<()> {
    let prompt = if success {
        "轉換完成，按 Enter 返回選單"
    } else {
        "轉換失敗，按 Enter 返回選單"
    };
    Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    Ok(())
}
