use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 可選擇的輸出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Ttf,
    Otf,
    Woff,
    Woff2,
    Eot,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Ttf,
        OutputFormat::Otf,
        OutputFormat::Woff,
        OutputFormat::Woff2,
        OutputFormat::Eot,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Ttf => "TTF",
            OutputFormat::Otf => "OTF",
            OutputFormat::Woff => "WOFF",
            OutputFormat::Woff2 => "WOFF2",
            OutputFormat::Eot => "EOT",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Ttf => "ttf",
            OutputFormat::Otf => "otf",
            OutputFormat::Woff => "woff",
            OutputFormat::Woff2 => "woff2",
            OutputFormat::Eot => "eot",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputFormat {
    type Err = io::Error;

    fn from_str(s: &str) -> io::Result<Self> {
        OutputFormat::ALL
            .iter()
            .copied()
            .find(|format| format.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("不支援的輸出格式：{}", s))
            })
    }
}

/// 檔案選擇時接受的副檔名
pub const FONT_EXTENSIONS: [&str; 5] = ["ttf", "otf", "woff", "woff2", "eot"];

pub fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FONT_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// 開始轉換前檢查使用者的選擇；不合格時不啟動轉換
pub fn validate_selection(font_files: &[PathBuf], output_dir: Option<&Path>) -> io::Result<()> {
    if font_files.is_empty() || output_dir.is_none() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "請選擇字型檔案與輸出目錄",
        ));
    }
    Ok(())
}
