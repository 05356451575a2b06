use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use log::warn;
use walkdir::WalkDir;
use crate::config::config::is_font_file;

pub fn read_file_content(file_path: &Path) -> io::Result<(Vec<u8>, usize)> {
    let mut file = File::open(file_path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    let file_size = buffer.len();
    Ok((buffer, file_size))
}

/// 輸出檔的主檔名：去掉最後一個副檔名
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "font".to_string())
}

/// 含副檔名的檔案名稱，用於狀態訊息
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// 遞迴收集目錄下的字型檔案，依路徑排序
pub fn collect_font_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("目錄 '{}' 不存在", dir.display()),
        ));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_font_file(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!("無法讀取 {}：{}", dir.display(), e),
        }
    }
    files.sort();
    Ok(files)
}

/// 加入尚未在清單中的檔案，回傳實際加入的數量
pub fn add_unique_files(list: &mut Vec<PathBuf>, files: impl IntoIterator<Item = PathBuf>) -> usize {
    let mut added = 0;
    for file in files {
        if !list.contains(&file) {
            list.push(file);
            added += 1;
        }
    }
    added
}
