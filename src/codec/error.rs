use std::io;
use thiserror::Error;
use write_fonts::read::ReadError;

/// 字型讀寫過程中可能發生的錯誤
#[derive(Debug, Error)]
pub enum FontError {
    #[error("I/O 錯誤: {0}")]
    Io(#[from] io::Error),
    #[error("字型解析失敗: {0}")]
    Parse(#[from] ReadError),
    #[error("無法辨識的字型格式（標頭 {0:02X?}）")]
    UnknownFormat([u8; 4]),
    #[error("不支援字型集合（TTC/OTC）")]
    Collection,
    #[error("資料截斷：{0}")]
    Truncated(&'static str),
    #[error("{context}宣告的大小 {declared} 位元組超出上限")]
    TooLarge { context: &'static str, declared: u64 },
    #[error("WOFF 格式錯誤: {0}")]
    Woff(String),
    #[error("WOFF2 格式錯誤: {0}")]
    Woff2(String),
}

pub type FontResult<T> = Result<T, FontError>;
