use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use log::debug;
use crate::codec::error::FontResult;
use crate::codec::font::Font;
use crate::service::traits::i_service::FontServiceTrait;
use crate::utils::file::read_file_content;
use crate::utils::utils::format_file_size;

/// 字型服務，以檔案系統實作 FontServiceTrait
pub struct FontService;

impl FontService {
    pub fn new() -> Self {
        FontService
    }
}

impl Default for FontService {
    fn default() -> Self {
        Self::new()
    }
}

impl FontServiceTrait for FontService {
    fn load_font(&self, path: &Path) -> FontResult<Font> {
        let (data, file_size) = read_file_content(path)?;
        debug!("讀取字型：{}，大小：{}", path.display(), format_file_size(file_size));
        Font::from_bytes(&data)
    }

    fn save_font(&self, font: &Font, path: &Path) -> FontResult<()> {
        let data = font.to_bytes()?;
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&data)?;
        writer.flush()?;
        debug!("寫出字型：{}，大小：{}", path.display(), format_file_size(data.len()));
        Ok(())
    }
}
