use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use log::{error, info};
use crate::codec::error::FontResult;
use crate::codec::font::Flavor;
use crate::config::config::OutputFormat;
use crate::models::conversion::ConversionResult;
use crate::service::traits::i_service::{ConversionServiceTrait, FontServiceTrait};
use crate::utils::file::{base_name, has_extension};

/// 轉換服務：依輸出格式分派到對應策略，每個輸入只產生一個輸出檔
pub struct ConversionService {
    font_service: Box<dyn FontServiceTrait>,
}

impl ConversionService {
    pub fn new(font_service: Box<dyn FontServiceTrait>) -> Self {
        ConversionService { font_service }
    }

    /// 輸出路徑：輸出目錄／輸入主檔名.目標副檔名
    pub fn output_path(input: &Path, format: OutputFormat, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.{}", base_name(input), format.extension()))
    }

    // TTF 輸入直接複製，其餘格式移除網頁包裝後存為 TTF
    fn convert_to_ttf(&self, input: &Path, output: &Path) -> FontResult<PathBuf> {
        let mut font = self.font_service.load_font(input)?;
        if has_extension(input, "ttf") {
            copy_font_file(input, output)?;
            return Ok(output.to_path_buf());
        }
        font.set_flavor(None);
        self.font_service.save_font(&font, output)?;
        Ok(output.to_path_buf())
    }

    // 只有 OTF 輸入會產生 .otf；其他輸入退回為 TTF，寫出 .ttf
    fn convert_to_otf(&self, input: &Path, output: &Path) -> FontResult<PathBuf> {
        let mut font = self.font_service.load_font(input)?;
        if has_extension(input, "otf") {
            copy_font_file(input, output)?;
            return Ok(output.to_path_buf());
        }
        let fallback = output.with_extension("ttf");
        info!("{} 不是 OTF，改為輸出 TTF：{}", input.display(), fallback.display());
        font.set_flavor(None);
        self.font_service.save_font(&font, &fallback)?;
        Ok(fallback)
    }

    fn convert_to_web_font(&self, input: &Path, output: &Path, flavor: Flavor) -> FontResult<PathBuf> {
        let mut font = self.font_service.load_font(input)?;
        font.set_flavor(Some(flavor));
        self.font_service.save_font(&font, output)?;
        Ok(output.to_path_buf())
    }

    // 尚無 EOT 編碼器，沿用 TTF 策略並寫出 .ttf
    fn convert_to_eot(&self, input: &Path, output: &Path) -> FontResult<PathBuf> {
        self.convert_to_ttf(input, &output.with_extension("ttf"))
    }
}

impl ConversionServiceTrait for ConversionService {
    fn convert_file(&self, input: &Path, format: OutputFormat, output_dir: &Path) -> ConversionResult {
        let output = Self::output_path(input, format, output_dir);
        let outcome = match format {
            OutputFormat::Ttf => self.convert_to_ttf(input, &output),
            OutputFormat::Otf => self.convert_to_otf(input, &output),
            OutputFormat::Woff => self.convert_to_web_font(input, &output, Flavor::Woff),
            OutputFormat::Woff2 => self.convert_to_web_font(input, &output, Flavor::Woff2),
            OutputFormat::Eot => self.convert_to_eot(input, &output),
        };
        match outcome {
            Ok(written) => {
                info!("轉換完成：{} → {}", input.display(), written.display());
                ConversionResult::succeeded(input, written)
            }
            Err(e) => {
                error!("轉換 {} 為 {} 失敗: {}", input.display(), format, e);
                ConversionResult::failed(input, e)
            }
        }
    }
}

/// 原樣複製；來源與目標為同一檔案時拒絕，避免把來源截斷
fn copy_font_file(input: &Path, output: &Path) -> io::Result<()> {
    if let (Ok(src), Ok(dst)) = (fs::canonicalize(input), fs::canonicalize(output)) {
        if src == dst {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("來源與目標為同一檔案：{}", src.display()),
            ));
        }
    }
    fs::copy(input, output)?;
    Ok(())
}
