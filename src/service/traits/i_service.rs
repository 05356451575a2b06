use std::path::Path;
use crate::codec::error::FontResult;
use crate::codec::font::Font;
use crate::config::config::OutputFormat;
use crate::models::conversion::ConversionResult;

// 字型讀寫服務接口
pub trait FontServiceTrait: Send + Sync {
    /// 載入字型檔案
    /// # 參數
    /// - path: 字型檔案路徑（TTF、OTF、WOFF、WOFF2）
    /// # 回傳
    /// - 成功時返回字型，失敗時返回字型錯誤
    fn load_font(&self, path: &Path) -> FontResult<Font>;

    /// 依字型目前的包裝方式寫出檔案，已存在的檔案會被覆寫
    fn save_font(&self, font: &Font, path: &Path) -> FontResult<()>;
}

// 單檔轉換接口，負責依輸出格式選擇轉換策略
pub trait ConversionServiceTrait: Send + Sync {
    /// 轉換單一檔案；任何錯誤都只反映在回傳結果中
    fn convert_file(&self, input: &Path, format: OutputFormat, output_dir: &Path) -> ConversionResult;
}
