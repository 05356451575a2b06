use std::path::{Path, PathBuf};
use crate::config::config::OutputFormat;

/// 一次批次轉換的輸入；開始後不可再修改
#[derive(Debug, Clone)]
pub struct ConversionJob {
    input_files: Vec<PathBuf>,
    target_format: OutputFormat,
    output_dir: PathBuf,
}

impl ConversionJob {
    pub fn new(input_files: Vec<PathBuf>, target_format: OutputFormat, output_dir: PathBuf) -> Self {
        ConversionJob { input_files, target_format, output_dir }
    }

    pub fn input_files(&self) -> &[PathBuf] {
        &self.input_files
    }

    pub fn target_format(&self) -> OutputFormat {
        self.target_format
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// 單一檔案的轉換結果
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub input: PathBuf,
    pub success: bool,
    pub output: Option<PathBuf>,
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn succeeded(input: &Path, output: PathBuf) -> Self {
        ConversionResult {
            input: input.to_path_buf(),
            success: true,
            output: Some(output),
            error: None,
        }
    }

    pub fn failed(input: &Path, error: impl ToString) -> Self {
        ConversionResult {
            input: input.to_path_buf(),
            success: false,
            output: None,
            error: Some(error.to_string()),
        }
    }
}

/// 全部檔案處理完後的統計
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub total_files: usize,
    pub successful: usize,
}

impl ConversionSummary {
    pub fn new(total_files: usize, successful: usize) -> Self {
        ConversionSummary { total_files, successful }
    }

    pub fn message(&self) -> String {
        if self.successful == self.total_files {
            format!("All {} files converted successfully!", self.total_files)
        } else {
            format!(
                "{} out of {} files converted successfully",
                self.successful, self.total_files
            )
        }
    }
}

/// 作業狀態：Idle → Running → Completed | Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_messages() {
        assert_eq!(
            ConversionSummary::new(3, 3).message(),
            "All 3 files converted successfully!"
        );
        assert_eq!(
            ConversionSummary::new(3, 2).message(),
            "2 out of 3 files converted successfully"
        );
        assert_eq!(
            ConversionSummary::new(2, 0).message(),
            "0 out of 2 files converted successfully"
        );
    }

    #[test]
    fn job_exposes_its_settings() {
        let job = ConversionJob::new(
            vec![PathBuf::from("a.ttf"), PathBuf::from("b.otf")],
            OutputFormat::Woff,
            PathBuf::from("out"),
        );
        assert_eq!(job.input_files().len(), 2);
        assert_eq!(job.target_format(), OutputFormat::Woff);
        assert_eq!(job.output_dir(), Path::new("out"));
    }
}
