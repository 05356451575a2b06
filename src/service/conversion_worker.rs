use std::path::PathBuf;
use log::{debug, info, warn};
use thiserror::Error;
use crate::models::conversion::{ConversionJob, ConversionSummary, JobState};
use crate::models::event::{EventSender, WorkerEvent};
use crate::service::traits::i_service::ConversionServiceTrait;
use crate::utils::file::display_name;

/// 使整個作業失敗的錯誤；單檔錯誤不屬於此類
#[derive(Debug, Error)]
pub enum JobError {
    #[error("division by zero: the job has no input files")]
    EmptyJob,
    #[error("output directory is missing or not a directory: {}", .0.display())]
    OutputDirUnavailable(PathBuf),
    #[error("worker task panicked: {0}")]
    WorkerPanicked(String),
}

/// 依序轉換作業中的每個檔案，每個檔案送出一個狀態與一個進度事件
/// # 回傳
/// - 成功時返回統計結果；作業層級的錯誤不產生部分統計
pub fn run_job(
    job: &ConversionJob,
    dispatcher: &dyn ConversionServiceTrait,
    events: &EventSender,
) -> Result<ConversionSummary, JobError> {
    let total = job.input_files().len();
    if total == 0 {
        return Err(JobError::EmptyJob);
    }
    if !job.output_dir().is_dir() {
        return Err(JobError::OutputDirUnavailable(job.output_dir().to_path_buf()));
    }

    info!(
        "開始轉換 {} 個檔案為 {}，輸出目錄：{}",
        total,
        job.target_format(),
        job.output_dir().display()
    );
    let mut successful = 0;
    for (index, input) in job.input_files().iter().enumerate() {
        emit(events, WorkerEvent::Status(format!("Converting: {}", display_name(input))));
        let result = dispatcher.convert_file(input, job.target_format(), job.output_dir());
        if result.success {
            successful += 1;
        } else {
            warn!("略過失敗的檔案：{}", input.display());
        }
        emit(events, WorkerEvent::Progress(progress_percent(index + 1, total)));
    }
    info!("轉換結束，成功 {}/{}", successful, total);
    Ok(ConversionSummary::new(total, successful))
}

/// 四捨五入的完成百分比，total 必須大於 0
pub fn progress_percent(done: usize, total: usize) -> u8 {
    ((done * 200 + total) / (total * 2)).min(100) as u8
}

/// 把作業結果轉成唯一的結束事件
pub fn finish_event(outcome: Result<ConversionSummary, JobError>) -> WorkerEvent {
    match outcome {
        Ok(summary) => WorkerEvent::Finished {
            success: true,
            message: summary.message(),
        },
        Err(e) => {
            log::error!("轉換作業失敗: {}", e);
            WorkerEvent::Finished {
                success: false,
                message: format!("Conversion error: {}", e),
            }
        }
    }
}

/// 結束事件對應的最終作業狀態
pub fn final_state(event: &WorkerEvent) -> JobState {
    match event {
        WorkerEvent::Finished { success: true, .. } => JobState::Completed,
        _ => JobState::Failed,
    }
}

/// 在目前執行緒上跑完整個作業，包含結束事件
pub fn execute(job: &ConversionJob, dispatcher: &dyn ConversionServiceTrait, events: &EventSender) -> JobState {
    let event = finish_event(run_job(job, dispatcher, events));
    let state = final_state(&event);
    emit(events, event);
    state
}

pub fn emit(events: &EventSender, event: WorkerEvent) {
    if events.send(event).is_err() {
        debug!("事件接收端已關閉，事件被捨棄");
    }
}
