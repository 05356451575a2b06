use std::io;
use crate::models::conversion::{ConversionJob, JobState};
use crate::models::event::EventReceiver;

// Facade 接口，負責在背景執行轉換作業並回報事件
pub trait ConversionFacadeTrait: Send + Sync {
    /// 在背景啟動轉換作業
    /// # 參數
    /// - job: 開始後不再變動的轉換作業
    /// # 回傳
    /// - 成功時返回事件接收端，最後一個事件必為結束事件；已有作業執行中時返回 IO 錯誤
    fn start_job(&self, job: ConversionJob) -> io::Result<EventReceiver>;

    fn state(&self) -> JobState;
}
