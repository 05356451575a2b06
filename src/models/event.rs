use tokio::sync::mpsc;

/// 轉換執行緒送往介面的事件
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// 開始處理某個檔案前送出
    Status(String),
    /// 每個檔案處理後送出，範圍 0..=100
    Progress(u8),
    /// 每個作業只送出一次
    Finished { success: bool, message: String },
}

pub type EventSender = mpsc::UnboundedSender<WorkerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<WorkerEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
