use std::io;
use std::sync::{Arc, Mutex};
use log::{error, info};
use tokio::runtime::Handle;
use crate::facade::traits::i_conversion::ConversionFacadeTrait;
use crate::models::conversion::{ConversionJob, JobState};
use crate::models::event::{create_event_channel, EventReceiver};
use crate::service::conversion_worker::{emit, final_state, finish_event, run_job, JobError};
use crate::service::traits::i_service::ConversionServiceTrait;

pub struct ConversionFacade {
    dispatcher: Arc<dyn ConversionServiceTrait>,
    runtime: Handle,
    state: Arc<Mutex<JobState>>,
}

impl ConversionFacade {
    pub fn new(dispatcher: Arc<dyn ConversionServiceTrait>, runtime: Handle) -> Self {
        ConversionFacade {
            dispatcher,
            runtime,
            state: Arc::new(Mutex::new(JobState::Idle)),
        }
    }

    fn begin(&self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "作業狀態鎖已損毀"))?;
        if *state == JobState::Running {
            return Err(io::Error::new(io::ErrorKind::Other, "已有轉換作業正在執行"));
        }
        *state = JobState::Running;
        Ok(())
    }
}

impl ConversionFacadeTrait for ConversionFacade {
    fn start_job(&self, job: ConversionJob) -> io::Result<EventReceiver> {
        self.begin()?;
        info!("啟動背景轉換作業，共 {} 個檔案", job.input_files().len());

        let (events, receiver) = create_event_channel();
        let dispatcher = Arc::clone(&self.dispatcher);
        let state = Arc::clone(&self.state);
        let worker_events = events.clone();
        self.runtime.spawn(async move {
            let worker = tokio::task::spawn_blocking(move || {
                run_job(&job, dispatcher.as_ref(), &worker_events)
            });
            let outcome = match worker.await {
                Ok(outcome) => outcome,
                Err(e) => Err(JobError::WorkerPanicked(e.to_string())),
            };
            let event = finish_event(outcome);
            match state.lock() {
                Ok(mut current) => *current = final_state(&event),
                Err(_) => error!("作業狀態鎖已損毀，無法更新狀態"),
            }
            emit(&events, event);
        });
        Ok(receiver)
    }

    fn state(&self) -> JobState {
        self.state.lock().map(|state| *state).unwrap_or(JobState::Failed)
    }
}
