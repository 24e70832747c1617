/// The stage of a run a worker is in. The CLI picks a bar color per phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkerPhase {
    #[default]
    Loading,
    Processing,
    Writing,
}

#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub run_number: i32,
    pub worker_id: usize,
    pub phase: WorkerPhase,
}

impl WorkerStatus {
    pub fn new(progress: f32, run_number: i32, worker_id: usize, phase: WorkerPhase) -> Self {
        Self {
            progress,
            run_number,
            worker_id,
            phase,
        }
    }
}
