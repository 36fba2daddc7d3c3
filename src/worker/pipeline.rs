use std::sync::Arc;

use crate::address::Transform;
use crate::types::{Job, JobResult};

pub struct Pipeline {
    transform: Arc<dyn Transform>,
}

impl Pipeline {
    pub fn new(transform: Arc<dyn Transform>) -> Self {
        Self { transform }
    }

    pub fn process(&self, job: &Job) -> JobResult {
        match self.transform.derive(job.network, &job.seed) {
            Ok(output) => JobResult::ok(job.index, output),
            Err(e) => JobResult::err(job.index, &e.context(format!("{} transform", job.network))),
        }
    }
}
