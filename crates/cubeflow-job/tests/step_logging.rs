//! Log events emitted by the merge step for non-success outcomes.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use cubeflow_core::{JobId, StepId};
use cubeflow_job::execution::{Executable, ExecutableContext, ExecuteState};

use common::{FailingWriteCatalog, TestContext, merge_request};

/// Collects formatted log lines written by a scoped subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

fn context() -> ExecutableContext {
    ExecutableContext::new(JobId::new("merge-job-1"), StepId::new("update-cube-info"))
}

#[tokio::test]
async fn persistence_error_is_logged_once() {
    let ctx = TestContext::with_sales_cube().await;
    ctx.publish_bytes_written("2097152").await;
    let failing = Arc::new(FailingWriteCatalog::new(ctx.catalog.clone(), "disk quota exceeded"));
    let step = ctx.merge_step_with_catalog(&merge_request(&["s1", "s2"], "m1"), failing);

    let (logs, _guard) = capture();
    let result = step.do_work(&context()).await.unwrap();

    assert_eq!(result.state, ExecuteState::Error);
    let logs = logs.contents();
    assert_eq!(logs.matches("fail to update cube").count(), 1);
    assert!(!logs.contains("merge not finalized"));
}

#[tokio::test]
async fn rejected_request_is_logged_as_warning() {
    let ctx = TestContext::with_sales_cube().await;
    let step = ctx.merge_step(&merge_request(&[], "m1"));

    let (logs, _guard) = capture();
    let result = step.do_work(&context()).await.unwrap();

    assert_eq!(result.state, ExecuteState::Failed);
    let logs = logs.contents();
    assert!(logs.contains("WARN"));
    assert!(logs.contains("merge not finalized"));
    assert!(logs.contains("there are no merging segments"));
}
