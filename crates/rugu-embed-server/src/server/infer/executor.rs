use anyhow::Result;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread::JoinHandle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::server::infer::batch::QueueEntry;
use crate::server::infer::handler::RequestHandler;

/// Queue command
pub(crate) enum Command<THandler>
where
    THandler: RequestHandler,
{
    Append(QueueEntry<THandler>),
    Stop,
}

/// Request queue drained by a stateful processor on its own OS thread.
///
/// Requests are handled one at a time, in arrival order.
pub struct DedicatedExecutor<THandler>
where
    THandler: RequestHandler,
{
    pub(crate) tx: UnboundedSender<Command<THandler>>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<THandler> DedicatedExecutor<THandler>
where
    THandler: RequestHandler,
{
    pub fn new(processor: THandler) -> Result<Self> {
        // Create channel
        let (tx, rx) = unbounded_channel();

        let thread_name = format!("worker-{}", Uuid::new_v4());

        // Create a new Runtime to run tasks
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .thread_name(&thread_name)
            .build()?;

        let join_handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                // Pull task requests off the channel and hand them to the processor
                runtime.block_on(queue_task(rx, processor))
            })?;

        Ok(Self {
            tx,
            join_handle: Mutex::new(Some(join_handle)),
        })
    }

    /// Ask the worker to exit once the requests queued before this call are handled.
    pub fn stop(&self) {
        if self.tx.send(Command::Stop).is_err() {
            tracing::debug!("Executor already stopped");
        }
    }

    /// Block until the worker thread has exited.
    pub fn join(&self) {
        let handle = match self.join_handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Executor thread panicked");
            }
        }
    }
}

// Generic background task executor with stateful processor
async fn queue_task<THandler>(
    mut receiver: UnboundedReceiver<Command<THandler>>,
    mut processor: THandler,
) where
    THandler: RequestHandler,
{
    'main: while let Some(cmd) = receiver.recv().await {
        use Command::*;

        match cmd {
            Append(entry) => {
                tracing::trace!(
                    "Processing task {}, added {}ms ago",
                    entry.id,
                    entry.queue_time.elapsed().as_millis()
                );

                let request = entry.request;
                let response =
                    panic::catch_unwind(AssertUnwindSafe(|| processor.handle(request)))
                        .unwrap_or_else(|_| Err(anyhow::anyhow!("Request handler panicked")));

                if let Err(err) = &response {
                    tracing::warn!("Task {} failed: {:#}", entry.id, err);
                }

                if entry.response_tx.send(response).is_ok() {
                    tracing::trace!("Successfully sent response for task {}", entry.id)
                } else {
                    tracing::error!("Failed to send response for task {}", entry.id)
                }
            }
            Stop => {
                tracing::info!("Stopping queue task");
                break 'main;
            }
        }
    }
}
