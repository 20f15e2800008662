//! Worker loop: claim, upload, record, repeat until the list is drained.

use super::context::{JobContext, UploadEvent};
use crate::uploader::FileUpload;

pub(super) fn run_worker(worker_id: usize, ctx: &JobContext) {
    let mut handled = 0usize;
    while let Some(task) = ctx.tasks.claim() {
        ctx.emit(UploadEvent::Started {
            index: task.index,
            destination: task.destination.clone(),
            size: task.size,
        });
        tracing::debug!(worker_id, index = task.index, dest = %task.destination, "uploading");

        let mut file_progress = ctx.progress.file(task.size);
        let result = ctx.uploader.upload_file(
            &ctx.job,
            FileUpload {
                local_path: &task.local_path,
                destination: &task.destination,
                size: task.size,
            },
            &mut |sent| file_progress.set_sent(sent),
        );

        match result {
            Ok(()) => {
                file_progress.done();
                ctx.tasks.complete(task.index, Ok(()));
                tracing::info!(dest = %task.destination, bytes = task.size, "uploaded");
                ctx.emit(UploadEvent::Uploaded {
                    index: task.index,
                    destination: task.destination,
                    size: task.size,
                });
            }
            Err(e) => {
                let message = e.to_string();
                let sent = file_progress.reported();
                file_progress.failed();
                ctx.tasks.complete(task.index, Err(message.clone()));
                tracing::warn!(dest = %task.destination, sent, size = task.size, "upload failed: {}", message);
                ctx.emit(UploadEvent::Failed {
                    index: task.index,
                    destination: task.destination,
                    error: message,
                });
            }
        }
        handled += 1;
    }
    tracing::debug!(worker_id, handled, "worker done");
}
