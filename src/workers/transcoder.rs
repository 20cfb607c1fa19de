use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions};
use lapin::types::FieldTable;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::infrastructure::media::hls::HlsTranscoder;
use crate::infrastructure::media::renditions;
use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::modules::video::events::{TranscodeJob, TRANSCODE_QUEUE};
use crate::modules::video::repository::VideoRepository;
use crate::state::AppState;

pub async fn start_transcoder_worker(state: AppState) {
    info!("🎥 Starting transcoder worker...");

    let channel = state
        .queue
        .consumer_channel()
        .await
        .expect("Failed to open consumer channel");

    RabbitMqService::declare_durable(&channel, TRANSCODE_QUEUE)
        .await
        .expect("Failed to declare queue");

    let mut consumer = channel
        .basic_consume(
            TRANSCODE_QUEUE,
            "transcoder_worker",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .expect("Failed to create consumer");

    // ffmpeg saturates cores quickly; admission is capped so a burst of
    // uploads queues up instead of launching an encoder per upload.
    let semaphore = Arc::new(Semaphore::new(state.config.transcode_concurrency.max(1)));

    info!(
        "🎥 Transcoder worker listening on '{}' ({} concurrent jobs)",
        TRANSCODE_QUEUE,
        state.config.transcode_concurrency.max(1)
    );

    while let Some(delivery) = consumer.next().await {
        let Ok(delivery) = delivery else {
            continue;
        };

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("Semaphore closed");

        info!("📦 Received transcoding job");

        let state = state.clone();
        tokio::spawn(async move {
            let _permit = permit;

            match serde_json::from_slice::<TranscodeJob>(&delivery.data) {
                Ok(job) => reconcile(&state, &job).await,
                Err(e) => error!("❌ Failed to parse job payload: {}", e),
            }

            // Acked either way: the terminal state (or the decision not to
            // retry it) is already recorded, and a poisoned payload must not
            // loop forever.
            if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
                error!("Failed to ack message: {}", e);
            }
        });
    }
}

/// Runs one job and folds its outcome back into the video record. Exactly one
/// terminal transition is attempted per job.
async fn reconcile(state: &AppState, job: &TranscodeJob) {
    match process_job(state, job).await {
        Ok(()) => {
            match VideoRepository::mark_ready(&state.db, &job.slug, &renditions::labels()).await {
                Ok(()) => {
                    // The raw input goes away only once success is durably
                    // recorded.
                    if let Err(e) = tokio::fs::remove_file(&job.input_path).await {
                        warn!("Could not remove raw input {}: {}", job.input_path, e);
                    }
                    info!("✅ Transcoding finished for {}", job.slug);
                }
                Err(e) => {
                    // The ladder is on disk but the record still says
                    // PROCESSING; viewers keep seeing 404. Logged, not
                    // retried.
                    error!(
                        "Transcode for {} succeeded but the status update failed: {}",
                        job.slug, e
                    );
                }
            }
        }
        Err(e) => {
            error!("❌ Transcoding failed for {}: {}", job.slug, e);
            // Raw input is kept on failure for postmortem.
            if let Err(mark) = VideoRepository::mark_failed(&state.db, &job.slug).await {
                error!("Could not record error state for {}: {}", job.slug, mark);
            }
        }
    }
}

async fn process_job(state: &AppState, job: &TranscodeJob) -> anyhow::Result<()> {
    info!("Processing job: {:?}", job);

    let input = Path::new(&job.input_path);
    if !input.is_file() {
        anyhow::bail!("input file {} is missing", job.input_path);
    }

    // Output directory was created at intake; recreate it if an operator
    // cleaned up between accept and processing.
    state.artifacts.ensure(&job.slug)?;

    HlsTranscoder::run(input, &state.artifacts, &job.slug).await?;
    Ok(())
}
