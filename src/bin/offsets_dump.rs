use std::path::{Path, PathBuf};

use bytes::BytesMut;
use clap::Parser;
use dotenv::dotenv;
use offsets_reader::message::constants::{
    CONSUMER_OFFSETS_TOPIC, KAFKA_OFFSET, KAFKA_OFFSET_COMMIT_TIMESTAMP, KAFKA_OFFSET_GROUP,
    KAFKA_OFFSET_METADATA, KAFKA_OFFSET_PARTITION, KAFKA_OFFSET_TOPIC,
};
use offsets_reader::protocol::dump::decode_dump;
use offsets_reader::reader::AckOutcome;
use offsets_reader::{
    setup_tracing, AppError, AppResult, AutoReplayNacks, BatchSource, ChannelSource, Message,
    MessageBatch, OffsetRecordFilter, OffsetsReader, ReaderConfig, TopicPartition,
};
use tokio::runtime;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(version, about = "Print offset commits found in a __consumer_offsets dump")]
pub struct CommandLine {
    /// path to config file
    #[arg(short, long)]
    pub conf: Option<String>,
    /// dump of __consumer_offsets records
    #[arg(short, long)]
    pub file: PathBuf,
    /// directory of the rolling log file
    #[arg(long, default_value = "logs")]
    pub log_dir: String,
    /// log level (v: info, vv: debug, vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn main() -> AppResult<()> {
    dotenv().ok();

    let commandline = CommandLine::parse();
    let _log_guard = setup_tracing(&commandline.log_dir, commandline.verbose)?;

    let config_path = commandline.conf.as_ref().map_or_else(
        || {
            let mut path = PathBuf::from("./");
            path.push("conf.toml");
            path
        },
        PathBuf::from,
    );
    let config = ReaderConfig::set_up_config(config_path)?;

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(run(config, &commandline.file))
}

async fn run(config: ReaderConfig, dump_file: &Path) -> AppResult<()> {
    let filter = OffsetRecordFilter::new(config.topic_filter()?);
    let batches = load_batches(dump_file, config.reader.batch_size).await?;
    info!(
        "loaded {} batches from {}",
        batches.len(),
        dump_file.display()
    );

    let (batch_tx, batch_rx) = async_channel::bounded(16);
    let (outcome_tx, outcome_rx) = async_channel::unbounded();
    let producer = tokio::spawn(async move {
        for batch in batches {
            if batch_tx.send(batch).await.is_err() {
                break;
            }
        }
    });

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let source = ChannelSource::new(batch_rx).with_outcomes(outcome_tx);
    let mut reader = AutoReplayNacks::new(
        OffsetsReader::new(source, filter),
        config.reader.auto_replay_nacks,
    );

    let mut commits = 0usize;
    let result = loop {
        match reader.read_batch(&token).await {
            Ok((batch, ack)) => {
                commits += batch.len();
                batch.iter().for_each(print_commit);
                match ack(token.clone(), None).await {
                    Ok(()) => {}
                    Err(AppError::Cancelled) => {
                        info!("interrupted while acknowledging, stopping");
                        break Ok(());
                    }
                    Err(e) => break Err(e),
                }
            }
            Err(AppError::EndOfInput) => break Ok(()),
            Err(AppError::Cancelled) => {
                info!("interrupted, stopping");
                break Ok(());
            }
            Err(e) => break Err(e),
        }
    };
    reader.close().await?;
    producer.abort();

    let mut acked_batches = 0usize;
    while let Ok(outcome) = outcome_rx.try_recv() {
        match outcome {
            AckOutcome::Ack { .. } => acked_batches += 1,
            AckOutcome::Nack {
                batch_id, reason, ..
            } => warn!("batch {} was nacked: {}", batch_id, reason),
        }
    }
    info!(
        "found {} offset commits, acknowledged {} batches",
        commits, acked_batches
    );
    result
}

async fn load_batches(path: &Path, batch_size: usize) -> AppResult<Vec<MessageBatch>> {
    let content = tokio::fs::read(path).await?;
    let records = decode_dump(BytesMut::from(&content[..]))?;
    let topic_partition = TopicPartition::new(CONSUMER_OFFSETS_TOPIC, 0);
    let timestamp_ms = chrono::Utc::now().timestamp_millis();

    let messages: Vec<Message> = records
        .into_iter()
        .enumerate()
        .map(|(offset, record)| {
            Message::from_fetched(
                &topic_partition,
                offset as i64,
                timestamp_ms,
                record.key,
                record.value,
            )
        })
        .collect();
    Ok(messages
        .chunks(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect())
}

fn print_commit(message: &Message) {
    let field = |name: &str| {
        message
            .meta_get(name)
            .map(|v| v.to_string())
            .unwrap_or_default()
    };
    info!(
        log_offset = %field(KAFKA_OFFSET),
        topic = %field(KAFKA_OFFSET_TOPIC),
        partition = %field(KAFKA_OFFSET_PARTITION),
        group = %field(KAFKA_OFFSET_GROUP),
        commit_timestamp = %field(KAFKA_OFFSET_COMMIT_TIMESTAMP),
        metadata = %field(KAFKA_OFFSET_METADATA),
        "offset commit"
    );
}
