//! Tensormesh CLI
//!
//! Demo driver for the federated tensor handles: spins up in-process
//! workers, scatters shards across them, and materializes a
//! [`MultiPointerTensor`] in both fan-out modes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tensormesh::{
    init_logging, Gathered, MultiPointerTensor, ObjectId, Tensor, VirtualWorker, Worker,
    WorkerRegistry,
};
use tracing::info;

/// Tensormesh - federated tensor handles
#[derive(Parser, Debug)]
#[command(name = "tensormesh")]
#[command(about = "Federated tensor fan-out demo", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fan a retrieval out across in-process workers
    Demo {
        /// Number of workers to scatter shards over
        #[arg(short, long, default_value_t = 3)]
        workers: u32,

        /// Shape of each shard, as comma-separated dimensions
        #[arg(short, long, default_value = "2,2")]
        shape: String,

        /// Reduce the shards by elementwise addition
        #[arg(long)]
        sum: bool,

        /// Log level (overridden by RUST_LOG)
        #[arg(long, default_value = "info")]
        log_level: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            workers,
            shape,
            sum,
            log_level,
        } => {
            init_logging(&log_level)?;
            run_demo(workers, parse_shape(&shape)?, sum).await
        }
    }
}

fn parse_shape(input: &str) -> Result<Vec<usize>> {
    input
        .split(',')
        .map(|dim| {
            dim.trim()
                .parse::<usize>()
                .map_err(|e| anyhow::anyhow!("invalid shape dimension '{}': {}", dim, e))
        })
        .collect()
}

async fn run_demo(num_workers: u32, shape: Vec<usize>, sum: bool) -> Result<()> {
    let registry = WorkerRegistry::new();
    let mut pointers = Vec::new();

    // Worker i holds a shard filled with i+1
    for i in 0..num_workers {
        let worker = Arc::new(
            VirtualWorker::new(format!("worker-{i}"))
                .with_fetch_delay(Duration::from_millis(10)),
        );
        let object = ObjectId::random();
        worker
            .store_object(object, Tensor::filled(shape.clone(), (i + 1) as f32))
            .await?;
        pointers.push(worker.create_pointer(object)?.with_garbage_collection(false));
        registry.register(worker).await;
    }

    info!(workers = registry.len().await, shape = ?shape, "Mesh ready");

    let handle = MultiPointerTensor::new(pointers)?
        .with_description("demo fan-out tensor")
        .with_fetch_timeout(Duration::from_secs(5));

    info!(
        handle = %handle.id(),
        shards = handle.num_shards(),
        shape = ?handle.shape(),
        "Built multi-pointer tensor"
    );

    match handle.get(sum).await? {
        Gathered::Reduced(tensor) => {
            info!(shape = ?tensor.shape, values = ?tensor.data, "Reduced result");
        }
        Gathered::Shards(shards) => {
            for (location, tensor) in handle.locations().iter().zip(&shards) {
                info!(location = %location, values = ?tensor.data, "Shard result");
            }
        }
    }

    Ok(())
}
