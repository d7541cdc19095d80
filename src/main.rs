use anyhow::Result;
use clap::{Parser, Subcommand};
use hetl::{init_tracing_once, DayDate, HackerNewsETL, StoryDescriptor};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape, complete and merge Hacker News datasets")]
struct Args {
    /// Data root holding datasets/, complete/ and front_pages/ (default: $HETL_DATA_ROOT or ./data)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Hide progress bars.
    #[arg(long, global = true, default_value_t = false)]
    no_progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect the current stories of a list (top, best, new, ask, show, job).
    CollectCurrent {
        descriptor: StoryDescriptor,
        /// Dataset name; defaults to today's date.
        name: Option<String>,
    },
    /// Collect archived front pages between two Y-M-D dates, inclusive.
    CollectPast { start: DayDate, end: DayDate },
    /// Complete one batch of a raw dataset into a completed dataset.
    CompleteBatch {
        dataset_name: String,
        completed_dataset_name: String,
        user_batch_size: usize,
        posts_batch_size: usize,
    },
    /// Complete a raw dataset in batches until nothing remains.
    Complete {
        dataset_name: String,
        user_batch_size: usize,
        posts_batch_size: usize,
    },
    /// Complete every raw dataset in the datasets directory.
    CompleteAll { user_batch_size: usize, posts_batch_size: usize },
    /// Merge two or more completed datasets into a new one.
    Merge {
        final_name: String,
        #[arg(required = true, num_args = 2..)]
        datasets: Vec<String>,
    },
    /// Merge the batch subdirectories of a completed dataset into it.
    MergeDir { name: String },
}

fn main() -> Result<()> {
    init_tracing_once();
    let args = Args::parse();

    let mut etl = HackerNewsETL::from_env().progress(!args.no_progress);
    if let Some(root) = &args.data_root {
        etl = etl.data_root(root);
    }

    match args.command {
        Command::CollectCurrent { descriptor, name } => {
            let client = etl.connect()?;
            let name = etl.collect_current(&client, descriptor, name.as_deref())?;
            println!("Wrote dataset {name}");
        }
        Command::CollectPast { start, end } => {
            let client = etl.connect()?;
            for name in etl.collect_past(&client, start, end)? {
                println!("Wrote dataset {name}");
            }
        }
        Command::CompleteBatch { dataset_name, completed_dataset_name, user_batch_size, posts_batch_size } => {
            let client = etl.connect()?;
            let outcome =
                etl.complete_batch(&client, &dataset_name, &completed_dataset_name, user_batch_size, posts_batch_size)?;
            println!("{:?}: {:?}", outcome.state, outcome.report);
        }
        Command::Complete { dataset_name, user_batch_size, posts_batch_size } => {
            let client = etl.connect()?;
            let rounds = etl.complete_dataset(&client, &dataset_name, user_batch_size, posts_batch_size)?;
            println!("Completed {dataset_name} in {rounds} batches");
        }
        Command::CompleteAll { user_batch_size, posts_batch_size } => {
            let client = etl.connect()?;
            let names = etl.complete_all(&client, user_batch_size, posts_batch_size)?;
            println!("Completed {} datasets", names.len());
        }
        Command::Merge { final_name, datasets } => {
            etl.merge_list(&datasets, &final_name)?;
            println!("Merged {} datasets into {final_name}", datasets.len());
        }
        Command::MergeDir { name } => {
            etl.merge_directory(&name)?;
            println!("Merged subdatasets of {name}");
        }
    }
    Ok(())
}
