//! `planc`: reads a naive plan, job descriptor, and available-memory
//! descriptor as JSON plus a recorded activity profile, runs the improver,
//! and writes the improved plan as JSON.

use argh::FromArgs;
use plan_model::collab::{ChainPlanTaskGraphBuilder, InMemoryActivityGraph, SequentialIdentifierManager};
use plan_model::{AvailableMemDesc, JobDescriptor, Plan};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help"))]
/// Improves a dataflow execution plan's register counts and memory sharing.
struct Opts {
    /// naive plan, as JSON
    #[argh(option, long = "plan")]
    plan_file: PathBuf,

    /// job descriptor, as JSON
    #[argh(option, long = "job")]
    job_file: PathBuf,

    /// available memory descriptor, as JSON
    #[argh(option, long = "avail-mem")]
    avail_mem_file: PathBuf,

    /// recorded activity profile (one "actor_id work_stream_id duration_us" record per line)
    #[argh(option, long = "act-events")]
    act_events_file: PathBuf,

    /// where to write the improved plan, as JSON. Defaults to stdout.
    #[argh(option, short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// enable debug logging
    #[argh(switch, long = "debug-logging")]
    debug_logging: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> plan_model::Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn run(opts: &Opts) -> plan_model::Result<Plan> {
    let naive_plan: Plan = read_json(&opts.plan_file)?;
    let job: JobDescriptor = read_json(&opts.job_file)?;
    let amd: AvailableMemDesc = read_json(&opts.avail_mem_file)?;

    let act_events_file = File::open(&opts.act_events_file)?;
    let act_events = plan_model::profile::load_act_events(BufReader::new(act_events_file))?;

    let activity = InMemoryActivityGraph::build(&naive_plan, act_events);
    let task_graph_builder = ChainPlanTaskGraphBuilder;
    let identifiers = SequentialIdentifierManager::build(&naive_plan, job.gpu_device_num);

    plan_improver::improve(&naive_plan, &job, &amd, &activity, &task_graph_builder, &identifiers)
}

fn main() {
    let opts: Opts = argh::from_env();

    let log_level = if opts.debug_logging { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let plan = match run(&opts) {
        Ok(plan) => plan,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let result = match &opts.output {
        Some(path) => {
            let file = File::create(path).expect("failed to create output file");
            serde_json::to_writer_pretty(BufWriter::new(file), &plan)
        }
        None => serde_json::to_writer_pretty(std::io::stdout(), &plan),
    };
    if let Err(e) = result {
        log::error!("failed to write output plan: {e}");
        std::process::exit(1);
    }
}
