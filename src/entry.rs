use clap::{ArgMatches, CommandFactory, FromArgMatches};

use probe_runner::args::RunnerArgs;
use probe_runner::config::{apply_config, load_config};
use probe_runner::error::AppResult;

use crate::app;

pub(crate) fn run() -> AppResult<()> {
    let (mut args, matches) = parse_args()?;

    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }

    probe_runner::logger::init_logging(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(app::run_local(args))
}

fn parse_args() -> AppResult<(RunnerArgs, ArgMatches)> {
    let matches = RunnerArgs::command().get_matches();
    let args = RunnerArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}
