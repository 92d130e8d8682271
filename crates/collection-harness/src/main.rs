//! Collection harness command line

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use collection_harness::{
    telemetry, HarnessConfig, RenderFault, ScenarioRunner, SimulatedEnvironment, WorkflowDriver,
};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Command::new("collection-harness")
        .version(collection_harness::VERSION)
        .about("Collection workflow scenario harness")
        .subcommand_required(true)
        .subcommand(
            Command::new("run")
                .about("Run the collection workflow suite against the simulated environment")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the report as JSON"),
                )
                .arg(
                    Arg::new("fail-render-at")
                        .long("fail-render-at")
                        .value_parser(value_parser!(usize))
                        .help("Make the player view log an error at this node count"),
                )
                .arg(
                    Arg::new("inject-error")
                        .long("inject-error")
                        .help("Log this console error before the suite starts"),
                ),
        )
        .subcommand(Command::new("config").about("Print the default configuration as TOML"));

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("run", args)) => {
            let config = match args.get_one::<PathBuf>("config") {
                Some(path) => HarnessConfig::from_file(path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => HarnessConfig::new(),
            };
            telemetry::init(config.log_format);

            let env = Arc::new(SimulatedEnvironment::with_commit_policy(
                config.commit_message_policy,
            ));
            if let Some(count) = args.get_one::<usize>("fail-render-at") {
                env.add_render_fault(RenderFault::PlayerAtNodeCount(*count));
            }
            if let Some(message) = args.get_one::<String>("inject-error") {
                env.inject_console_error(message.clone());
            }

            let mut driver = WorkflowDriver::new(env, config);
            let report = ScenarioRunner::standard().run(&mut driver).await;

            if args.get_flag("json") {
                println!("{}", report.to_json().context("serializing report")?);
            } else {
                println!("{}", report.generate_text());
            }
            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("config", _)) => {
            print!("{}", HarnessConfig::default().to_toml()?);
        }
        _ => {}
    }
    Ok(())
}
