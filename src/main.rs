use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use release_flow::cli::{run_version_workflow, VersionWorkflowArgs};
use release_flow::logging;
use release_flow::ui::{self, OutputFormat};
use release_flow::ReleaseFlowError;

#[derive(clap::Parser)]
#[command(
    name = "release-flow",
    version,
    about = "Compute build versions from release branches and tags"
)]
struct Args {
    #[arg(short, long, help = "Source ref being built (default: current branch)")]
    source_ref: Option<String>,

    #[arg(short, long, help = "Target branch ref of a pull request build")]
    target_branch: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json, help = "Output format")]
    output: OutputFormat,

    #[arg(short, long, help = "Pretty-print JSON output")]
    pretty: bool,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Log progress information")]
    verbose: bool,

    #[arg(short, long, help = "Log debug information")]
    debug: bool,

    #[arg(long, help = "Read origin/... remote-tracking branches instead of local branches")]
    use_origin_branches: bool,

    #[arg(long, default_value = ".", help = "Path to the repository")]
    repo: PathBuf,
}

fn run(args: Args) -> Result<()> {
    let workflow_args = VersionWorkflowArgs {
        config_path: args.config,
        repo_path: args.repo,
        source_ref: args.source_ref,
        target_branch: args.target_branch,
        use_origin_branches: args.use_origin_branches,
    };

    let version = run_version_workflow(workflow_args)?;
    ui::print_build_version(&version, args.output, args.pretty)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_logging(logging::level_for_flags(args.verbose, args.debug));

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ReleaseFlowError>() {
            Some(err) if err.is_input_error() => {
                ui::display_error(&err.message());
                ExitCode::from(1)
            }
            _ => {
                ui::display_error(&format!("{:#}", e));
                ExitCode::from(2)
            }
        },
    }
}
