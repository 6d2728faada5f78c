use anyhow::Result;
use clap::Parser;

use release_forge::cli::ReleaseRun;
use release_forge::config;
use release_forge::git::Git2Repository;
use release_forge::{logging, ui};

#[derive(clap::Parser)]
#[command(
    name = "release-forge",
    about = "Bump the version code, fork a release branch and push release tags"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, help = "Show the effective configuration and exit")]
    print_config: bool,

    #[arg(short, long, help = "Print version information")]
    version: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.version {
        println!("release-forge {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    logging::init();

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    ui::display_config(&config);
    if args.print_config {
        return Ok(());
    }

    ui::display_status(&format!(
        "Preparing {} in {}",
        config.clone_url,
        config.source_dir.display()
    ));
    let repo = match Git2Repository::open_or_clone(
        &config.clone_url,
        &config.source_dir,
        &config.trunk_branch,
        &config.remote_name,
        config.credentials.clone(),
    ) {
        Ok(repo) => repo,
        Err(e) => {
            ui::display_error(&format!("Git repository error: {}", e));
            std::process::exit(1);
        }
    };

    let mut run = ReleaseRun::new(repo, &config, chrono::Local::now().fixed_offset());
    match run.run() {
        Ok(summary) => {
            ui::display_summary(&summary);
            println!(
                "\n{} Released {} from {}\n",
                console::style("✓").green(),
                summary.release_branch,
                config.trunk_branch
            );
            Ok(())
        }
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ui::display_status(&format!("Run stopped in state {}", run.state()));
            std::process::exit(1);
        }
    }
}
