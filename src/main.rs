//! # copyko CLI Entry Point
//!
//! Parses arguments with clap, builds the module index, resolves the
//! requested modules and stages the result.
//!
//! ```text
//! copyko [OPTIONS] <MODULE>... <DEST>
//! ```

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use copyko::attribution::attribute;
use copyko::config::{self, Config};
use copyko::diagnostics;
use copyko::index::ModuleIndex;
use copyko::materialize::{Materializer, PlaceMode, PlacementReport};
use copyko::modinfo::Modinfo;
use copyko::resolver::{Resolution, resolve};
use copyko::ui::{self, QueryProgress};

#[derive(Parser)]
#[command(
    name = "copyko",
    version,
    about = "Copy kernel modules (ko-files) and their dependencies to <DEST>",
    long_about = "Copy kernel modules (ko-files), the modules they depend on and the firmware \
                  they need to <DEST>.\nUseful when creating a live CD or a small initramfs.",
    override_usage = "copyko [OPTIONS] <MODULE>... <DEST>"
)]
struct Cli {
    /// Directory to search kernel modules in [default: /lib/modules/<running release>]
    #[arg(short = 'f', long = "from", value_name = "FROM", env = "COPYKO_FROM")]
    from: Option<PathBuf>,

    /// Directory to search firmware in [default: <FROM>/../../firmware]
    #[arg(long, value_name = "FROM", env = "COPYKO_FWSRC")]
    fwsrc: Option<PathBuf>,

    /// Directory to store firmware in [default: <DEST>/../../firmware]
    #[arg(long, value_name = "TO", env = "COPYKO_FWDST")]
    fwdst: Option<PathBuf>,

    /// Try to make hard links instead of copying files
    #[arg(short, long)]
    link: bool,

    /// Explain what is being done
    #[arg(short, long)]
    verbose: bool,

    /// Resolve and print what would be copied without touching <DEST>
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Program used to read module information
    #[arg(long, value_name = "PROG", default_value = "modinfo", env = "COPYKO_MODINFO")]
    modinfo: String,

    /// Module names followed by the destination directory
    #[arg(value_name = "MODULE", required = true)]
    args: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut modules = self.args;
        if modules.len() < 2 {
            Cli::command()
                .error(
                    ErrorKind::TooFewValues,
                    "at least one <MODULE> and a <DEST> directory are required",
                )
                .exit();
        }
        let dest = modules
            .pop()
            .map(PathBuf::from)
            .context("No destination directory given")?;

        let source = match self.from {
            Some(dir) => dir,
            None => config::default_source_dir()
                .context("Could not determine the module source directory, use --from")?,
        };
        let fw_source = self
            .fwsrc
            .unwrap_or_else(|| config::firmware_dir_for(&source));
        let fw_dest = self.fwdst.unwrap_or_else(|| config::firmware_dir_for(&dest));

        Ok(Config {
            source,
            dest,
            fw_source,
            fw_dest,
            mode: if self.link {
                PlaceMode::HardLink
            } else {
                PlaceMode::Copy
            },
            verbose: self.verbose,
            dry_run: self.dry_run,
            modinfo: self.modinfo,
            modules: config::normalize_module_list(modules),
        })
    }
}

/// Default log directive when `RUST_LOG` is not set.
fn log_directive(verbose: bool) -> &'static str {
    if verbose { "copyko=debug" } else { "warn" }
}

fn init_tracing(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(log_directive(verbose))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.into_config()?;
    run(&config)
}

fn run(config: &Config) -> Result<()> {
    if config.verbose {
        println!("Source directory is {}", config.source.display());
        println!("Source firmware directory is {}", config.fw_source.display());
        println!("Destination directory is {}", config.dest.display());
        println!(
            "Destination firmware directory is {}",
            config.fw_dest.display()
        );
    }

    let (index, index_diags) = ModuleIndex::scan(&config.source)
        .with_context(|| format!("Failed to index {}", config.source.display()))?;
    diagnostics::report(&index_diags);

    let mut modinfo = Modinfo::new(config.modinfo.as_str());
    let resolved = if !config.verbose && console::Term::stderr().is_term() {
        let mut progress = QueryProgress::new(&mut modinfo);
        let resolved = resolve(&index, &mut progress, config.modules.as_slice());
        progress.finish();
        resolved
    } else {
        resolve(&index, &mut modinfo, config.modules.as_slice())
    };
    let mut resolution = resolved.context("Failed to read module information")?;
    diagnostics::report(&resolution.diagnostics);

    if config.dry_run {
        print_plan(&resolution);
    } else {
        let mut materializer = Materializer::new(config.mode, config.verbose);
        materializer.stage(config, &resolution);
        let report = materializer.finish();
        diagnostics::report(&report.diagnostics);
        print_summary(&resolution, &report);
    }

    if config.verbose {
        let attribution_diags = attribute(&mut resolution);
        diagnostics::report(&attribution_diags);
        print_attribution(&resolution);
    }

    Ok(())
}

fn print_plan(resolution: &Resolution<'_>) {
    if resolution.is_empty() {
        println!("{} Nothing to copy.", "!".yellow());
        return;
    }

    let mut table = ui::Table::new(&["Module", "Path", "Depends on"]);
    for (name, module) in &resolution.modules {
        let name = if module.requested_directly {
            name.bold().green().to_string()
        } else {
            name.to_string()
        };
        table.add_row(vec![
            name,
            module.path.display().to_string(),
            module.dependencies.join(", "),
        ]);
    }
    table.print();

    if !resolution.firmware.is_empty() {
        println!("Firmware:");
        for fw in &resolution.firmware {
            println!("  {}", fw.dimmed());
        }
    }
}

fn print_summary(resolution: &Resolution<'_>, report: &PlacementReport) {
    println!(
        "{} Staged {} modules and {} firmware files (copied {}, linked {}, already present {})",
        "✓".green(),
        resolution.len(),
        resolution.firmware.len(),
        report.copied,
        report.linked,
        report.present
    );
    if report.failed > 0 {
        println!("{} {} files could not be staged", "x".red(), report.failed);
    }
}

fn print_attribution(resolution: &Resolution<'_>) {
    for (name, module) in resolution.pulled_in() {
        let by: Vec<&str> = module.required_by.iter().map(String::as_str).collect();
        println!("Module {} is pulled in by {}", name.bold(), by.join(" "));
    }

    let mut redundant = false;
    for (name, module) in resolution.redundant_requests() {
        let by: Vec<&str> = module.required_by.iter().map(String::as_str).collect();
        println!("Module {} is dependency for {}", name.bold(), by.join(" "));
        redundant = true;
    }
    if redundant {
        println!(
            "{} You can omit dependency modules because they are copied along with the modules that need them.",
            "💡".yellow()
        );
    }
}
