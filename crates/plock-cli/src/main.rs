use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use plock_core::{
    default_cache_dir, lock_create, lock_export, CreateRequest, ExportRequest, LockError,
    LockStyle, OutputTarget, PipResolver, ResolverConfiguration, DEFAULT_INDEX, PLOCK_VERSION,
};
use plock_domain::{RequirementConfiguration, ResolverVersion, Target, TargetConfiguration};

fn main() {
    let cli = PlockCli::parse();
    init_tracing(cli.trace, cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("{err}");
        std::process::exit(err.status().exit_code());
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("plock={level},plock_cli={level},plock_core={level},plock_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(cli: &PlockCli) -> Result<(), LockError> {
    match &cli.command {
        LockCommand::Create(args) => run_create(cli, args),
        LockCommand::Export(args) => run_export(args),
    }
}

fn run_create(cli: &PlockCli, args: &CreateArgs) -> Result<(), LockError> {
    let style = LockStyle::from_str(args.style.trim()).map_err(|_| {
        LockError::Requirements(anyhow!(
            "unrecognized lock style {:?}; choose from: {}",
            args.style,
            LockStyle::choices()
        ))
    })?;
    let resolver_version = ResolverVersion::from_str(args.resolver_version.trim()).map_err(|_| {
        LockError::Requirements(anyhow!(
            "unrecognized resolver version {:?}; choose from: pip-legacy-resolver, pip-2020-resolver",
            args.resolver_version
        ))
    })?;

    let indexes = if args.indexes.is_empty() {
        vec![DEFAULT_INDEX.to_string()]
    } else {
        args.indexes.clone()
    };
    let request = CreateRequest {
        style,
        requirements: RequirementConfiguration {
            requirements: args.specs.clone(),
            requirement_files: args.requirement_files.clone(),
            constraint_files: args.constraint_files.clone(),
        },
        resolver: ResolverConfiguration {
            resolver_version,
            allow_prereleases: args.pre,
            allow_wheels: !args.no_wheel,
            allow_builds: !args.no_build,
            transitive: !args.intransitive,
            indexes,
            find_links: args.find_links.clone(),
            max_parallel_jobs: args.jobs,
        },
        targets: target_configuration(&args.targets, args.assume_manylinux.clone())?,
        cache: args.cache_dir.clone().unwrap_or_else(default_cache_dir),
        output: output_target(args.output.as_ref()),
    };

    let downloader = PipResolver::new(args.python.clone());
    let created = lock_create(&request, &downloader, PLOCK_VERSION)?;
    if let Some(path) = &args.output {
        if !cli.quiet {
            println!(
                "Wrote a lock with {} locked resolve(s) to {}",
                created.locked_resolves.len(),
                path.display()
            );
        }
    }
    Ok(())
}

fn run_export(args: &ExportArgs) -> Result<(), LockError> {
    let request = ExportRequest {
        format: args.format.clone(),
        lockfile: args.lockfile.clone(),
        targets: target_configuration(&args.targets, None)?,
        output: output_target(args.output.as_ref()),
    };
    lock_export(&request)
}

fn target_configuration(
    raw: &[String],
    assume_manylinux: Option<String>,
) -> Result<TargetConfiguration, LockError> {
    let targets = raw
        .iter()
        .map(|value| Target::from_str(value))
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(LockError::Requirements)?;
    Ok(TargetConfiguration {
        targets,
        assume_manylinux,
    })
}

fn output_target(path: Option<&PathBuf>) -> OutputTarget {
    path.map_or(OutputTarget::Stdout, |path| {
        OutputTarget::File(path.clone())
    })
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Create and export multi-target Python lock files",
    after_help = "Examples:\n  plock create requests==2.31.0 --target cp39-linux_x86_64 -o requirements.lock.json\n  plock export --target cp39-linux_x86_64 requirements.lock.json"
)]
struct PlockCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)"
    )]
    quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q")]
    trace: bool,
    #[command(subcommand)]
    command: LockCommand,
}

#[derive(Subcommand, Debug)]
enum LockCommand {
    #[command(
        about = "Create a lock file.",
        override_usage = "plock create [SPEC ...] [--target TARGET ...] [-o OUT]",
        after_help = "Examples:\n  plock create requests==2.31.0 -o requirements.lock.json\n  plock create -r requirements.txt --target cp39-linux_x86_64 --target cp310-macosx_x86_64\n"
    )]
    Create(CreateArgs),
    #[command(
        about = "Export a lock file in a different format.",
        override_usage = "plock export [--format FORMAT] <LOCKFILE> [--target TARGET ...]",
        after_help = "Examples:\n  plock export requirements.lock.json\n  plock export --target cp39-linux_x86_64 requirements.lock.json -o requirements.txt\n"
    )]
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(value_name = "SPEC", help = "Requirement specifiers to lock")]
    specs: Vec<String>,
    #[arg(
        short = 'r',
        long = "requirement",
        value_name = "FILE",
        help = "Additional requirement files"
    )]
    requirement_files: Vec<PathBuf>,
    #[arg(
        long = "constraint",
        value_name = "FILE",
        help = "Constraint files applied during the resolve"
    )]
    constraint_files: Vec<PathBuf>,
    #[arg(
        long,
        default_value = "strict",
        value_name = "STYLE",
        help = "The style of lock to generate (strict or sources)"
    )]
    style: String,
    #[arg(
        long = "target",
        value_name = "TARGET",
        help = "Interpreter-platform pairs the lock must cover, e.g. cp39-linux_x86_64"
    )]
    targets: Vec<String>,
    #[arg(
        long = "manylinux",
        value_name = "TAG",
        help = "Assumed manylinux compatibility for linux targets"
    )]
    assume_manylinux: Option<String>,
    #[arg(
        long = "index",
        value_name = "URL",
        help = "Package indexes to resolve against (defaults to PyPI)"
    )]
    indexes: Vec<String>,
    #[arg(
        long = "find-links",
        value_name = "PATH",
        help = "Extra archive locations searched during the resolve"
    )]
    find_links: Vec<String>,
    #[arg(long, help = "Allow prerelease and development versions")]
    pre: bool,
    #[arg(long = "no-wheel", help = "Do not allow binary distributions")]
    no_wheel: bool,
    #[arg(
        long = "no-build",
        help = "Do not allow building from source distributions"
    )]
    no_build: bool,
    #[arg(
        long,
        help = "Lock only the given requirements, not their dependencies"
    )]
    intransitive: bool,
    #[arg(
        long,
        value_name = "JOBS",
        default_value_t = 8,
        help = "Maximum parallel resolve jobs"
    )]
    jobs: usize,
    #[arg(
        long = "resolver-version",
        value_name = "VERSION",
        default_value = "pip-2020-resolver",
        help = "The pip resolver implementation to use"
    )]
    resolver_version: String,
    #[arg(
        long = "cache-dir",
        value_name = "DIR",
        help = "Download cache location"
    )]
    cache_dir: Option<PathBuf>,
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Write the lock file here instead of stdout"
    )]
    output: Option<PathBuf>,
    #[arg(
        long,
        value_name = "EXE",
        default_value = "python3",
        help = "Python interpreter used to drive pip"
    )]
    python: String,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(
        long,
        default_value = "pip",
        value_name = "FORMAT",
        help = "The format to export the lock to (currently only 'pip')"
    )]
    format: String,
    #[arg(value_name = "LOCKFILE", help = "The lock file to export")]
    lockfile: PathBuf,
    #[arg(
        long = "target",
        value_name = "TARGET",
        help = "Interpreter-platform pairs to export for, e.g. cp39-linux_x86_64"
    )]
    targets: Vec<String>,
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Write the export here instead of stdout"
    )]
    output: Option<PathBuf>,
}
