use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use patchbay_config::Config;
use patchbay_engine::{Format, SnapshotCache, Translator, io};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Convert Pure Data patches between native, JSON, XML and snapshot form.
#[derive(Parser)]
#[command(name = "patchbay", version, about)]
struct Cli {
    /// Log at debug level instead of info
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.config/patchbay/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one patch
    Convert {
        input: PathBuf,
        /// Output file; text formats go to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Target format (pd, json, xml, snapshot)
        #[arg(short = 't', long = "to")]
        format: Option<String>,
        /// Parse even when a cached snapshot exists
        #[arg(long)]
        no_cache: bool,
    },
    /// Convert every patch under a directory
    Batch {
        dir: PathBuf,
        /// Target format (pd, json, xml, snapshot)
        #[arg(short = 't', long = "to")]
        format: String,
        /// Source format to pick up when no pattern is given
        #[arg(long, default_value = "pd")]
        from: String,
        /// Output directory; defaults to next to each input
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Glob of files to pick up, relative to the directory
        #[arg(long)]
        pattern: Option<String>,
    },
    /// List the libraries and paths a patch depends on
    Deps { input: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.verbose { "debug" } else { "info" },
    ))
    .init();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("config file {} not found", path.display()))?,
        None => Config::load()?.unwrap_or_default(),
    };

    match cli.command {
        Command::Convert {
            input,
            output,
            format,
            no_cache,
        } => {
            let to = target_format(format.as_deref(), output.as_deref(), &config)?;
            let translator = translator(&config, !no_cache)?;
            convert(&translator, &input, output.as_deref(), to)
        }
        Command::Batch {
            dir,
            format,
            from,
            output,
            pattern,
        } => {
            let to: Format = format.parse()?;
            let from: Format = from.parse()?;
            let inputs = batch_inputs(&dir, from, pattern.as_deref())?;
            let translator = translator(&config, true)?;
            batch(&translator, &dir, &inputs, output.as_deref(), to)
        }
        Command::Deps { input } => deps(&config, &input),
    }
}

fn translator(config: &Config, use_cache: bool) -> Result<Translator> {
    let translator = Translator::new(config.to_settings());
    match (&config.cache_dir, use_cache) {
        (Some(dir), true) => Ok(translator.with_cache(SnapshotCache::new(dir))?),
        _ => Ok(translator),
    }
}

/// `-t` wins, then the output extension, then the configured default, then JSON.
fn target_format(flag: Option<&str>, output: Option<&Path>, config: &Config) -> Result<Format> {
    if let Some(name) = flag {
        return Ok(name.parse()?);
    }
    if let Some(format) = output.and_then(Format::from_path) {
        return Ok(format);
    }
    match &config.default_format {
        Some(name) => name
            .parse()
            .with_context(|| format!("default_format in {}", Config::config_path().display())),
        None => Ok(Format::Json),
    }
}

fn source_format(input: &Path) -> Result<Format> {
    Format::from_path(input)
        .ok_or_else(|| anyhow!("cannot tell the format of {} from its extension", input.display()))
}

fn patch_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string())
}

fn convert(translator: &Translator, input: &Path, output: Option<&Path>, to: Format) -> Result<()> {
    let from = source_format(input)?;
    let source = io::read_patch_file(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let translation = translator
        .translate(&patch_name(input), &source, from, to)
        .with_context(|| format!("failed to convert {}", input.display()))?;

    for dependency in translation.dependencies.iter() {
        log::debug!("{}: needs {dependency:?}", input.display());
    }

    match output {
        Some(path) => {
            io::write_output(path, &translation.output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!(
                "{} -> {}{}",
                input.display(),
                path.display(),
                if translation.cached { " (cached)" } else { "" }
            );
        }
        None if to.is_binary() => {
            let path = input.with_extension(to.extension());
            io::write_output(&path, &translation.output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("{} -> {}", input.display(), path.display());
        }
        None => std::io::stdout().write_all(&translation.output)?,
    }
    Ok(())
}

/// A glob when one is given, otherwise every file of the source format.
fn batch_inputs(dir: &Path, from: Format, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    match pattern {
        Some(pattern) => matching_files(dir, pattern),
        None => Ok(io::scan_patch_files(dir, from.extension())?),
    }
}

fn batch(
    translator: &Translator,
    dir: &Path,
    inputs: &[PathBuf],
    output: Option<&Path>,
    to: Format,
) -> Result<()> {
    if inputs.is_empty() {
        log::warn!("nothing to convert in {}", dir.display());
        return Ok(());
    }

    let mut failed = 0;
    for input in inputs {
        let relative = input.strip_prefix(dir).unwrap_or(input);
        let target = match output {
            Some(out) => out.join(relative),
            None => input.clone(),
        }
        .with_extension(to.extension());

        if let Err(e) = convert(translator, input, Some(&target), to) {
            log::error!("{e:#}");
            failed += 1;
        }
    }

    log::info!("converted {} of {} files", inputs.len() - failed, inputs.len());
    if failed > 0 {
        bail!("{failed} files failed to convert");
    }
    Ok(())
}

fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = format!(
        "{}/{pattern}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let mut files = glob::glob(&full)
        .with_context(|| format!("bad pattern {pattern}"))?
        .filter_map(|entry| match entry {
            Ok(path) => path.is_file().then_some(path),
            Err(e) => {
                log::warn!("skipping {}: {}", e.path().display(), e.error());
                None
            }
        })
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

fn deps(config: &Config, input: &Path) -> Result<()> {
    let from = source_format(input)?;
    let source = io::read_patch_file(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let translator = Translator::new(config.to_settings());
    let (patch, _) = translator
        .decode(&patch_name(input), &source, from)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let dependencies = patchbay_engine::collect_dependencies(&patch);

    let mut stdout = std::io::stdout();
    for path in dependencies.paths() {
        writeln!(stdout, "path {path}")?;
    }
    for lib in dependencies.libs() {
        match find_library(lib, &config.search_paths) {
            Some(found) => writeln!(stdout, "lib  {lib} ({})", found.display())?,
            None => {
                if !config.search_paths.is_empty() {
                    log::warn!("library {lib} not found in the configured search paths");
                }
                writeln!(stdout, "lib  {lib}")?;
            }
        }
    }
    Ok(())
}

/// First file or directory named after `lib` (with any extension) in the
/// search paths, in order.
fn find_library(lib: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    search_paths.iter().find_map(|dir| {
        let pattern = format!(
            "{}/{}*",
            glob::Pattern::escape(&dir.to_string_lossy()),
            glob::Pattern::escape(lib)
        );
        glob::glob(&pattern).ok()?.flatten().find(|path| {
            path.file_stem()
                .is_some_and(|stem| stem.to_string_lossy() == lib)
        })
    })
}
