// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use subkit::app_config::{self, Config};
use subkit::file_utils::{FileManager, FileType};
use subkit::{apply_breaks, parse_auto, split_clauses, split_dialogue, write, FormatKind, FrameRate, Mode};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for Mode to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Time,
    Frame,
}

impl From<CliMode> for Mode {
    fn from(cli_mode: CliMode) -> Self {
        match cli_mode {
            CliMode::Time => Mode::Time,
            CliMode::Frame => Mode::Frame,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the detected format of a subtitle file
    Identify {
        /// Subtitle file to inspect
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Convert a subtitle file, or every subtitle file in a directory
    Convert(ConvertArgs),

    /// Split text into clauses
    Clauses {
        /// Text to split
        text: String,

        /// Script rule set, defaults to the configured one
        #[arg(short, long)]
        script: Option<String>,
    },

    /// Split text into speaker turns
    Dialogue {
        /// Text to split
        text: String,

        /// Script rule set, defaults to the configured one
        #[arg(short, long)]
        script: Option<String>,
    },

    /// Generate shell completions for subkit
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Input subtitle file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Target format (subrip, ssa, ass, mpsub, microdvd, webvtt)
    #[arg(short = 't', long = "to")]
    to: Option<FormatKind>,

    /// Output file, or output directory when converting a directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Position mode of the written file
    #[arg(short, long, value_enum)]
    mode: Option<CliMode>,

    /// Frame rate used for time/frame conversion (e.g. 25, 23.976, 24000/1001)
    #[arg(long)]
    framerate: Option<FrameRate>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// subkit - subtitle format engine
///
/// Identifies, converts and writes textual subtitle files and splits
/// subtitle text into clauses and speaker turns.
#[derive(Parser, Debug)]
#[command(name = "subkit")]
#[command(version)]
#[command(about = "Subtitle format conversion and text segmentation tool")]
#[command(long_about = "subkit reads SubRip, SubStation-Alpha, Advanced SubStation-Alpha, MPsub, MicroDVD and WebVTT files and converts between them.

EXAMPLES:
    subkit identify movie.srt                       # Print the detected format
    subkit convert movie.srt --to ass              # Convert to Advanced SubStation-Alpha
    subkit convert movie.srt --to microdvd --framerate 25
    subkit convert subs/ --to webvtt -o out/        # Convert a whole directory
    subkit clauses \"Dr. Smith left. She returned.\" -s latin-english
    subkit completions bash > subkit.bash           # Generate bash completions

CONFIGURATION:
    Configuration is stored in subkit.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = app_config::DEFAULT_CONFIG_FILE)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() {
    // The level is refined once the configuration is loaded
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();
    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: CommandLineOptions) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "subkit", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config_path, cli.log_level)?;

    match cli.command {
        Commands::Identify { file } => identify(&file),
        Commands::Convert(args) => run_convert(args, &config),
        Commands::Clauses { text, script } => {
            let script = script.unwrap_or_else(|| config.default_script.clone());
            let breaks = split_clauses(&text, &script)?;
            apply_breaks(&text, &breaks).into_iter().for_each(|piece| println!("{}", piece));
            Ok(())
        }
        Commands::Dialogue { text, script } => {
            let script = script.unwrap_or_else(|| config.default_script.clone());
            let breaks = split_dialogue(&text, &script)?;
            apply_breaks(&text, &breaks).into_iter().for_each(|piece| println!("{}", piece));
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn load_config(config_path: &Path, cli_log_level: Option<CliLogLevel>) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(level) = cli_log_level {
        log::set_max_level(app_config::LogLevel::from(level).into());
    }

    if !config_path.exists() {
        warn!("Config file not found at '{}', creating default config.", config_path.display());
    }
    let mut config = Config::load_or_create(config_path)?;
    if let Some(level) = cli_log_level {
        config.log_level = level.into();
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.into());
    Ok(config)
}

fn identify(file: &Path) -> Result<()> {
    match FileManager::detect_file_type(file)? {
        FileType::Subtitle(kind) => {
            let descriptor = kind.descriptor();
            println!("{}: {} ({})", file.display(), descriptor.name, kind);
            Ok(())
        }
        FileType::Unknown => Err(anyhow!("Unrecognized subtitle format: {:?}", file)),
    }
}

fn run_convert(args: ConvertArgs, config: &Config) -> Result<()> {
    let target = args.to.unwrap_or(config.default_format);

    if args.input_path.is_file() {
        let output = match &args.output {
            Some(output) => output.clone(),
            None => {
                let dir = args.input_path.parent().unwrap_or(Path::new("."));
                FileManager::generate_output_path(&args.input_path, dir, target)
            }
        };
        return convert_file(&args.input_path, &output, target, &args, config);
    }

    if !args.input_path.is_dir() {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    }

    info!("Converting subtitle files under {:?} to {}", args.input_path, target);
    let mut processed_count = 0;
    for input in FileManager::find_subtitle_files(&args.input_path)? {
        let dir = args
            .output
            .clone()
            .unwrap_or_else(|| input.parent().unwrap_or(Path::new(".")).to_path_buf());
        let output = FileManager::generate_output_path(&input, &dir, target);
        if let Err(e) = convert_file(&input, &output, target, &args, config) {
            error!("Error processing file {:?}: {:#}", input, e);
        } else {
            processed_count += 1;
        }
    }
    info!("Finished processing {} files", processed_count);
    Ok(())
}

fn convert_file(input: &Path, output: &Path, target: FormatKind, args: &ConvertArgs, config: &Config) -> Result<()> {
    if output.exists() && !args.force_overwrite {
        warn!("Output file already exists: {:?}. Use -f to force overwrite.", output);
        return Ok(());
    }

    let content = FileManager::read_to_string(input)?;
    let parsed = parse_auto(&content, &config.to_parse_options())
        .with_context(|| format!("Failed to parse subtitle file: {:?}", input))?;
    for warning in &parsed.warnings {
        warn!("{:?}: skipped event {} at line {}: {}", input, warning.event_index, warning.line, warning.error);
    }
    let mut document = parsed.document;

    let descriptor = target.descriptor();
    let mode = match args.mode {
        Some(mode) => mode.into(),
        None if descriptor.supports_mode(document.mode) => document.mode,
        None => descriptor.modes[0],
    };
    if mode != document.mode {
        let rate = args.framerate.or(document.frame_rate).unwrap_or(config.framerate);
        debug!("Converting {:?} to {} mode at {} fps", input, mode, rate);
        document = document.convert_mode(mode, rate)?;
    }

    let written = write(&document, target, &config.to_write_options())
        .with_context(|| format!("Failed to write {} output for {:?}", target, input))?;
    FileManager::write_to_file(output, &written)?;
    info!("Success: {:?}", output);
    Ok(())
}
