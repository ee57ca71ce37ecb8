use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use manpo_core::{ExtractionCatalog, TranslatingCatalog};
use manpo_transform::{GroffCodePolicy, TransformError, TransformOptions, transform_document};
use tracing_subscriber::EnvFilter;

const DEBUG_STREAMS: &[&str] = &["splitargs", "pretrans", "postrans", "fonts"];

#[derive(Debug, Parser)]
#[command(name = "manpo")]
#[command(about = "Extract translatable text from man pages and reinject translations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract translatable messages from a man page into a PO file.
    Extract(ExtractArgs),
    /// Produce a translated man page from a master page and a PO file.
    Translate(TranslateArgs),
}

#[derive(Debug, Args)]
struct BehaviorArgs {
    /// Policy for .de/.ie/.if blocks: fail, verbatim or translate.
    #[arg(long, default_value = "fail")]
    groff_code: String,
    /// Comma-separated macros emitted verbatim.
    #[arg(long)]
    untranslated: Option<String>,
    /// Comma-separated macros that take no arguments.
    #[arg(long)]
    noarg: Option<String>,
    /// Comma-separated macros whose joined arguments form one message.
    #[arg(long)]
    translate_joined: Option<String>,
    /// Comma-separated macros translated argument by argument; prefix an
    /// entry with keepfirst: to leave the tag argument untranslated.
    #[arg(long)]
    translate_each: Option<String>,
    /// Comma-separated macros embedded inline into their paragraph.
    #[arg(long = "inline")]
    inline_macros: Option<String>,
    /// Comma-separated begin:end macro pairs added to the no-wrap sets.
    #[arg(long)]
    no_wrap: Option<String>,
    /// Debug stream to enable (splitargs, pretrans, postrans, fonts);
    /// repeatable.
    #[arg(long)]
    debug: Vec<String>,
    /// Increase diagnostic chatter.
    #[arg(long)]
    verbose: bool,
}

impl BehaviorArgs {
    fn to_options(&self) -> Result<TransformOptions, CliError> {
        let groff_code = GroffCodePolicy::parse(&self.groff_code).ok_or_else(|| {
            CliError::Message(format!(
                "invalid groff_code policy '{}'; use fail, verbatim or translate",
                self.groff_code
            ))
        })?;
        for stream in &self.debug {
            if !DEBUG_STREAMS.contains(&stream.as_str()) {
                return Err(CliError::Message(format!(
                    "unknown debug stream '{stream}'; known streams: {}",
                    DEBUG_STREAMS.join(", ")
                )));
            }
        }

        let list = |value: &Option<String>| {
            value
                .as_deref()
                .map(TransformOptions::parse_list)
                .unwrap_or_default()
        };
        Ok(TransformOptions {
            verbose: self.verbose,
            groff_code,
            untranslated: list(&self.untranslated),
            noarg: list(&self.noarg),
            translate_joined: list(&self.translate_joined),
            translate_each: list(&self.translate_each),
            inline: list(&self.inline_macros),
            no_wrap: list(&self.no_wrap),
        })
    }
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input man page.
    #[arg(long)]
    master: PathBuf,
    /// Output PO file.
    #[arg(long)]
    po: PathBuf,
    /// Optional reproduced (untranslated) man page.
    #[arg(long)]
    localized: Option<PathBuf>,
    #[command(flatten)]
    behavior: BehaviorArgs,
}

#[derive(Debug, Args)]
struct TranslateArgs {
    /// Input man page.
    #[arg(long)]
    master: PathBuf,
    /// PO file with translations.
    #[arg(long)]
    po: PathBuf,
    /// Output translated man page.
    #[arg(long)]
    localized: PathBuf,
    #[command(flatten)]
    behavior: BehaviorArgs,
}

#[derive(Debug)]
enum CliError {
    Transform(TransformError),
    Message(String),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Transform(err) => err.exit_code(),
            Self::Message(_) => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(err) => err.fmt(f),
            Self::Message(message) => f.write_str(message),
        }
    }
}

impl From<TransformError> for CliError {
    fn from(err: TransformError) -> Self {
        Self::Transform(err)
    }
}

impl From<manpo_core::CatalogError> for CliError {
    fn from(err: manpo_core::CatalogError) -> Self {
        Self::Message(err.to_string())
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = match cli.command {
        Command::Extract(args) => run_extract(args),
        Command::Translate(args) => run_translate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(cli: &Cli) {
    let behavior = match &cli.command {
        Command::Extract(args) => &args.behavior,
        Command::Translate(args) => &args.behavior,
    };

    let mut directives = vec![if behavior.verbose {
        "info".to_string()
    } else {
        "warn".to_string()
    }];
    for stream in &behavior.debug {
        directives.push(format!("{stream}=debug"));
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives.join(",")))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn run_extract(args: ExtractArgs) -> Result<(), CliError> {
    let options = args.behavior.to_options()?;
    let mut catalog = ExtractionCatalog::new();
    transform(&args.master, &mut catalog, options)?;

    let po = File::create(&args.po)
        .map_err(|err| CliError::Message(format!("cannot create {}: {err}", args.po.display())))?;
    let mut po = BufWriter::new(po);
    catalog.write_po(&mut po)?;
    po.flush()
        .map_err(|err| CliError::Message(format!("cannot write {}: {err}", args.po.display())))?;

    if let Some(localized) = &args.localized {
        write_document(localized, catalog.output())?;
    }
    Ok(())
}

fn run_translate(args: TranslateArgs) -> Result<(), CliError> {
    let options = args.behavior.to_options()?;
    let po = File::open(&args.po)
        .map_err(|err| CliError::Message(format!("cannot open {}: {err}", args.po.display())))?;
    let mut catalog =
        TranslatingCatalog::from_po(BufReader::new(po), &args.po.display().to_string())?;

    transform(&args.master, &mut catalog, options)?;
    write_document(&args.localized, catalog.output())
}

fn transform(
    master: &Path,
    catalog: &mut dyn manpo_core::MessageCatalog,
    options: TransformOptions,
) -> Result<(), CliError> {
    let input = File::open(master)
        .map_err(|err| CliError::Message(format!("cannot open {}: {err}", master.display())))?;
    let path = master.display().to_string();
    transform_document(&path, Box::new(BufReader::new(input)), catalog, options)?;
    Ok(())
}

fn write_document(path: &Path, content: &str) -> Result<(), CliError> {
    let file = File::create(path)
        .map_err(|err| CliError::Message(format!("cannot create {}: {err}", path.display())))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(content.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|err| CliError::Message(format!("cannot write {}: {err}", path.display())))?;
    Ok(())
}
