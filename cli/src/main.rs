//! unquiz CLI - exam question extraction tool

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unquiz::media::{Collaborators, FsMediaStore};
use unquiz::pipeline::{protect, score, stream_for};
use unquiz::render::{self, JsonFormat, ReviewReport};
use unquiz::{DetectedCategory, ParseContext, ParseOptions};

#[derive(Parser)]
#[command(name = "unquiz")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract multiple-choice questions from DOCX question banks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one document to JSON
    Parse {
        /// Input DOCX or text file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Write only the question list
        #[arg(long)]
        questions_only: bool,

        #[command(flatten)]
        parse: ParseArgs,
    },

    /// Parse many documents in parallel
    Batch {
        /// Input files
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory for <name>.json files
        #[arg(short, long, value_name = "DIR", default_value = "unquiz_output")]
        output: PathBuf,

        #[command(flatten)]
        parse: ParseArgs,
    },

    /// Show category scores of a document
    Classify {
        /// Input DOCX or text file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the normalized text stream of a document
    Stream {
        /// Input DOCX or text file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Show math replaced by MATH_<n> tokens
        #[arg(long)]
        protected: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct ParseArgs {
    /// Subject hint selecting a parser variant (e.g. "Kimyo", "Fizika")
    #[arg(short, long, env = "UNQUIZ_SUBJECT")]
    subject: Option<String>,

    /// Fail when a media collaborator fails instead of skipping the item
    #[arg(long)]
    strict: bool,

    /// Do not extract media
    #[arg(long)]
    no_media: bool,

    /// Directory for extracted media
    #[arg(long, value_name = "DIR", env = "UNQUIZ_MEDIA_DIR", default_value = "media")]
    media_dir: PathBuf,

    /// Prefix of media references in the output
    #[arg(long, env = "UNQUIZ_MEDIA_URL", default_value = "/media")]
    media_url: String,

    /// Vector image converter, e.g. "inkscape {input} --export-filename={output}"
    #[arg(long, value_name = "COMMAND", env = "UNQUIZ_RASTERIZER")]
    rasterizer: Option<String>,

    /// HTML table renderer, e.g. "wkhtmltoimage {input} {output}"
    #[arg(long, value_name = "COMMAND", env = "UNQUIZ_TABLE_RENDERER")]
    table_renderer: Option<String>,

    /// Seconds to wait for one converter call
    #[arg(long, value_name = "SECS", env = "UNQUIZ_TIMEOUT", default_value = "30")]
    timeout: u64,

    /// Highest accepted question number
    #[arg(long, default_value = "100")]
    max_number: u32,

    /// Points per question
    #[arg(long, default_value = "1")]
    points: u32,

    /// Drop raster images smaller than this many bytes
    #[arg(long, value_name = "BYTES", default_value = "0")]
    min_image_bytes: usize,
}

impl ParseArgs {
    fn options(&self) -> ParseOptions {
        let mut options = ParseOptions::new()
            .with_max_question_number(self.max_number)
            .with_points(self.points)
            .with_min_image_bytes(self.min_image_bytes)
            .with_collaborator_timeout(Duration::from_secs(self.timeout));
        if let Some(subject) = &self.subject {
            options = options.with_subject_hint(subject);
        }
        if self.strict {
            options = options.strict();
        }
        if self.no_media {
            options = options.text_only();
        }
        options
    }

    fn context(&self) -> ParseContext {
        let options = self.options();
        let store = FsMediaStore::new(&self.media_dir).with_url_prefix(&self.media_url);
        let mut ctx =
            ParseContext::new(options).with_collaborators(Collaborators::new(Arc::new(store)));

        if let Some((program, args)) = self.rasterizer.as_deref().and_then(split_command) {
            ctx = ctx.with_rasterizer_command(program, args);
        }
        if let Some((program, args)) = self.table_renderer.as_deref().and_then(split_command) {
            ctx = ctx.with_table_renderer_command(program, args);
        }
        ctx
    }
}

/// "prog a b" -> ("prog", ["a", "b"])
fn split_command(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    let args: Vec<String> = parts.collect();
    if args.is_empty() {
        Some((program, vec!["{input}".into(), "{output}".into()]))
    } else {
        Some((program, args))
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input,
            output,
            compact,
            questions_only,
            parse,
        } => cmd_parse(&input, output.as_deref(), compact, questions_only, &parse),
        Commands::Batch {
            inputs,
            output,
            parse,
        } => cmd_batch(&inputs, &output, &parse),
        Commands::Classify { input } => cmd_classify(&input),
        Commands::Stream { input, protected } => cmd_stream(&input, protected),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_parse(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    questions_only: bool,
    args: &ParseArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let outcome = unquiz::parse_with_context(&data, &args.context())?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = if questions_only {
        render::questions_to_json(&outcome.questions, format)?
    } else {
        render::to_json(&outcome, format)?
    };

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    print_review(&ReviewReport::from_outcome(&outcome));
    Ok(())
}

fn cmd_batch(inputs: &[PathBuf], output_dir: &Path, args: &ParseArgs) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(output_dir)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Parsing {} files...", inputs.len()));

    let results = unquiz::parse_batch(inputs, &args.context());
    pb.finish_and_clear();

    let mut failed = 0;
    for (path, result) in results {
        match result {
            Ok(outcome) => {
                let stem = path.file_stem().unwrap_or_default().to_string_lossy();
                let target = output_dir.join(format!("{}.json", stem));
                fs::write(&target, render::to_json(&outcome, JsonFormat::Pretty)?)?;
                println!(
                    "{} {} ({}, {} questions, {})",
                    "✓".green(),
                    path.display(),
                    outcome.category,
                    outcome.questions.len(),
                    outcome.review_summary()
                );
            }
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", "✗".red(), path.display(), e);
            }
        }
    }

    println!(
        "\n{} {} of {} files parsed into {}",
        "Done!".green().bold(),
        inputs.len() - failed,
        inputs.len(),
        output_dir.display()
    );
    Ok(())
}

fn cmd_classify(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let doc = unquiz::read_document(&fs::read(input)?)?;
    let stream = stream_for(&doc, &HashMap::new());
    let scores = score(&stream.text);

    println!("{}", "Category Scores".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for category in DetectedCategory::ALL {
        if category == DetectedCategory::Generic {
            continue;
        }
        println!("{:>12}: {}", category.to_string().bold(), scores.get(category));
    }
    println!();
    println!("{}: {}", "Detected".bold(), scores.dominant().to_string().green());
    Ok(())
}

fn cmd_stream(input: &Path, protected: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = unquiz::read_document(&fs::read(input)?)?;
    let stream = stream_for(&doc, &HashMap::new());
    if protected {
        println!("{}", protect(&stream.text).text);
    } else {
        println!("{}", stream.text);
    }
    Ok(())
}

fn print_review(report: &ReviewReport) {
    if report.is_clean() {
        eprintln!("{} {}", "✓".green(), report.summary());
        return;
    }
    eprintln!("{} {} (accuracy {:.1}%)", "!".yellow().bold(), report.summary(), report.accuracy);
    for item in &report.items {
        let problems: Vec<String> = item.problems.iter().map(|p| p.to_string()).collect();
        eprintln!(
            "  {} {} {}",
            format!("#{}", item.original_number.unwrap_or(item.position as u32)).yellow(),
            problems.join(", ").dimmed(),
            item.preview
        );
    }
}

fn cmd_version() {
    println!("{} {}", "unquiz".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Exam question extraction tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/unquiz".dimmed());
    println!("License: MIT");
}
