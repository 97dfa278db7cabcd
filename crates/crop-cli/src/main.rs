//! Crop data CLI
//!
//! Command-line tool for converting the game's crop and object tables into
//! normalized JSON or CSV.

use clap::{Parser, Subcommand};
use crop_core::{
    build_crops, load_tables, write_crops, ItemLayout, OutputFormat, OutputProfile,
    PipelineOptions, UnresolvedPolicy, VendorConfig,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "crop-cli")]
#[command(about = "Crop and object table parser", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the data tables and write the normalized crops
    Parse {
        /// Directory holding Crops and ObjectInformation
        #[arg(short, long, default_value = ".")]
        input: PathBuf,

        /// Output profile (parsed-crops, parsed-crop-data or crops)
        #[arg(short, long, default_value = "parsed-crops")]
        profile: String,

        /// Item table layout (legacy or localized); defaults to the profile's
        #[arg(short, long)]
        layout: Option<String>,

        /// Output format (json or csv)
        #[arg(long, default_value = "json")]
        format: String,

        /// Output file path; defaults to <profile>.<format>
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Vendor table file (JSON) replacing the profile's built-in one
        #[arg(long)]
        vendors: Option<PathBuf>,

        /// Leave out crops whose seed or produce item is missing instead of failing
        #[arg(long)]
        skip_unresolved: bool,
    },

    /// Show what was loaded from a data directory
    Inspect {
        /// Directory holding Crops and ObjectInformation
        #[arg(short, long, default_value = ".")]
        input: PathBuf,

        /// Output profile used to normalize a single crop
        #[arg(short, long, default_value = "parsed-crops")]
        profile: String,

        /// Item table layout (legacy or localized); defaults to the profile's
        #[arg(short, long)]
        layout: Option<String>,

        /// Print the normalized record for this crop (seed) key
        #[arg(short, long)]
        crop: Option<String>,
    },

    /// Write a profile's built-in vendor table as an editable template
    CreateVendors {
        /// Profile whose vendor table to write
        #[arg(short, long, default_value = "parsed-crop-data")]
        profile: String,

        /// Output path for the vendor file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(command: Commands) -> crop_core::Result<()> {
    match command {
        Commands::Parse {
            input,
            profile,
            layout,
            format,
            output,
            vendors,
            skip_unresolved,
        } => cmd_parse(
            &input,
            &profile,
            layout.as_deref(),
            &format,
            output,
            vendors.as_deref(),
            skip_unresolved,
        ),
        Commands::Inspect {
            input,
            profile,
            layout,
            crop,
        } => cmd_inspect(&input, &profile, layout.as_deref(), crop.as_deref()),
        Commands::CreateVendors { profile, output } => cmd_create_vendors(&profile, &output),
    }
}

fn pipeline_options(profile: &str, layout: Option<&str>) -> crop_core::Result<PipelineOptions> {
    let profile: OutputProfile = profile.parse()?;
    let mut options = PipelineOptions::for_profile(profile);
    if let Some(layout) = layout {
        options.layout = layout.parse::<ItemLayout>()?;
    }
    Ok(options)
}

fn cmd_parse(
    input: &Path,
    profile: &str,
    layout: Option<&str>,
    format: &str,
    output: Option<PathBuf>,
    vendors: Option<&Path>,
    skip_unresolved: bool,
) -> crop_core::Result<()> {
    let format: OutputFormat = match format.parse() {
        Ok(f) => f,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    };

    let mut options = pipeline_options(profile, layout)?;
    if skip_unresolved {
        options.unresolved = UnresolvedPolicy::Skip;
    }
    if let Some(path) = vendors {
        options.vendors = Some(VendorConfig::load(path)?);
    }

    let tables = load_tables(input)?;
    if !tables.warnings.is_empty() {
        log::warn!(
            "{} record(s) did not match the expected format",
            tables.warnings.len()
        );
    }

    let crops = build_crops(&tables, &options)?;

    let output = output.unwrap_or_else(|| {
        PathBuf::from(format!("{}.{}", options.profile.name(), format.extension()))
    });
    let report = write_crops(&output, &crops, format)?;

    println!(
        "🌱  Parsed {} crops and saved to {}",
        report.count,
        report.path.display()
    );

    Ok(())
}

fn cmd_inspect(
    input: &Path,
    profile: &str,
    layout: Option<&str>,
    crop: Option<&str>,
) -> crop_core::Result<()> {
    let options = pipeline_options(profile, layout)?;
    let tables = load_tables(input)?;

    println!("Directory: {}", input.display());
    println!("Format: {}", tables.format);
    println!(
        "Crops: {} records ({})",
        tables.crops.len(),
        tables.crops.source_path.display()
    );
    println!(
        "Items: {} records ({})",
        tables.items.len(),
        tables.items.source_path.display()
    );
    println!();

    if tables.warnings.is_empty() {
        println!("All records match the expected format.");
    } else {
        println!("Format mismatches ({}):", tables.warnings.len());
        for warning in &tables.warnings {
            println!("  {} {}: {}", warning.table, warning.key, warning.value);
        }
    }

    let Some(key) = crop else {
        return Ok(());
    };

    let crops = build_crops(&tables, &options)?;
    let found = crops
        .values()
        .find(|c| c.seed.id.to_string() == key.trim());

    println!();
    match found {
        Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
        None => println!("No crop with key '{}' in profile {}", key, options.profile),
    }

    Ok(())
}

fn cmd_create_vendors(profile: &str, output: &Path) -> crop_core::Result<()> {
    let profile: OutputProfile = profile.parse()?;
    let config = profile
        .default_vendors()
        .unwrap_or_else(VendorConfig::standard);

    config.save(output)?;
    println!("Created vendor file: {}", output.display());
    println!("Profile: {}", profile);
    println!();
    println!("Edit the file to adjust shop lists and prices, then run:");
    println!(
        "  crop-cli parse --profile {} --vendors {}",
        profile,
        output.display()
    );

    Ok(())
}
