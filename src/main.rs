//! somkit CLI - Self-Organizing Map toolkit
//!
//! Command-line interface for building, training and analysing SOMs.

use clap::{Parser, Subcommand};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::{error, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use somkit::io::{self, Table};
use somkit::{
    apply_input_stats, build_som, propagate_set, resume_session, store_input_stats, train_epochs,
    ClassificationMatrix, Config, LayerClass, Network, Result, SomSession, SomkitError, TrainingSet,
    TransitionMatrix,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "somkit")]
#[command(author = "somkit Contributors")]
#[command(version)]
#[command(about = "Self-Organizing Map toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a fresh SOM and write its network file
    Init {
        /// JSON configuration (defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output network file
        #[arg(short, long)]
        output: PathBuf,

        /// Random seed for weight initialization
        #[arg(short, long)]
        seed: Option<u64>,

        /// Also write the effective configuration as JSON
        #[arg(long)]
        save_config: Option<PathBuf>,
    },

    /// Train a network on the files listed in a control table
    Train {
        /// Network file to start from
        #[arg(short, long)]
        network: PathBuf,

        /// Control table with a `file` column of triple files
        #[arg(short, long)]
        table: PathBuf,

        /// Output network file
        #[arg(short, long)]
        output: PathBuf,

        /// JSON configuration for the training schedule
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of epochs (overrides the configuration)
        #[arg(short = 'n', long)]
        epochs: Option<usize>,

        /// Random seed for shuffling
        #[arg(short, long)]
        seed: Option<u64>,

        /// Per-epoch error log
        #[arg(long)]
        error_log: Option<PathBuf>,

        /// Continue the schedules after the epoch stored in the network file
        #[arg(long)]
        resume: bool,
    },

    /// Write the classification matrix of a trained map
    Classify {
        /// Trained network file
        #[arg(short, long)]
        network: PathBuf,

        /// Control table with `file` and `class` columns
        #[arg(short, long)]
        table: PathBuf,

        /// Output matrix file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the winner transition matrix of a trained map
    Transitions {
        /// Trained network file
        #[arg(short, long)]
        network: PathBuf,

        /// Control table with a `file` column
        #[arg(short, long)]
        table: PathBuf,

        /// Output matrix file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show network topology
    Info {
        /// Network file to inspect
        network: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match cli.command {
        Commands::Init {
            config,
            output,
            seed,
            save_config,
        } => init_network(config, output, seed, save_config),

        Commands::Train {
            network,
            table,
            output,
            config,
            epochs,
            seed,
            error_log,
            resume,
        } => train_network(network, table, output, config, epochs, seed, error_log, resume),

        Commands::Classify {
            network,
            table,
            output,
        } => classify(network, table, output),

        Commands::Transitions {
            network,
            table,
            output,
        } => transitions(network, table, output),

        Commands::Info { network } => show_info(network),
    };

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(p) => Config::from_json_file(p),
        None => Ok(Config::default()),
    }
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Network files carry explicit weights, so reading needs no real entropy.
fn load_network(path: &Path) -> Result<Network> {
    io::read_network(path, &mut ChaCha8Rng::seed_from_u64(0))
}

/// Triple files listed in `table`, resolved against the table's directory,
/// merged into one set sized for `network`'s input layer. Also returns the
/// table row each element came from.
fn load_table_set(network: &Network, table_path: &Path, table: &Table) -> Result<(TrainingSet, Vec<usize>)> {
    let base = table_path.parent().unwrap_or_else(|| Path::new("."));
    let files: Vec<PathBuf> = table
        .text_column("file")?
        .into_iter()
        .map(|f| base.join(f))
        .collect();
    let input_dim = network.layer(network.input_layer()?)?.unit_count();
    io::load_triple_table(&files, "data", input_dim, 0)
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░  ")
}

fn init_network(
    config: Option<PathBuf>,
    output: PathBuf,
    seed: Option<u64>,
    save_config: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config)?;
    if seed.is_some() {
        config.training.seed = seed;
    }
    let mut rng = seeded_rng(config.training.seed);

    let network = build_som(&config.som, &mut rng)?;
    io::write_network(&network, &output)?;
    if let Some(path) = save_config {
        config.save_json(&path)?;
        println!("✓ Saved configuration to {}", path.display());
    }

    println!(
        "✓ Initialized SOM '{}' ({}x{} = {} units, {} inputs)",
        config.som.name,
        config.som.rows,
        config.som.cols,
        config.som.total_units(),
        config.som.input_dimension
    );
    println!("   Output: {}", output.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn train_network(
    network_path: PathBuf,
    table_path: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    epochs: Option<usize>,
    seed: Option<u64>,
    error_log: Option<PathBuf>,
    resume: bool,
) -> Result<()> {
    let start_time = Instant::now();
    let mut config = load_config(config)?;
    if let Some(n) = epochs {
        config.training.epochs = n;
    }
    if seed.is_some() {
        config.training.seed = seed;
    }
    let training = config.training;
    let mut rng = seeded_rng(training.seed);

    let mut network = load_network(&network_path)?;
    network.som()?;
    let table = Table::load(&table_path)?;
    let (mut set, _) = load_table_set(&network, &table_path, &table)?;
    println!("✓ Loaded {} elements from {} files", set.len(), table.len());

    // A map already trained on regularized data keeps its scaling.
    if !apply_input_stats(&network, &mut set)? && training.regularize {
        set.update_vector_stats(true, false)?;
        if let Some(stats) = set.input_stats() {
            store_input_stats(&mut network, stats)?;
        }
        set.regularize(true, false)?;
        info!("Regularized inputs of '{}'", set.name());
    }

    let mut log = match &error_log {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };
    if let Some(w) = log.as_mut() {
        writeln!(w, "# epoch rate mse")?;
    }

    let pb = ProgressBar::new(set.len() as u64);
    pb.set_style(bar_style());

    let mut session = if resume {
        resume_session(&network)?
    } else {
        SomSession::new()
    };
    info!("Training from epoch {}", session.time());
    let reports = train_epochs(
        &mut network,
        &mut set,
        &mut session,
        &training,
        &mut rng,
        Some(&pb),
        |report, net| {
            if let Some(w) = log.as_mut() {
                writeln!(w, "{} {} {}", report.time, report.learning_rate, report.mse)?;
            }
            let done = report.time + 1;
            if training.checkpoint_every > 0 && done % training.checkpoint_every == 0 {
                let path = output.with_extension(format!("epoch{}", done));
                io::write_network(net, &path)?;
                info!("Checkpoint written to {}", path.display());
            }
            Ok(())
        },
    )?;
    pb.finish_and_clear();
    if let Some(mut w) = log {
        w.flush()?;
    }

    io::write_network(&network, &output)?;

    let last = reports
        .last()
        .ok_or_else(|| SomkitError::Training("no epochs were run".to_string()))?;
    println!("Training complete in {}", HumanDuration(start_time.elapsed()));
    println!("   Epochs: {}", reports.len());
    println!("   Final error: {:.6}", last.mse);
    println!("   Output: {}", output.display());
    Ok(())
}

fn classify(network_path: PathBuf, table_path: PathBuf, output: PathBuf) -> Result<()> {
    let mut network = load_network(&network_path)?;
    let table = Table::load(&table_path)?;
    let (mut set, origins) = load_table_set(&network, &table_path, &table)?;
    apply_input_stats(&network, &mut set)?;

    let row_labels = table.text_column("class")?;
    let mut labels: Vec<String> = Vec::new();
    for label in &row_labels {
        if !labels.contains(label) {
            labels.push(label.clone());
        }
    }
    let classes: Vec<usize> = origins
        .iter()
        .map(|&row| labels.iter().position(|l| *l == row_labels[row]).unwrap_or_default())
        .collect();

    let report = propagate_set(&mut network, &set, true)?;
    let units = network.layer(network.output_layer()?)?.unit_count();
    let matrix = ClassificationMatrix::from_winners(units, labels, &report.winners, &classes)?;
    matrix.write_to(BufWriter::new(File::create(&output)?))?;

    let rate = matrix.error_rate(&report.winners, &classes)?;
    println!("Classification error rate: {:.4}", rate);
    println!("Quantization error: {:.6}", report.mse.unwrap_or_default());
    println!("   Output: {}", output.display());
    Ok(())
}

fn transitions(network_path: PathBuf, table_path: PathBuf, output: PathBuf) -> Result<()> {
    let mut network = load_network(&network_path)?;
    let table = Table::load(&table_path)?;
    let (mut set, origins) = load_table_set(&network, &table_path, &table)?;
    apply_input_stats(&network, &mut set)?;
    let report = propagate_set(&mut network, &set, false)?;

    let units = network.layer(network.output_layer()?)?.unit_count();
    let mut matrix = TransitionMatrix::new(units);
    // Sequences never cross file boundaries.
    let mut start = 0;
    while start < origins.len() {
        let end = origins[start..]
            .iter()
            .position(|&o| o != origins[start])
            .map_or(origins.len(), |n| start + n);
        matrix.add_sequence(&report.winners[start..end])?;
        start = end;
    }
    matrix.write_to(BufWriter::new(File::create(&output)?))?;

    println!("✓ Wrote {}x{} transition matrix to {}", units, units, output.display());
    Ok(())
}

fn show_info(network_path: PathBuf) -> Result<()> {
    let network = load_network(&network_path)?;

    println!("Network: {}", network.name());
    match network.extension() {
        Some(ext) => println!("  Extension: {}", ext.tag()),
        None => println!("  Extension: none"),
    }
    println!("  Layers: {}", network.layer_count());
    println!("  Units: {}", network.unit_count());
    println!("  Connections: {}", network.connection_count());
    for &id in network.layer_ids() {
        let layer = network.layer(id)?;
        println!(
            "  [{}] {:<8} {:<12} {} units",
            layer.index(),
            layer.class(),
            layer.name(),
            layer.unit_count()
        );
    }
    if let Ok(som) = network.som() {
        println!("  Neighborhood: {}", som.neighborhood());
        println!("  Learning rate: {}", som.learning_rate());
        println!("  Metric: {}", som.metric().name());
    }
    let hidden = network
        .layer_ids()
        .iter()
        .filter_map(|&id| network.layer(id).ok())
        .filter(|l| l.class() == LayerClass::Hidden)
        .count();
    if hidden > 0 {
        println!("  Hidden layers: {}", hidden);
    }
    Ok(())
}
