//! Basketball win prediction CLI
//!
//! Standardizes box-score exports into a SQLite feature store and trains a
//! win/loss classifier over a chronological split.

use clap::{Parser, Subcommand};
use hoops::{Config, Result};

#[derive(Parser)]
#[command(name = "hoops")]
#[command(about = "Box-score standardization and leakage-safe win prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Standardize the raw CSV exports and rebuild the store
    Ingest,
    /// Rebuild the store, train every candidate and save the best
    Train {
        /// Override logistic regression epochs
        #[arg(long)]
        lr_epochs: Option<usize>,
        /// Override MLP epochs
        #[arg(long)]
        mlp_epochs: Option<usize>,
        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Score every row of the trained model's dataset view
    Predict,
    /// Head-to-head win probabilities for two teams
    Matchup {
        /// First team (abbreviation or id)
        team_a: String,
        /// Second team (abbreviation or id)
        team_b: String,
        /// Game to score; defaults to the most recent meeting
        #[arg(long)]
        game_id: Option<String>,
    },
    /// Show store and model status
    Status,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config, &config),
        Commands::Ingest => commands::ingest(&config),
        Commands::Train {
            lr_epochs,
            mlp_epochs,
            seed,
        } => commands::train(config, lr_epochs, mlp_epochs, seed),
        Commands::Predict => commands::predict(&config),
        Commands::Matchup {
            team_a,
            team_b,
            game_id,
        } => commands::matchup(&config, &team_a, &team_b, game_id.as_deref()),
        Commands::Status => commands::status(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use hoops::data::{build_standard_tables, Database, TablePaths};
    use hoops::predict::Predictor;
    use hoops::training::{run_training, MetricsReport};
    use std::path::Path;

    pub fn init(config_path: &str, config: &Config) -> Result<()> {
        config.save(config_path)?;
        println!("Created config at {}", config_path);

        std::fs::create_dir_all(&config.data.data_dir)?;
        std::fs::create_dir_all(&config.data.artifacts_dir)?;
        println!(
            "Created {}/ and {}/ directories",
            config.data.data_dir, config.data.artifacts_dir
        );

        println!("\nNext steps:");
        println!(
            "  1. Put {} and {} (optionally {} and {}) in {}/",
            config.data.teams_file,
            config.data.games_file,
            config.data.players_file,
            config.data.player_games_file,
            config.data.data_dir
        );
        println!("  2. Run 'hoops train' to build the store and train the model");
        println!("  3. Run 'hoops matchup AAA BBB' to compare two teams");

        Ok(())
    }

    pub fn ingest(config: &Config) -> Result<()> {
        let paths = TablePaths::from_config(&config.data);
        let tables = build_standard_tables(&paths)?;
        let mut db = Database::open(&config.data.database_path)?;
        let run = db.replace_standard_tables(&tables)?;

        println!("Store rebuilt at {}", config.data.database_path);
        println!("  Teams:        {}", run.team_count);
        println!("  Game rows:    {}", run.game_count);
        if run.has_players {
            println!("  Player games: {}", run.player_game_count);
        } else {
            println!("  Player games: (no player enrichment)");
        }
        println!("  Dataset view: {}", run.dataset_view());

        Ok(())
    }

    pub fn train(
        mut config: Config,
        lr_epochs: Option<usize>,
        mlp_epochs: Option<usize>,
        seed: Option<u64>,
    ) -> Result<()> {
        if let Some(e) = lr_epochs {
            config.training.logistic.epochs = e;
        }
        if let Some(e) = mlp_epochs {
            config.training.mlp.epochs = e;
        }
        if let Some(s) = seed {
            config.training.seed = s;
        }

        let outcome = run_training(&config)?;

        println!("\nTraining Results");
        println!("───────────────────────────────");
        println!("  Dataset:   {}", outcome.dataset_view);
        println!("  Features:  {}", outcome.feature_count);
        println!(
            "  Rows:      train={} val={} test={}",
            outcome.train_rows, outcome.val_rows, outcome.test_rows
        );
        print_report(&outcome.report);
        println!("\n  Selected:  {}", outcome.selected);
        println!("  Val:       {}", outcome.selected_val);
        println!("  Test:      {}", outcome.selected_test);
        println!("\nArtifacts written to {}", outcome.artifacts_dir.display());

        Ok(())
    }

    fn print_report(report: &MetricsReport) {
        println!("\n  {:<24} {:>8}", "Metric", "Value");
        for (key, value) in &report.0 {
            match value {
                Some(v) => println!("  {:<24} {:>8.4}", key, v),
                None => println!("  {:<24} {:>8}", key, "n/a"),
            }
        }
    }

    pub fn predict(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let artifacts = Path::new(&config.data.artifacts_dir);
        let predictor = Predictor::load(artifacts)?;

        let count = predictor.score_all(&db, artifacts)?;
        println!(
            "Scored {} rows from {} with {}",
            count,
            predictor.bundle().dataset_view,
            predictor.bundle().model_name
        );
        println!(
            "Wrote {}",
            artifacts
                .join(hoops::predict::inference::PREDICTIONS_FILE)
                .display()
        );

        Ok(())
    }

    pub fn matchup(config: &Config, team_a: &str, team_b: &str, game_id: Option<&str>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let a = db.find_team(team_a)?;
        let b = db.find_team(team_b)?;
        let predictor = Predictor::load(&config.data.artifacts_dir)?;

        let name = |t: &hoops::data::standardize::Team| {
            t.full_name
                .clone()
                .or_else(|| t.abbreviation.clone())
                .unwrap_or_else(|| t.team_id.to_string())
        };

        let prediction = predictor.matchup(&db, a.team_id, b.team_id, game_id)?;

        println!("\n{} vs {}", name(&a), name(&b));
        println!("───────────────────────────────");
        println!("  Game:       {} ({})", prediction.game_id, prediction.game_date);
        println!(
            "  Raw:        {:.1}% / {:.1}%",
            prediction.raw_a * 100.0,
            prediction.raw_b * 100.0
        );
        println!(
            "  Win prob:   {} {:.1}% | {} {:.1}%",
            name(&a),
            prediction.prob_a * 100.0,
            name(&b),
            prediction.prob_b * 100.0
        );

        let meetings = db.head_to_head_games(a.team_id, b.team_id)?;
        if !meetings.is_empty() {
            let wins = meetings
                .iter()
                .filter(|g| g.wl == Some(hoops::Outcome::Win))
                .count();
            let losses = meetings
                .iter()
                .filter(|g| g.wl == Some(hoops::Outcome::Loss))
                .count();
            println!("\n  Head to head: {}-{} for {}", wins, losses, name(&a));
            for g in meetings.iter().take(5) {
                println!(
                    "    {}  {:<4} {}  {}",
                    g.game_date,
                    if g.is_home { "vs." } else { "@" },
                    name(&b),
                    g.wl.map(|o| o.code()).unwrap_or("-")
                );
            }
        }

        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Store Status");
        println!("───────────────────────────────");
        println!("  Path:         {}", config.data.database_path);
        match &stats.run {
            Some(run) => {
                println!("  Rebuilt at:   {}", run.completed_at);
                println!("  Teams:        {}", run.team_count);
                println!("  Game rows:    {}", run.game_count);
                println!("  Player games: {}", run.player_game_count);
                println!("  Dataset view: {}", run.dataset_view());
            }
            None => println!("  No completed rebuild. Run 'hoops ingest'."),
        }
        if let (Some(earliest), Some(latest)) = (stats.earliest_game, stats.latest_game) {
            println!("  Range:        {} to {}", earliest, latest);
        }
        if !stats.views.is_empty() {
            let views: Vec<&str> = stats.views.iter().map(String::as_str).collect();
            println!("  Views:        {}", views.join(", "));
        }

        let artifacts = Path::new(&config.data.artifacts_dir);
        match Predictor::load(artifacts) {
            Ok(p) => {
                println!("\nModel");
                println!("───────────────────────────────");
                println!("  Name:         {}", p.bundle().model_name);
                println!("  Dataset view: {}", p.bundle().dataset_view);
                println!("  Features:     {}", p.bundle().feature_cols.len());
                let metrics_path = artifacts.join(hoops::training::run::METRICS_FILE);
                if metrics_path.exists() {
                    print_report(&MetricsReport::load(metrics_path)?);
                }
            }
            Err(hoops::HoopsError::NoModel) => println!("\nNo trained model. Run 'hoops train'."),
            Err(e) => return Err(e),
        }

        Ok(())
    }
}
