pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use freshprice_core::domain::rule::RuleId;

use crate::commands::rule_edit::RuleEdit;

#[derive(Debug, Parser)]
#[command(
    name = "freshprice",
    about = "FreshPrice operator CLI",
    long_about = "Apply migrations, inspect configuration, and run the rule-based pricing engine over inventory datasets.",
    after_help = "Examples:\n  freshprice doctor --json\n  freshprice price --dataset inventory.json\n  freshprice rules --rules rules.json\n  freshprice checkout --dataset inventory.json --cart cart.json\n  freshprice rule disable rule-3"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Validate config and database connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Price every record of a JSON dataset against the rule set")]
    Price {
        #[arg(long, help = "Path to a JSON array of dataset records")]
        dataset: PathBuf,
        #[arg(long, help = "Path to a JSON array of pricing rules (defaults to the built-in set)")]
        rules: Option<PathBuf>,
    },
    #[command(about = "Summarize a JSON dataset")]
    Summary {
        #[arg(long, help = "Path to a JSON array of dataset records")]
        dataset: PathBuf,
    },
    #[command(about = "Print the ordered rule set after priority normalisation")]
    Rules {
        #[arg(long, help = "Path to a JSON array of pricing rules (defaults to the built-in set)")]
        rules: Option<PathBuf>,
    },
    #[command(about = "Check a cart out against the priced dataset and record the sale")]
    Checkout {
        #[arg(long, help = "Path to a JSON array of dataset records")]
        dataset: PathBuf,
        #[arg(long, help = "Path to a JSON array of {productId, quantity} cart lines")]
        cart: PathBuf,
        #[arg(long, help = "Keep the sale in memory instead of writing it to the database")]
        dry_run: bool,
    },
    #[command(about = "List recorded sales, newest first")]
    Sales {
        #[arg(long, default_value_t = commands::sales::DEFAULT_LIMIT, help = "Maximum number of sales to list")]
        limit: u32,
    },
    #[command(about = "Edit the stored pricing rules")]
    Rule {
        #[command(subcommand)]
        action: RuleAction,
        #[arg(long, global = true, help = "Reprice this dataset with the edited rules and report the effect")]
        dataset: Option<PathBuf>,
        #[arg(long, global = true, help = "Edit an in-memory copy of the built-in rules; nothing is saved")]
        dry_run: bool,
    },
}

#[derive(Debug, Subcommand)]
enum RuleAction {
    #[command(about = "Append a rule read from a JSON object at the lowest priority")]
    Add {
        #[arg(long)]
        file: PathBuf,
    },
    #[command(about = "Replace the rule with the same id, keeping its priority")]
    Update {
        #[arg(long)]
        file: PathBuf,
    },
    #[command(about = "Activate a rule")]
    Enable { id: String },
    #[command(about = "Deactivate a rule")]
    Disable { id: String },
    #[command(about = "Delete a rule and renumber the rest")]
    Delete { id: String },
    #[command(about = "Swap the rule at a zero-based position with the one above it")]
    MoveUp { index: usize },
    #[command(about = "Swap the rule at a zero-based position with the one below it")]
    MoveDown { index: usize },
    #[command(about = "Replace the whole stored rule set with a JSON array of rules")]
    Import {
        #[arg(long)]
        rules: PathBuf,
    },
}

impl RuleAction {
    fn into_edit(self) -> RuleEdit {
        match self {
            Self::Add { file } => RuleEdit::Add(file),
            Self::Update { file } => RuleEdit::Update(file),
            Self::Enable { id } => RuleEdit::Enable(RuleId(id)),
            Self::Disable { id } => RuleEdit::Disable(RuleId(id)),
            Self::Delete { id } => RuleEdit::Delete(RuleId(id)),
            Self::MoveUp { index } => RuleEdit::MoveUp(index),
            Self::MoveDown { index } => RuleEdit::MoveDown(index),
            Self::Import { rules } => RuleEdit::Import(rules),
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Price { dataset, rules } => commands::price::run(&dataset, rules.as_deref()),
        Command::Summary { dataset } => commands::summary::run(&dataset),
        Command::Rules { rules } => commands::rules::run(rules.as_deref()),
        Command::Checkout { dataset, cart, dry_run } => {
            commands::checkout::run(&dataset, &cart, dry_run)
        }
        Command::Sales { limit } => commands::sales::run(limit),
        Command::Rule { action, dataset, dry_run } => {
            commands::rule_edit::run(&action.into_edit(), dataset.as_deref(), dry_run)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
