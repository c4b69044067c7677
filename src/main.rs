use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use sql_workbench::{check_batch, Dialect, Outcome};

#[derive(Parser)]
#[command(name = "sql-workbench")]
#[command(author, version, about = "Read-only safety checks for SQL batches")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a SQL batch and print one verdict per statement
    Check {
        /// SQL dialect (sqlite, postgres, mysql, sqlserver)
        #[arg(short, long)]
        dialect: Dialect,

        /// Read the batch from a file instead of the command line
        #[arg(short, long, conflicts_with = "sql")]
        file: Option<PathBuf>,

        /// The SQL text to classify
        sql: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { dialect, file, sql } => {
            let text = match (file, sql) {
                (Some(path), _) => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, Some(sql)) => sql,
                (None, None) => bail!("provide SQL text or --file"),
            };

            let report = check_batch(&text, dialect, None);
            if report.statements.is_empty() {
                println!("no statements found");
                return Ok(());
            }

            for (statement, verdict) in report.statements.iter().zip(&report.verdicts) {
                let label = match verdict.outcome {
                    Outcome::Allow => "ALLOW".to_string(),
                    Outcome::Deny(reason) => format!("DENY [{}]", reason.as_str()),
                };
                println!(
                    "statement {} ({}): {}: {}",
                    verdict.statement_index + 1,
                    statement.kind.as_str(),
                    label,
                    verdict.explanation
                );
            }

            report.ensure_allowed()?;
        }
    }

    Ok(())
}
