//! fieldcalc CLI - formula validation, translation and evaluation

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use fieldcalc::prelude::*;
use fieldcalc::FunctionCategory;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fieldcalc")]
#[command(author, version, about = "Formula validation, translation and evaluation tool")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a formula against the field catalog
    Validate {
        /// Formula written with display names
        formula: String,

        /// Field catalog JSON: [{"displayName", "sourceName", "type"}]
        #[arg(short, long)]
        fields: Option<PathBuf>,
    },

    /// Translate field names between display and source names
    Translate {
        formula: String,

        /// Field catalog JSON
        #[arg(short, long)]
        fields: Option<PathBuf>,

        /// Translate source names to display names instead
        #[arg(long)]
        to_display: bool,
    },

    /// Evaluate a formula
    Eval {
        formula: String,

        /// Bindings JSON: an object, or an array of objects to evaluate per row
        #[arg(long)]
        vars: Option<PathBuf>,

        /// Field catalog JSON
        #[arg(short, long)]
        fields: Option<PathBuf>,

        /// Bindings are keyed by source names
        #[arg(short, long)]
        source: bool,

        /// Skip arguments that cannot affect IF/AND/OR results
        #[arg(long)]
        short_circuit: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in functions
    Functions {
        /// Only this category (arithmetic, logical, comparison, text, date)
        #[arg(short, long)]
        category: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Validate { formula, fields } => validate(&formula, fields.as_deref()),
        Commands::Translate {
            formula,
            fields,
            to_display,
        } => translate(&formula, fields.as_deref(), to_display),
        Commands::Eval {
            formula,
            vars,
            fields,
            source,
            short_circuit,
            json,
        } => eval(
            &formula,
            vars.as_deref(),
            fields.as_deref(),
            source,
            short_circuit,
            json,
        ),
        Commands::Functions { category } => list_functions(category.as_deref()),
    }
}

fn validate(formula: &str, fields: Option<&Path>) -> Result<()> {
    let session = FormulaSession::new(load_catalog(fields)?);
    let result = session
        .validate_and_translate(formula)
        .map_err(|e| anyhow!(session.render_error(&e.into())))?;

    println!("Function:   {}", result.function);
    println!("Arguments:  {}", result.arguments.join(" | "));
    println!("Result:     {}", result.result_type);
    println!("Variables:  {}", result.variables.join(", "));
    println!("Translated: {}", result.translated);
    Ok(())
}

fn translate(formula: &str, fields: Option<&Path>, to_display: bool) -> Result<()> {
    let session = FormulaSession::new(load_catalog(fields)?);
    let translated = if to_display {
        session.to_display(formula)
    } else {
        session.to_source(formula)
    };
    println!("{}", translated);
    Ok(())
}

fn eval(
    formula: &str,
    vars: Option<&Path>,
    fields: Option<&Path>,
    source: bool,
    short_circuit: bool,
    json: bool,
) -> Result<()> {
    let mut options = EngineOptions::default();
    options.eval.short_circuit = short_circuit;
    let session = FormulaSession::new(load_catalog(fields)?).with_options(options);

    let bindings = match vars {
        Some(path) => read_json(path)?,
        None => serde_json::Value::Object(Default::default()),
    };

    match bindings {
        serde_json::Value::Array(rows) => {
            let rows: Vec<HashMap<String, Value>> = rows
                .into_iter()
                .map(serde_json::from_value)
                .collect::<std::result::Result<_, _>>()
                .context("Bindings rows must be JSON objects")?;

            let prepared = session
                .prepare(formula)
                .map_err(|e| anyhow!(session.render_error(&e.into())))?;
            let (results, stats) = prepared.evaluate_rows(&rows);

            for (i, result) in results.iter().enumerate() {
                match result {
                    Ok(value) => println!("{}\t{}", i, render(value, json)?),
                    Err(e) => println!("{}\t{}", i, session.render_error(e)),
                }
            }
            eprintln!(
                "Evaluated {} rows ({} succeeded, {} failed)",
                stats.rows, stats.succeeded, stats.failed
            );
            if stats.failed > 0 {
                return Err(anyhow!("{} of {} rows failed", stats.failed, stats.rows));
            }
        }
        other => {
            let bindings: HashMap<String, Value> =
                serde_json::from_value(other).context("Bindings must be a JSON object")?;
            debug!("{} bindings loaded", bindings.len());

            let result = if source {
                session.evaluate_source(formula, &bindings)
            } else {
                session.evaluate(formula, &bindings)
            };
            let value = result.map_err(|e| anyhow!(session.render_error(&e)))?;
            println!("{}", render(&value, json)?);
        }
    }

    Ok(())
}

fn list_functions(category: Option<&str>) -> Result<()> {
    let filter: Option<FunctionCategory> = category
        .map(str::parse)
        .transpose()
        .map_err(|e: String| anyhow!(e))?;

    for (group, defs) in fieldcalc::default_registry().by_category() {
        if filter.map_or(false, |wanted| wanted != group) {
            continue;
        }

        println!("{} ({})", group.label(), group);
        for def in defs {
            println!("  {:<12} {:<10} {}", def.name, def.arity_label(), def.description);
            println!("  {:<12} {}", "", def.syntax);
            println!("  {:<12} e.g. {}", "", def.example);
        }
        println!();
    }
    Ok(())
}

fn render(value: &Value, json: bool) -> Result<String> {
    if json {
        serde_json::to_string(value).context("Failed to serialize result")
    } else {
        Ok(value.to_string())
    }
}

fn load_catalog(path: Option<&Path>) -> Result<FieldCatalog> {
    let Some(path) = path else {
        return Ok(demo_catalog()?);
    };
    let fields: Vec<FieldDescriptor> = serde_json::from_value(read_json(path)?)
        .with_context(|| format!("Invalid field catalog in '{}'", path.display()))?;
    FieldCatalog::from_fields(fields)
        .with_context(|| format!("Invalid field catalog in '{}'", path.display()))
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Fields used when no catalog is given
fn demo_catalog() -> fieldcalc::Result<FieldCatalog> {
    FieldCatalog::from_fields([
        FieldDescriptor::new("名字", "name", FieldType::Text),
        FieldDescriptor::new("性别", "gender", FieldType::Text),
        FieldDescriptor::new("年龄", "age", FieldType::Number),
        FieldDescriptor::new("职业", "occupation", FieldType::Text),
        FieldDescriptor::new("数值", "count", FieldType::Number),
        FieldDescriptor::new("创建时间", "createTime", FieldType::DateTime),
        FieldDescriptor::new("更新时间", "updateTime", FieldType::DateTime),
    ])
}
