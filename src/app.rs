use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::coordinator::{self, InputCoordinator, InputEvent};
use crate::filter::FilterState;
use crate::logging;
use crate::output::{self, OutputFormat};
use crate::session::{Document, Session};

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<12}: {}", label, value);
}

fn format_opt_value<'a>(v: Option<&'a str>, default: &'a str) -> &'a str {
    match v {
        Some(v) if !v.trim().is_empty() => v,
        _ => default,
    }
}

fn format_label(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "text",
        OutputFormat::Json => "json",
        OutputFormat::Html => "html",
        OutputFormat::Page => "page",
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    data: PathBuf,
    region: Option<String>,
    category: Option<String>,
    sub_category: Option<String>,
    query: String,
    output: Option<String>,
    format: OutputFormat,
    debounce: Duration,
    interactive: bool,
    list_regions: bool,
    no_color: bool,
    log_level: &'static str,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let data = args
        .data
        .or(cfg.data)
        .map(|p| config::expand_tilde(&p))
        .ok_or_else(|| "a catalog dataset is required (--data or `data:` in the config)".to_string())?;

    let output_path = args.output.or(cfg.output).filter(|o| !o.trim().is_empty());
    let format = match args.format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json, html or page"))?,
        None => output_path
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let debounce_ms = args
        .debounce
        .or(cfg.debounce_ms)
        .unwrap_or(coordinator::DEFAULT_DEBOUNCE.as_millis() as u64);

    Ok(RunConfig {
        data,
        region: args.region.or(cfg.region).filter(|r| !r.trim().is_empty()),
        category: args.category.or(cfg.category),
        sub_category: args.sub_category.or(cfg.sub_category),
        query: args.query.or(cfg.query).unwrap_or_default(),
        output: output_path,
        format,
        debounce: coordinator::debounce_from_millis(debounce_ms),
        interactive: args.interactive,
        list_regions: args.list_regions,
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        log_level: logging::level_for(args.verbose, cfg.log_level.as_deref()),
    })
}

fn initial_state(run: &RunConfig, catalog: &Catalog) -> Result<FilterState, String> {
    let region = match run.region.as_deref() {
        Some(r) => r.to_string(),
        None => catalog
            .default_region()
            .map(str::to_string)
            .ok_or_else(|| "catalog has no regions".to_string())?,
    };
    if !catalog.contains_region(&region) {
        eprintln!(
            "{} unknown region '{}' (known: {}), showing no products",
            "[WRN]".bold().yellow(),
            region,
            catalog.region_ids().collect::<Vec<_>>().join(", ")
        );
    }
    let mut state = FilterState::new(region);
    state.set_category(run.category.clone());
    state.set_sub_category(run.sub_category.clone());
    state.set_query(run.query.clone());
    Ok(state)
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    Input(InputEvent),
    Quit,
}

/// One stdin line of an interactive session. `/region`, `/category` and
/// `/sub` switch selections (a bare `/category` or `/sub` clears it),
/// `/quit` ends the session, anything else is the new search text.
fn parse_command(line: &str) -> Command {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Input(InputEvent::Query(trimmed.to_string()));
    };
    let (name, arg) = match rest.split_once(' ') {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let selection = (!arg.is_empty()).then(|| arg.to_string());
    match name {
        "region" | "r" => Command::Input(InputEvent::Region(arg.to_string())),
        "category" | "cat" | "c" => Command::Input(InputEvent::Category(selection)),
        "sub" | "sub-category" | "s" => Command::Input(InputEvent::SubCategory(selection)),
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Input(InputEvent::Query(trimmed.to_string())),
    }
}

fn write_session<W: Write>(
    out: &mut W,
    session: &Session<'_, Document>,
    region_changed: bool,
) -> std::io::Result<()> {
    let state = session.state();
    let total = session.catalog().products(&state.region).len();
    writeln!(
        out,
        "{} region {} | category {} | sub-category {} | query '{}' :: {} of {}",
        "::".bold().white(),
        state.region.bold().cyan(),
        format_opt_value(state.category.as_deref(), "ALL"),
        format_opt_value(state.sub_category.as_deref(), "ALL"),
        state.query,
        session.matches().len().to_string().bold().green(),
        total
    )?;
    if region_changed {
        let options = session.filter_options();
        writeln!(out, "   categories: {}", options.categories.join(", "))?;
        writeln!(out, "   sub-categories: {}", options.sub_categories.join(", "))?;
    }
    let currency = session.catalog().currency(&state.region);
    let records = output::build_records(&state.region, currency, session.matches());
    out.write_all(&output::render_text(&records))?;
    out.flush()
}

async fn run_interactive(run: &RunConfig, catalog: &Catalog, state: FilterState) -> Result<(), String> {
    let (tx, rx) = mpsc::unbounded_channel::<InputEvent>();

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_command(&line) {
                    Command::Quit => break,
                    Command::Input(event) => {
                        debug!(?event, "input");
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
    });

    let mut session = Session::new(catalog, state, Document::default());
    let input = InputCoordinator::new(session.state().clone(), run.debounce);
    let mut stdout = std::io::stdout();
    let written = match write_session(&mut stdout, &session, true) {
        Ok(()) => coordinator::run(input, rx, |cycle| {
            let region_changed = cycle.region_changed;
            session.apply(cycle);
            write_session(&mut stdout, &session, region_changed)
        })
        .await
        .map(|_| ()),
        Err(e) => Err(e),
    };

    if let Err(e) = written {
        reader.abort();
        return Err(format!("failed to write to stdout: {e}"));
    }
    reader
        .await
        .map_err(|e| format!("stdin reader failed: {e}"))?;
    Ok(())
}

fn run_once(run: &RunConfig, catalog: &Catalog, state: &FilterState) -> Result<(), String> {
    let rendered = output::render(run.format, catalog, state, run.debounce.as_millis() as u64);

    match run.output.as_deref() {
        Some(path) => {
            let path = config::expand_tilde(path);
            std::fs::write(&path, &rendered)
                .map_err(|e| format!("failed to write output file '{}': {e}", path.display()))?;
            format_kv_line("Region", &state.region);
            format_kv_line("Category", format_opt_value(state.category.as_deref(), "ALL"));
            format_kv_line(
                "Sub-category",
                format_opt_value(state.sub_category.as_deref(), "ALL"),
            );
            format_kv_line("Query", format_opt_value(Some(state.query.as_str()), "-"));
            format_kv_line("Format", format_label(run.format));
            format_kv_line("Matches", &state.apply(catalog).len().to_string());
            eprintln!(
                "{} wrote {}",
                ":: Completed ::".bold().green(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&rendered)
                .and_then(|_| stdout.flush())
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
        }
    }
    Ok(())
}

fn run_with(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let catalog = Catalog::load(&run.data).map_err(|e| e.to_string())?;

    if run.list_regions {
        for (id, region) in catalog.regions() {
            println!(
                "{:<8} {:<24} {:>4} products {}",
                id.bold(),
                region.label.as_deref().unwrap_or("-"),
                region.products.len(),
                region.currency.as_deref().unwrap_or("")
            );
        }
        return Ok(());
    }

    let state = initial_state(&run, &catalog)?;

    if run.interactive {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("failed to build runtime: {e}"))?;
        let result = rt.block_on(run_interactive(&run, &catalog, state));
        // a stdin read may still be parked on the blocking pool
        rt.shutdown_background();
        return result;
    }

    run_once(&run, &catalog, &state)
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args.config.as_deref().map(config::expand_tilde);

    if args.init_config {
        let path = user_config_path
            .or_else(config::default_config_path)
            .ok_or_else(|| "cannot locate a home directory for the config file".to_string())?;
        config::ensure_default_config_file(&path)?;
        format_kv_line("Config", &path.display().to_string());
        return Ok(());
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    logging::init(run.log_level)?;
    debug!(?run, "run configuration");

    run_with(run)
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["pricelist"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn cli_overrides_config() {
        let cfg = ConfigFile {
            data: Some("from-config.yml".to_string()),
            region: Some("eu".to_string()),
            debounce_ms: Some(250),
            ..ConfigFile::default()
        };
        let run = build_run_config(args(&["-d", "cli.json", "-g", "us"]), cfg).unwrap();
        assert_eq!(run.data, PathBuf::from("cli.json"));
        assert_eq!(run.region.as_deref(), Some("us"));
        assert_eq!(run.debounce, Duration::from_millis(250));
    }

    #[test]
    fn config_fills_missing_args() {
        let cfg = ConfigFile {
            data: Some("prices.yml".to_string()),
            query: Some("steel".to_string()),
            output_format: Some("json".to_string()),
            ..ConfigFile::default()
        };
        let run = build_run_config(args(&[]), cfg).unwrap();
        assert_eq!(run.query, "steel");
        assert_eq!(run.format, OutputFormat::Json);
        assert_eq!(run.debounce, coordinator::DEFAULT_DEBOUNCE);
    }

    #[test]
    fn dataset_is_required() {
        assert!(build_run_config(args(&[]), ConfigFile::default()).is_err());
    }

    #[test]
    fn format_follows_output_extension() {
        let run = build_run_config(args(&["-d", "a.yml", "-o", "catalog.html"]), ConfigFile::default())
            .unwrap();
        assert_eq!(run.format, OutputFormat::Page);
        let run = build_run_config(args(&["-d", "a.yml"]), ConfigFile::default()).unwrap();
        assert_eq!(run.format, OutputFormat::Text);
    }

    #[test]
    fn debounce_is_clamped() {
        let run = build_run_config(args(&["-d", "a.yml", "--debounce", "20"]), ConfigFile::default())
            .unwrap();
        assert_eq!(run.debounce, Duration::from_millis(150));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn session_output_reports_write_failures() {
        let catalog = Catalog::from_yaml_str(
            "regions:\n  us:\n    currency: USD\n    products:\n      - sku: steel-pole-10\n        main_category: Steel Poles\n",
        )
        .unwrap();
        let session = Session::new(&catalog, FilterState::new("us"), Document::default());

        let err = write_session(&mut ClosedPipe, &session, true).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);

        let mut out = Vec::new();
        write_session(&mut out, &session, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("categories: Steel Poles"));
        assert!(text.contains("steel-pole-10"));
    }

    #[test]
    fn interactive_commands() {
        assert_eq!(
            parse_command("/region eu"),
            Command::Input(InputEvent::Region("eu".to_string()))
        );
        assert_eq!(
            parse_command("/category Steel Poles"),
            Command::Input(InputEvent::Category(Some("Steel Poles".to_string())))
        );
        assert_eq!(
            parse_command("/sub"),
            Command::Input(InputEvent::SubCategory(None))
        );
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(
            parse_command("a.b"),
            Command::Input(InputEvent::Query("a.b".to_string()))
        );
        assert_eq!(
            parse_command("/10 ft"),
            Command::Input(InputEvent::Query("/10 ft".to_string()))
        );
    }
}
