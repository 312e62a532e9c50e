//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
#[cfg(feature = "sqlite")]
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::error::FoliovalError;
use crate::domain::ledger::{Transaction, TxKind};
use crate::domain::position::reconstruct;
use crate::domain::price::Resolution;
use crate::domain::range::TimeRange;
use crate::domain::snapshot::{HoldingsSnapshot, take_snapshot};
use crate::domain::timeutil::{format_instant, parse_instant};
use crate::domain::valuation::{price_history, value_series, value_series_between};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::price_port::PricePort;

#[derive(Parser, Debug)]
#[command(name = "folioval", about = "Portfolio valuation and time-series engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Current holdings valued at the latest daily close
    Snapshot {
        #[arg(short, long, default_value = "folioval.ini")]
        config: PathBuf,
    },
    /// Portfolio value over time
    History {
        #[arg(short, long, default_value = "folioval.ini")]
        config: PathBuf,
        /// Preset window: 1D, 1W, 1M, 1Y or MAX
        #[arg(long)]
        range: Option<String>,
        /// Explicit window start (RFC 3339 or YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Explicit window end
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Sampling resolution for an explicit window: H, D, W or M
        #[arg(long)]
        resolution: Option<String>,
    },
    /// Price series for one instrument
    Prices {
        symbol: String,
        #[arg(short, long, default_value = "folioval.ini")]
        config: PathBuf,
        /// Preset window, defaults to MAX
        #[arg(long)]
        range: Option<String>,
    },
    /// Add quantity to a holding
    Add {
        symbol: String,
        quantity: f64,
        #[arg(short, long, default_value = "folioval.ini")]
        config: PathBuf,
        /// Transaction instant, defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// Remove quantity from a holding
    Remove {
        symbol: String,
        quantity: f64,
        #[arg(short, long, default_value = "folioval.ini")]
        config: PathBuf,
        /// Transaction instant, defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// Ledger contents, newest first
    Transactions {
        #[arg(short, long, default_value = "folioval.ini")]
        config: PathBuf,
    },
    /// Instruments known to the price store
    Instruments {
        #[arg(short, long, default_value = "folioval.ini")]
        config: PathBuf,
    },
    /// Copy CSV stores into the configured SQLite database
    Import {
        #[arg(short, long, default_value = "folioval.ini")]
        config: PathBuf,
        /// Price directory to read, overrides [store] data_dir
        #[arg(long)]
        prices: Option<PathBuf>,
        /// Ledger file to read, overrides [store] ledger_path
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
    /// Start the HTTP service
    Serve {
        #[arg(short, long, default_value = "folioval.ini")]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Snapshot { config } => run_snapshot(&config),
        Command::History {
            config,
            range,
            from,
            to,
            resolution,
        } => run_history(
            &config,
            range.as_deref(),
            from.as_deref(),
            to.as_deref(),
            resolution.as_deref(),
        ),
        Command::Prices {
            symbol,
            config,
            range,
        } => run_prices(&config, &symbol, range.as_deref()),
        Command::Add {
            symbol,
            quantity,
            config,
            at,
        } => run_mutate(&config, TxKind::Add, &symbol, quantity, at.as_deref()),
        Command::Remove {
            symbol,
            quantity,
            config,
            at,
        } => run_mutate(&config, TxKind::Remove, &symbol, quantity, at.as_deref()),
        Command::Transactions { config } => run_transactions(&config),
        Command::Instruments { config } => run_instruments(&config),
        Command::Import {
            config,
            prices,
            ledger,
        } => run_import(&config, prices.as_ref(), ledger.as_ref()),
        Command::Serve { config } => run_serve(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = FoliovalError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Ledger and price ports wired up from `[store]` configuration.
pub struct Stores {
    pub ledger: Arc<dyn LedgerPort + Send + Sync>,
    pub prices: Arc<dyn PricePort + Send + Sync>,
}

pub fn build_stores(config: &FileConfigAdapter) -> Result<Stores, FoliovalError> {
    let kind = config
        .get_string("store", "kind")
        .unwrap_or_else(|| "csv".to_string());
    match kind.as_str() {
        "csv" => {
            let ledger_path = config
                .get_string("store", "ledger_path")
                .unwrap_or_else(|| "ledger.csv".to_string());
            let data_dir = config
                .get_string("store", "data_dir")
                .unwrap_or_else(|| "data".to_string());
            Ok(Stores {
                ledger: Arc::new(CsvLedgerAdapter::new(PathBuf::from(ledger_path))),
                prices: Arc::new(CsvPriceAdapter::new(PathBuf::from(data_dir))),
            })
        }
        "sqlite" => build_sqlite_stores(config),
        other => Err(FoliovalError::ConfigInvalid {
            section: "store".to_string(),
            key: "kind".to_string(),
            reason: format!("unknown store kind '{other}'"),
        }),
    }
}

#[cfg(feature = "sqlite")]
fn build_sqlite_stores(config: &FileConfigAdapter) -> Result<Stores, FoliovalError> {
    let adapter = Arc::new(SqliteAdapter::from_config(config)?);
    adapter.initialize_schema()?;
    Ok(Stores {
        ledger: adapter.clone(),
        prices: adapter,
    })
}

#[cfg(not(feature = "sqlite"))]
fn build_sqlite_stores(_config: &FileConfigAdapter) -> Result<Stores, FoliovalError> {
    Err(FoliovalError::ConfigInvalid {
        section: "store".to_string(),
        key: "kind".to_string(),
        reason: "sqlite support is not compiled in".to_string(),
    })
}

fn print_snapshot(snapshot: &HoldingsSnapshot) {
    println!(
        "{:<8} {:>14} {:>12} {:>14}",
        "SYMBOL", "QUANTITY", "PRICE", "VALUE"
    );
    for holding in &snapshot.holdings {
        println!(
            "{:<8} {:>14.4} {:>12.2} {:>14.2}",
            holding.symbol, holding.quantity, holding.price, holding.value
        );
    }
    println!(
        "{:<8} {:>14} {:>12} {:>14.2}",
        "TOTAL", "", "", snapshot.total
    );
}

fn run_snapshot(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let stores = match build_stores(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let ledger = match stores.ledger.read_all() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    match take_snapshot(stores.prices.as_ref(), &ledger, Utc::now()) {
        Ok(snapshot) => {
            print_snapshot(&snapshot);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_history(
    config_path: &PathBuf,
    range: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    resolution: Option<&str>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let stores = match build_stores(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let ledger = match stores.ledger.read_all() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let points = match (from, to) {
        (Some(from), Some(to)) => {
            let start = match parse_instant(from) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };
            let end = match parse_instant(to) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };
            let resolution = match resolution.unwrap_or("D").parse::<Resolution>() {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };
            value_series_between(stores.prices.as_ref(), &ledger, resolution, start, end)
        }
        _ => {
            let range = match range.unwrap_or("1M").parse::<TimeRange>() {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            };
            value_series(stores.prices.as_ref(), &ledger, range, Utc::now())
        }
    };

    match points {
        Ok(points) => {
            for point in &points {
                println!("{} {:.2}", format_instant(point.timestamp), point.value);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_prices(config_path: &PathBuf, symbol: &str, range: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let stores = match build_stores(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let range = match range.unwrap_or("MAX").parse::<TimeRange>() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    match price_history(stores.prices.as_ref(), symbol, range, Utc::now()) {
        Ok(series) => {
            if series.is_empty() {
                eprintln!("No price data for {}", symbol.trim().to_uppercase());
            }
            for point in &series {
                println!("{} {:.2}", format_instant(point.timestamp), point.close);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_mutate(
    config_path: &PathBuf,
    kind: TxKind,
    symbol: &str,
    quantity: f64,
    at: Option<&str>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let stores = match build_stores(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let timestamp = match at {
        Some(raw) => match parse_instant(raw) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
        None => Utc::now(),
    };
    let tx = match Transaction::new(timestamp, kind, symbol, quantity) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let ledger = match stores.ledger.read_all() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if tx.kind == TxKind::Add {
        let known = match stores.prices.list_instruments() {
            Ok(k) => k,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if !known.contains(&tx.symbol) {
            let err = FoliovalError::UnknownInstrument {
                symbol: tx.symbol.clone(),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    }

    if tx.kind == TxKind::Remove {
        let held = reconstruct(&ledger, tx.timestamp).quantity(&tx.symbol);
        if tx.quantity > held {
            eprintln!(
                "warning: removing {} {} with only {} held; holding clamps at zero",
                tx.quantity, tx.symbol, held
            );
        }
    }

    if let Err(e) = stores.ledger.append(&tx) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Recorded {} {} {}", tx.kind, tx.quantity, tx.symbol);

    let ledger = match stores.ledger.read_all() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    match take_snapshot(stores.prices.as_ref(), &ledger, Utc::now()) {
        Ok(snapshot) => {
            print_snapshot(&snapshot);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_transactions(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let stores = match build_stores(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    match stores.ledger.read_all() {
        Ok(mut ledger) => {
            ledger.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            for tx in &ledger {
                println!(
                    "{} {:<6} {:<8} {}",
                    format_instant(tx.timestamp),
                    tx.kind,
                    tx.symbol,
                    tx.quantity
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_instruments(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let stores = match build_stores(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    match stores.prices.list_instruments() {
        Ok(instruments) => {
            if instruments.is_empty() {
                eprintln!("No instruments in the price store");
            } else {
                for symbol in &instruments {
                    println!("{symbol}");
                }
                eprintln!("{} instruments", instruments.len());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_import(
    config_path: &PathBuf,
    prices_dir: Option<&PathBuf>,
    ledger_file: Option<&PathBuf>,
) -> ExitCode {
    #[cfg(feature = "sqlite")]
    {
        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };
        let target = match SqliteAdapter::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if let Err(e) = target.initialize_schema() {
            eprintln!("error: {e}");
            return (&e).into();
        }

        let prices_path = prices_dir.cloned().unwrap_or_else(|| {
            PathBuf::from(
                config
                    .get_string("store", "data_dir")
                    .unwrap_or_else(|| "data".to_string()),
            )
        });
        let source = CsvPriceAdapter::new(prices_path.clone());
        let symbols = match source.list_instruments() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let mut imported = 0usize;
        for symbol in &symbols {
            for resolution in Resolution::ALL {
                let series = match source.get_series(symbol, resolution) {
                    Ok(s) => s,
                    Err(e) => {
                        eprintln!("error: {e}");
                        return (&e).into();
                    }
                };
                if series.is_empty() {
                    continue;
                }
                if let Err(e) = target.insert_points(symbol, resolution, &series) {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
                imported += series.len();
            }
        }
        eprintln!(
            "Imported {} price points for {} instruments from {}",
            imported,
            symbols.len(),
            prices_path.display()
        );

        let ledger_path = ledger_file
            .cloned()
            .or_else(|| config.get_string("store", "ledger_path").map(PathBuf::from));
        if let Some(path) = ledger_path {
            if path.exists() {
                let ledger_source = CsvLedgerAdapter::new(path.clone());
                let transactions = match ledger_source.read_all() {
                    Ok(t) => t,
                    Err(e) => {
                        eprintln!("error: {e}");
                        return (&e).into();
                    }
                };
                if let Err(e) = target.append_all(&transactions) {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
                eprintln!(
                    "Imported {} transactions from {}",
                    transactions.len(),
                    path.display()
                );
            }
        }
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config_path, prices_dir, ledger_file);
        eprintln!("error: sqlite feature is required for import");
        ExitCode::from(1)
    }
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{self, AppState};
        use std::net::SocketAddr;

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };
        let stores = match build_stores(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let bind = config
            .get_string("server", "bind")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let addr: SocketAddr = match bind.parse() {
            Ok(addr) => addr,
            Err(_) => {
                let err = FoliovalError::ConfigInvalid {
                    section: "server".to_string(),
                    key: "bind".to_string(),
                    reason: format!("'{bind}' is not a socket address"),
                };
                eprintln!("error: {err}");
                return (&err).into();
            }
        };

        let default_filter = if config.get_bool("server", "log_requests", true) {
            "info"
        } else {
            "warn"
        };
        web::init_tracing(default_filter);

        let state = AppState {
            ledger: stores.ledger,
            prices: stores.prices,
        };
        let router = web::build_router(state);

        eprintln!("Starting server on {addr}");
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(1);
            }
        };
        let served: std::io::Result<()> = runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!("listening on {addr}");
            axum::serve(listener, router).await
        });
        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(1)
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
