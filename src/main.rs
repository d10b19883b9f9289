// Entry point and high-level CLI flow.
//
// - Option [1] loads the bookings, exceptions and revenue CSVs.
// - Option [2] builds every dashboard view, exports them and prints previews.
// - Option [3] fetches (or reuses) the market insight for one country.
// - Option [4] clears the session's insight cache.
mod aggregate;
mod cache;
mod config;
mod error;
mod insights;
mod loader;
mod metrics;
mod normalize;
mod output;
mod prompt;
mod provider;
mod synthetic;
mod types;
mod util;

use cache::{SessionCache, SessionStorage};
use config::AppConfig;
use insights::{InsightService, InsightSource};
use once_cell::sync::Lazy;
use provider::{GeminiProvider, TextProvider};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use types::Dataset;

// Raw records for the current session. A new load replaces everything.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Arc<Dataset>>,
}

fn current_data() -> Option<Arc<Dataset>> {
    let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    state.data.clone()
}

/// Print `prompt` and read one trimmed line. `None` once stdin is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn handle_load(config: &AppConfig) {
    let (b, e, r) = (
        config.bookings_path(),
        config.exceptions_path(),
        config.revenue_path(),
    );
    match loader::load_dataset(&b, &e, &r) {
        Ok((data, report)) => {
            info!(
                bookings = report.booking_rows,
                exceptions = report.exception_rows,
                revenue = report.revenue_rows,
                "dataset loaded"
            );
            println!(
                "Loaded {} booking rows, {} exception rows, {} revenue rows.",
                util::format_int(report.booking_rows as i64),
                util::format_int(report.exception_rows as i64),
                util::format_int(report.revenue_rows as i64)
            );
            if report.parse_errors > 0 {
                println!(
                    "Note: {} rows skipped because they could not be decoded.",
                    util::format_int(report.parse_errors as i64)
                );
            }
            println!();
            let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
            state.data = Some(Arc::new(data));
        }
        Err(err) => {
            error!(error = %err, "dataset load failed");
            eprintln!("Failed to load files: {}\n", err);
        }
    }
}

fn handle_dashboard(config: &AppConfig) {
    let Some(data) = current_data() else {
        println!("Error: No data loaded. Please load the files first (option 1).\n");
        return;
    };

    let snapshot = metrics::build_snapshot(&data);
    info!(
        countries = snapshot.metrics.active_countries,
        months = snapshot.revenue_by_month.len(),
        "dashboard generated"
    );

    let m = &snapshot.metrics;
    println!("Dashboard Metrics");
    println!("  Total Revenue (EUR):      {}", util::format_int(m.total_revenue));
    println!("  Total Bookings:           {}", util::format_int(m.total_bookings));
    println!(
        "  Average Exception Rate:   {}%",
        util::format_number(m.average_exception_rate, 2)
    );
    println!("  Active Countries:         {}\n", m.active_countries);

    println!("Top Countries by Bookings (Top 15)\n");
    output::preview_table_rows(&snapshot.bookings_by_country, 5);

    println!("Revenue by Month\n");
    output::preview_table_rows(&snapshot.revenue_by_month, 6);

    println!("Exception Rate by Country (Top 15)\n");
    output::preview_table_rows(&snapshot.exception_rate_by_country, 5);

    match output::write_dashboard(&config.output_dir, &snapshot) {
        Ok(files) => println!(
            "({} files exported to {})\n",
            files.len(),
            config.output_dir.display()
        ),
        Err(e) => {
            error!(error = %e, "dashboard export failed");
            eprintln!("Write error: {}\n", e);
        }
    }
}

async fn handle_insight(service: &InsightService) {
    let country = read_line("Country name: ").unwrap_or_default();
    if country.is_empty() {
        println!("No country entered.\n");
        return;
    }
    let context = current_data()
        .map(|data| metrics::market_context(&country, &data.bookings, &data.revenue))
        .unwrap_or_default();

    let (insights, source) = service
        .country_insights_or_fallback(&country, &context)
        .await;
    println!();
    output::print_insights(&insights);
    match source {
        InsightSource::Cache => println!("(served from session cache)\n"),
        InsightSource::Provider => println!("(generated by the live model)\n"),
        InsightSource::Synthetic => println!("(estimated: live insight unavailable)\n"),
    }
}

fn build_insight_service(config: &AppConfig) -> InsightService {
    let storage = match config.cache_quota_bytes {
        Some(quota) => SessionStorage::with_quota(quota),
        None => SessionStorage::new(),
    };
    let cache = Arc::new(SessionCache::new(Arc::new(storage), config.cache_prefix.clone()));
    let provider = config.gemini_api_key.as_ref().map(|key| {
        Arc::new(GeminiProvider::new(key.clone(), config.gemini_base_url.clone()))
            as Arc<dyn TextProvider>
    });
    InsightService::new(cache, provider, config.gemini_models.clone())
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let config = AppConfig::from_env();
    let service = build_insight_service(&config);
    if !service.has_provider() {
        info!("GEMINI_API_KEY not set, market insights will be estimated");
    }

    loop {
        println!("Operations Dashboard");
        println!("[1] Load the files");
        println!("[2] Generate Dashboard");
        println!("[3] Country Market Insight");
        println!("[4] Clear Insight Cache");
        println!("[5] Exit\n");
        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&config),
            "2" => {
                println!();
                handle_dashboard(&config);
            }
            "3" => handle_insight(&service).await,
            "4" => {
                let cleared = service.cached_keys().len();
                service.clear_cache();
                println!("Cleared {} cached insight(s).\n", cleared);
            }
            "5" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1-5.\n"),
        }
    }
}
