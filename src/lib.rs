// FinBridge Application Portal
// Main library entry point

mod api;
mod forms;
mod models;
mod session;
mod smoke;
mod tui;
mod utils;

use log::{error, info};

/// Initialize logging system with dual format (JSON + human-readable)
fn init_logging(with_stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = utils::path_resolver::resolve_log_folder()?;
    std::fs::create_dir_all(&log_dir)?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");

    // JSON log file for structured parsing
    let json_log_file = log_dir.join(format!("finbridge-{}.log", timestamp));

    // Human-readable log file (.txt)
    let txt_log_file = log_dir.join(format!("finbridge-{}.txt", timestamp));

    // Configure dual-format logging:
    // - JSON format to .log file
    // - Human-readable format to .txt file
    // - Optional: human-readable to stdout (disabled for TUI to avoid corrupting the terminal UI)
    let mut dispatch = fern::Dispatch::new().level(log::LevelFilter::Debug);

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", json_line));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", txt_line));
                })
                .chain(fern::log_file(txt_log_file)?),
        );

    dispatch.apply()?;

    log::info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(())
}

/// Interactive terminal wizard (the default mode).
pub fn run_tui() {
    // Initialize logging (no stdout to avoid corrupting the TUI)
    if let Err(e) = init_logging(false) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] FinBridge application TUI starting at {}",
        chrono::Utc::now()
    );

    let settings = match utils::settings::Settings::load() {
        Ok(s) => s,
        Err(e) => {
            error!(
                "[PHASE: initialization] [STEP: settings] Falling back to default settings: {:#}",
                e
            );
            eprintln!("Failed to load settings ({}); using defaults", e);
            utils::settings::Settings::default()
        }
    };
    info!(
        "[PHASE: initialization] [STEP: settings] API base {}",
        settings.api_base_url
    );

    if let Err(e) = tui::run(&settings) {
        error!("[PHASE: tui] [STEP: fatal] TUI exited with error: {:?}", e);
        eprintln!("FinBridge error: {}", e);
    }
}

/// Non-interactive TUI smoke mode (for automated checks).
/// Renders a single frame into an in-memory backend, verifies its content,
/// and exits 0/1.
pub fn run_tui_smoke(target: Option<String>) {
    // The frame goes to a TestBackend, never the real terminal, so stdout
    // mirroring is safe here when settings enable it.
    let with_stdout = utils::settings::Settings::load()
        .map(|s| s.log_to_stdout)
        .unwrap_or(false);
    if let Err(e) = init_logging(with_stdout) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] TUI smoke starting at {}",
        chrono::Utc::now()
    );

    let target = target.as_deref().unwrap_or("short-term-loan");
    if let Err(e) = tui::smoke(target) {
        error!(
            "[PHASE: tui] [STEP: smoke] TUI smoke exited with error: {:?}",
            e
        );
        eprintln!("FinBridge error: {}", e);
        std::process::exit(1);
    }
}

/// Headless engine proof against a scripted backend (for automated
/// verification / log capture). Writes `wizard_smoke_transcript.log` under
/// the log folder and exits 0/1.
pub fn run_wizard_smoke(service: Option<String>) {
    if let Err(e) = init_logging(true) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] Wizard contract smoke starting at {}",
        chrono::Utc::now()
    );

    let service = service
        .as_deref()
        .and_then(forms::catalog::Service::from_slug)
        .unwrap_or(forms::catalog::Service::ShortTermLoan);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();
    let result = match rt {
        Ok(rt) => rt.block_on(smoke::wizard_contract_smoke(service)),
        Err(e) => Err(anyhow::anyhow!(
            "Failed to create async runtime for wizard smoke: {}",
            e
        )),
    };

    if let Err(e) = result {
        error!(
            "[PHASE: wizard] [STEP: smoke] Wizard smoke exited with error: {:?}",
            e
        );
        eprintln!("FinBridge error: {}", e);
        std::process::exit(1);
    }
}

/// File-backed session store proof (for automated verification / log
/// capture). Writes `persist_smoke_transcript.log` under the log folder and
/// exits 0/1.
pub fn run_persist_smoke() {
    if let Err(e) = init_logging(true) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] Persist smoke starting at {}",
        chrono::Utc::now()
    );

    if let Err(e) = smoke::persist_smoke() {
        error!(
            "[PHASE: session] [STEP: persist] Persist smoke exited with error: {:?}",
            e
        );
        eprintln!("FinBridge error: {}", e);
        std::process::exit(1);
    }
}

/// Print the contract surface of every service in the catalog.
pub fn run_catalog_audit() {
    // Keep stdout clean for the listing; logs still go to files
    if let Err(e) = init_logging(false) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] Catalog audit starting at {}",
        chrono::Utc::now()
    );

    smoke::catalog_audit();
}
