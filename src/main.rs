fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Headless engine proof against a scripted backend (deterministic).
    // Writes `wizard_smoke_transcript.log` under the log folder and exits 0/1.
    // Usage: --wizard-smoke or --wizard-smoke=<service-slug>
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--wizard-smoke" || a.starts_with("--wizard-smoke="))
    {
        let service = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        finbridge_apply::run_wizard_smoke(service);
        return;
    }

    // File-backed session store proof (deterministic).
    // Writes `persist_smoke_transcript.log` under the log folder and exits 0/1.
    if args.iter().any(|a| a == "--persist-smoke") {
        finbridge_apply::run_persist_smoke();
        return;
    }

    // Print every service's steps, fields, and documents, then exit.
    if args.iter().any(|a| a == "--catalog-audit") {
        finbridge_apply::run_catalog_audit();
        return;
    }

    // Non-interactive TUI smoke mode (for automated checks).
    // Renders a single frame for one service and exits 0.
    // Usage: --tui-smoke or --tui-smoke=<service-slug>
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--tui-smoke" || a.starts_with("--tui-smoke="))
    {
        let target = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        finbridge_apply::run_tui_smoke(target);
        return;
    }

    // Default: the interactive terminal wizard (--tui accepted as an alias).
    finbridge_apply::run_tui();
}
