use std::path::Path;

use ranchwatch_gateway::AppState;

/// Print the startup banner with a config and schema summary.
pub fn print_banner(state: &AppState, config_dir: &Path) {
    let version = env!("CARGO_PKG_VERSION");
    let config = &state.config;

    let reports = state.store.schema_reports();
    let added: usize = reports.iter().map(|r| r.added_count()).sum();
    let failed: usize = reports.iter().map(|r| r.failed_count()).sum();
    let schema = match (added, failed) {
        (0, 0) => "up to date".to_string(),
        (added, 0) => format!("{added} column(s) added"),
        (added, failed) => format!("{added} added, {failed} FAILED"),
    };

    let notifications = if state.notifications.is_enabled() {
        "enabled"
    } else {
        "disabled"
    };

    let url = format!("http://{}:{}", config.gateway.host, config.gateway.port);
    let db_path = config.database_path();
    let db_name = db_path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| db_path.display().to_string());
    let dir_display = match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => config_dir.to_string_lossy().replace(&home, "~"),
        _ => config_dir.to_string_lossy().to_string(),
    };

    // Layout
    let width = 70;
    let left_w = 33;
    let right_w = width - left_w - 3; // 3 for "│ " + "│"

    let title = format!("RanchWatch v{version}");
    let title_dashes = width - 2 - title.len() - 5; // 2 for ╭╮, 5 for "─── " + " "
    let top = format!("╭─── {title} {}╮", "─".repeat(title_dashes));
    let bottom = format!("╰{}╯", "─".repeat(width - 2));

    let row = |l: &str, r: &str| format!("│ {:<left_w$}│  {:<right_w$}│", l, r);

    println!("{top}");
    println!("{}", row("", ""));
    println!("{}", row("  Welcome to RanchWatch!", "Gateway"));
    println!("{}", row("", &url));
    println!("{}", row("        (  )", &"─".repeat(right_w - 2)));
    println!("{}", row("       (    )", &format!("Database       {db_name}")));
    println!(
        "{}",
        row("      ( () ) )", &format!("Schema         {schema}"))
    );
    println!(
        "{}",
        row("    ___|  |___", &format!("Notifications  {notifications}"))
    );
    println!("{}", row("  Fire alerts · Livestock", ""));
    println!(
        "{}",
        row(&format!("  {dir_display}"), "Press Ctrl+C to stop")
    );
    println!("{}", row("", ""));
    println!("{bottom}");
}
