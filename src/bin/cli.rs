#![cfg(not(tarpaulin_include))]

use personnel_dashboard::config::AppConfig;
use personnel_dashboard::record::{ADD_FAILED_MESSAGE, AppendOutcome, PersonnelForm};
use personnel_dashboard::sheets::SheetsClient;
use personnel_dashboard::state::{Dashboard, DashboardState, LoadStatus};
use personnel_dashboard::view::{filter_by_search, render_personnel_table};

use std::io::{self, Write};
use std::time::Instant;
use tokio::runtime::Runtime;

const COLUMNS: [&str; 5] = ["ID", "Name", "Rank", "Division", "Status"];

fn display(state: &DashboardState) {
    let stats = &state.stats;
    println!(
        "Total: {}  Active: {}  On Deployment: {}  New Recruits: {}",
        stats.total, stats.active, stats.on_deployment, stats.new_recruits
    );
    if let Some(division) = &state.active_division {
        println!("Division: {}", division);
    }
    if let Some(term) = &state.search_term {
        println!("Search: \"{}\"", term);
    }
    println!();

    for column in COLUMNS {
        print!("{:<16}", column);
    }
    println!();
    for row in render_personnel_table(&state.records) {
        for cell in &row.cells {
            print!("{:<16}", cell);
        }
        println!();
    }

    match &state.load_status {
        LoadStatus::Failed(reason) => println!("(could not load personnel: {})", reason),
        LoadStatus::Loaded if state.records.is_empty() => println!("(no personnel records)"),
        _ => {}
    }
}

// A bare `search` is the empty term, which matches everyone.
fn search_term(command: &str) -> Option<&str> {
    if command == "search" {
        Some("")
    } else {
        command.strip_prefix("search ")
    }
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = AppConfig::from_env()?;
    let client = SheetsClient::new(&config.endpoint, config.request_timeout)?;
    log::info!("Reading sheet '{}' from {}", config.sheet, client.endpoint());
    let runtime = Runtime::new()?;
    let dashboard = Dashboard::new();

    let refresh = |dashboard: &Dashboard| {
        let token = dashboard.begin();
        let records = runtime.block_on(client.fetch_rows_or_empty(&config.sheet));
        dashboard.commit_full(token, records, config.division_filter);
    };

    refresh(&dashboard);

    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    let mut show = true;
    loop {
        if show {
            display(&dashboard.snapshot());
        }
        show = true;

        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let mut command = String::new();
        if io::stdin().read_line(&mut command)? == 0 {
            break;
        }
        let command = command.trim_end_matches(['\r', '\n']);
        start_time = Instant::now();

        if command.trim().is_empty() {
            status = String::from("invalid command");
            show = false;
            continue;
        }

        if command == "q" {
            break;
        } else if command == "help" {
            println!("Commands:");
            println!("  q: Quit");
            println!("  refresh: Reload the roster");
            println!("  search [term]: Show members whose name, rank, division or ID contains [term]");
            println!("  division <name>: Select a division");
            println!("  add: Add a member");
            show = false;
            status = String::from("ok");
        } else if command == "refresh" {
            refresh(&dashboard);
            status = String::from("ok");
        } else if let Some(term) = search_term(command) {
            let token = dashboard.begin();
            match runtime.block_on(client.fetch_rows(&config.sheet)) {
                Ok(records) => {
                    dashboard.commit_search(token, term, filter_by_search(&records, term));
                    status = String::from("ok");
                }
                Err(e) => {
                    dashboard.commit_failure(token, &e.to_string());
                    status = String::from("fetch failed");
                }
            }
        } else if let Some(division) = command.strip_prefix("division ") {
            dashboard.select_division(division.trim());
            refresh(&dashboard);
            status = String::from("ok");
        } else if command == "add" {
            let form = PersonnelForm {
                name: prompt("Name")?,
                rank: prompt("Rank")?,
                division: prompt("Division")?,
                discord: prompt("Discord")?,
                roblox_username: prompt("Roblox username")?,
            };
            let entry = match form.validate() {
                Ok(entry) => entry,
                Err(e) => {
                    status = e.to_string();
                    show = false;
                    continue;
                }
            };

            status = match runtime.block_on(client.append_row(&config.sheet, &entry.fields())) {
                Ok(AppendOutcome::Added) => {
                    refresh(&dashboard);
                    AppendOutcome::Added.to_string()
                }
                Ok(rejected) => rejected.to_string(),
                Err(e) => {
                    log::error!("Error adding personnel: {}", e);
                    ADD_FAILED_MESSAGE.to_string()
                }
            };
        } else {
            status = String::from("invalid command");
            show = false;
        }
    }

    Ok(())
}
