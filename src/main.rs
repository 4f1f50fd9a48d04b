use std::fs::File;
use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tokio::sync::mpsc;

use tracklify_feed::{
    ContentHeuristic, FeedEvent, FeedOptions, LiveFeedController, SeverityPolicy, parse_payload,
};
use tracklify_store::{
    AgentSimulator, AnomalyStore, DeviceRegistry, MemoryFeed, SessionStore, SimulatorConfig,
    flag_record,
};
use tracklify_tui::{
    Action, AppState, DeviceSelectScreen, Event, EventHandler, FeedSnapshot, HelpOverlay,
    KeyBindings, KeyContext, LiveFeedScreen, Screen, Tui,
};
use tracklify_types::FilterCriteria;

mod config;

use config::Config;

/// Tracklify - a terminal dashboard for live keystroke monitoring
#[derive(Parser, Debug)]
#[command(name = "tracklify")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Feed window capacity (overrides the config file)
    #[arg(long)]
    capacity: Option<usize>,

    /// Backing collection name
    #[arg(long, default_value = "keystroke_logs")]
    collection: String,

    /// Start with this device filter applied
    #[arg(long)]
    device: Option<String>,

    /// Principal to scope the feed to (defaults to the saved session)
    #[arg(long)]
    principal: Option<String>,

    /// Leave the collection unprovisioned to exercise the sample dataset
    #[arg(long)]
    demo: bool,

    /// Disable the built-in agent simulator
    #[arg(long)]
    no_simulator: bool,

    /// Number of simulated devices
    #[arg(long, default_value = "3")]
    sim_devices: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run_app(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Resolve the principal: explicit flag, then the saved session, then the
/// demo fallback
fn resolve_principal(args: &Args) -> String {
    if let Some(principal) = &args.principal {
        return principal.clone();
    }
    if let Some(store) = SessionStore::open_default() {
        if let Some(principal) = store.current_principal(Utc::now()) {
            return principal;
        }
    }
    "demo-user".to_string()
}

async fn run_app(args: Args) -> Result<()> {
    let config = Config::load();
    let capacity = args.capacity.unwrap_or(config.capacity);
    let principal = resolve_principal(&args);

    // Action and feed channels
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (feed_tx, mut feed_rx) = mpsc::unbounded_channel::<FeedEvent>();

    // Backing feed. In demo mode the collection is left unprovisioned so the
    // controller falls back to the sample dataset.
    let feed = MemoryFeed::new();
    if !args.demo {
        feed.provision(&args.collection);
    }

    let mut simulator = if args.demo || args.no_simulator {
        None
    } else {
        let devices = (1..=args.sim_devices.max(1))
            .map(|i| format!("WS-SIM-{:02}", i))
            .collect();
        Some(AgentSimulator::spawn(
            feed.clone(),
            &args.collection,
            SimulatorConfig {
                devices,
                principal: Some(principal.clone()),
                interval: Duration::from_millis(config.simulate_interval_ms),
                ..SimulatorConfig::default()
            },
        ))
    };

    let policy = ContentHeuristic::with_markers(config.secret_markers.clone());
    let mut controller = LiveFeedController::new(
        feed.clone(),
        &args.collection,
        FeedOptions {
            capacity,
            device_id: args.device.clone(),
            since: None,
        },
    )
    .with_policy(Box::new(policy.clone()));

    controller
        .initialize(Some(principal.clone()), feed_tx.clone())
        .await?;

    let registry = DeviceRegistry::new();
    let anomalies = AnomalyStore::new();

    // Seed the registry from the initial window
    for record in controller.query(&FilterCriteria::default()) {
        registry.observe(&record.device_id, record.created_at);
    }

    // Initialize state
    let mut state = AppState::new(action_tx.clone());
    state.devices = registry.list();
    if let Some(device) = &args.device {
        state.selected_device = Some(device.clone());
        state.screen_stack.push(Screen::DeviceSelect);
        state.current_screen = Screen::LiveFeed;
    }

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let keybindings = KeyBindings::new();

    render(&mut tui, &mut state, &controller, &anomalies)?;

    // Main event loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        if state.ui_state.search_active && state.current_screen == Screen::LiveFeed {
                            if let Some(action) = keybindings.get_search_input_action(&key) {
                                let _ = action_tx.send(action);
                            }
                        } else {
                            let context = match state.current_screen {
                                Screen::DeviceSelect => KeyContext::ListNavigation,
                                Screen::LiveFeed => KeyContext::LiveFeed,
                            };

                            if let Some(action) = keybindings.get_action(context, &key) {
                                let _ = action_tx.send(action);
                            }
                        }
                    }
                    Event::Tick => {
                        registry.refresh_states(Utc::now());
                        state.devices = registry.list();
                    }
                    Event::Resize(_, _) => {
                        let _ = action_tx.send(Action::Render);
                    }
                    Event::Error(e) => {
                        state.show_error(e);
                    }
                }
            }

            Some(event) = feed_rx.recv() => {
                if let FeedEvent::Insert(payload) = &event {
                    if let Ok(mut record) = parse_payload(payload) {
                        registry.observe(&record.device_id, record.created_at);
                        if record.severity.is_none() {
                            record.severity = Some(policy.classify(&record));
                        }
                        if let Some(anomaly) = flag_record(&record) {
                            anomalies.record(anomaly);
                        }
                    }
                }
                controller.handle_event(event, Instant::now());
            }

            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &mut controller, action);
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state, &controller, &anomalies)?;
    }

    // Cleanup
    controller.dispose();
    if let Some(sim) = simulator.as_mut() {
        sim.stop();
    }
    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn handle_action(
    state: &mut AppState,
    controller: &mut LiveFeedController<MemoryFeed>,
    action: Action,
) {
    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::GoBack => {
            if state.ui_state.help_visible {
                state.ui_state.help_visible = false;
            } else if state.ui_state.error_message.is_some() {
                state.dismiss_error();
            } else if !state.go_back() {
                state.should_quit = true;
            }
        }

        Action::ListUp => state.list_up(),
        Action::ListDown => state.list_down(),
        Action::ListSelect => state.select_current_device(),

        Action::ScrollUp(n) => state.scroll_up(n),
        Action::ScrollDown(n) => state.scroll_down(n),
        Action::PageUp => state.scroll_up(20),
        Action::PageDown => state.scroll_down(20),
        Action::ScrollToTop => state.scroll_to_top(),
        Action::ScrollToBottom => state.scroll_to_bottom(),
        Action::ToggleFollow => state.toggle_follow(),

        Action::OpenSearch => state.start_search(),
        Action::CloseSearch => state.cancel_search(),
        Action::SearchInput(c) => state.search_input_char(c),
        Action::SearchBackspace => state.search_input_backspace(),
        Action::SearchClear => {
            state.ui_state.search_input.clear();
        }
        Action::ApplyFilter => state.apply_filter(),
        Action::ClearFilter => state.clear_filter(),

        Action::CycleTimeRange => state.cycle_time_range(),
        Action::CycleTimeRangeBack => state.cycle_time_range_back(),
        Action::CycleSeverity => state.cycle_severity(),

        Action::ExportLogs => {
            let criteria = state.criteria(Utc::now());
            let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
            let filename = format!("tracklify_{}.csv", timestamp);

            match export_csv_to_file(&filename, controller, &criteria) {
                Ok(count) => {
                    state.show_notice(format!("Exported {} records to {}", count, filename));
                }
                Err(e) => {
                    state.show_error(format!("Export failed: {}", e));
                }
            }
        }

        Action::ShowError(msg) => state.show_error(msg),
        Action::DismissError => state.dismiss_error(),
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
            state.render_dirty = true;
        }

        Action::Tick | Action::Render => {
            state.render_dirty = true;
        }
    }
}

fn render(
    tui: &mut Tui,
    state: &mut AppState,
    controller: &LiveFeedController<MemoryFeed>,
    anomalies: &AnomalyStore,
) -> Result<()> {
    let snapshot = snapshot(state, controller, anomalies);

    tui.terminal().draw(|frame| {
        match state.current_screen {
            Screen::DeviceSelect => {
                DeviceSelectScreen::render(frame, state);
            }
            Screen::LiveFeed => {
                LiveFeedScreen::render(frame, state, &snapshot);
            }
        }

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    state.render_dirty = false;
    Ok(())
}

/// Assemble the render-ready feed view from the controller
fn snapshot(
    state: &AppState,
    controller: &LiveFeedController<MemoryFeed>,
    anomalies: &AnomalyStore,
) -> FeedSnapshot {
    let criteria = state.criteria(Utc::now());
    let records = controller.query(&criteria);
    let now = Instant::now();
    let fresh_ids = records
        .iter()
        .filter(|r| controller.is_fresh(&r.id, now))
        .map(|r| r.id.clone())
        .collect();

    FeedSnapshot {
        records,
        fresh_ids,
        connection: controller.connection().clone(),
        using_sample_data: controller.using_sample_data(),
        last_error: controller.last_error().map(str::to_string),
        window_len: controller.len(),
        capacity: controller.capacity(),
        unresolved_anomalies: anomalies.unresolved_count(),
    }
}

fn export_csv_to_file(
    filename: &str,
    controller: &LiveFeedController<MemoryFeed>,
    criteria: &FilterCriteria,
) -> Result<usize> {
    let records = controller.query(criteria);
    let csv = controller.export_csv(criteria)?;

    let mut file = File::create(filename)?;
    file.write_all(csv.as_bytes())?;

    Ok(records.len())
}
