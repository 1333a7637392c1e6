use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, error, info, warn};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, time::Duration};

mod api;
mod config;
mod explorer;
mod filter;
mod model;
mod store;
mod ui;

use api::demo::DemoProvider;
use api::http::ProxyProvider;
use api::provider::{DataProvider, DataSourceStatus};
use config::{Config, OperatingMode};
use explorer::Explorer;
use ui::slider::ThresholdSlider;
use ui::ui::{Action, UIState, ViewContext};

#[derive(Parser)]
#[command(name = "pendle-vault-explorer")]
#[command(about = "Browse Pendle vaults, filter by liquidity and inspect vault details")]
struct Args {
    #[arg(long)]
    generate_config: bool,

    #[arg(short, long)]
    config: Option<String>,

    /// Use synthetic vaults instead of the proxy API
    #[arg(long)]
    demo: bool,

    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        tui_logger::init_logger(log::LevelFilter::Debug)
            .map_err(|e| anyhow::anyhow!("failed to initialise logger: {:?}", e))?;
        tui_logger::set_default_level(log::LevelFilter::Debug);
    }

    if args.generate_config {
        config::generate_sample_config()?;
        println!("✅ Sample configuration generated at {}", config::DEFAULT_CONFIG_FILE);
        return Ok(());
    }

    let mut config = config::load_config(args.config.as_deref())?;
    if args.demo {
        config.operating_mode = OperatingMode::Demo;
    }

    match config.operating_mode {
        OperatingMode::Live => run_live_mode(config).await,
        OperatingMode::Demo => run_demo_mode(config).await,
    }
}

async fn run_live_mode(config: Config) -> Result<()> {
    info!("🚀 Starting live mode against {}", config.api_base);

    let provider = ProxyProvider::new(&config)?;
    match provider.get_status().await {
        DataSourceStatus::Connected => info!("✅ Backend reachable"),
        DataSourceStatus::Disconnected => {
            warn!("⚠️ Backend not reachable yet, the listing will show an error")
        }
        DataSourceStatus::Error(e) => warn!("⚠️ Backend status: {}", e),
    }

    run_explorer(provider, config).await
}

async fn run_demo_mode(config: Config) -> Result<()> {
    info!("🧪 Starting demo mode with synthetic vaults");
    let provider = DemoProvider::new(config.chain_id);
    run_explorer(provider, config).await
}

async fn run_explorer<P: DataProvider + Send + Sync + 'static>(
    provider: P,
    config: Config,
) -> Result<()> {
    let explorer = Explorer::new(provider, config.default_max_liquidity);
    explorer.reload().await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_ui(&mut terminal, &explorer, &config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_ui<P: DataProvider + Send + Sync + 'static>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    explorer: &Explorer<P>,
    config: &Config,
) -> Result<()> {
    let store = explorer.store();
    let source = explorer.provider().describe();
    let slider = ThresholdSlider::new(config.ui_settings.slider_steps);
    let ctx = ViewContext {
        source: &source,
        slider,
        show_debug_info: config.ui_settings.show_debug_info,
    };
    let mut ui_state = UIState::new();

    info!("🎨 Starting UI loop");

    loop {
        let (overlay_open, visible, threshold, max) = {
            let guard = store.read().await;
            let visible = guard.visible();
            ui_state.clamp_cursor(visible.len());
            terminal.draw(|f| ui::ui::draw(f, &ui_state, &guard, &ctx))?;
            (
                guard.selection().is_some(),
                visible,
                guard.threshold(),
                guard.max_liquidity(),
            )
        };

        if !event::poll(Duration::from_millis(config.ui_settings.refresh_rate_ms))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match ui::ui::map_key(key, overlay_open) {
            Action::Quit => {
                info!("👋 User requested quit");
                break;
            }
            Action::Reload => {
                info!("🔄 User requested reload");
                ui_state = UIState::new();
                explorer.reload().await;
            }
            Action::CursorUp => ui_state.cursor_up(),
            Action::CursorDown => ui_state.cursor_down(visible.len()),
            Action::ScrollDetail(delta) => ui_state.scroll_detail(delta),
            Action::NudgeThreshold(steps) => {
                let value = slider.nudge(threshold, max, steps);
                debug!("Threshold {} -> {}", threshold, value);
                explorer.set_threshold(value).await;
            }
            Action::ThresholdMin => explorer.set_threshold(slider.minimum()).await,
            Action::ThresholdMax => explorer.set_threshold(slider.maximum(max)).await,
            Action::Select => {
                // With the overlay open, Enter re-fetches the inspected vault.
                let target = if overlay_open {
                    store.read().await.selection().map(|s| s.key.clone())
                } else {
                    visible.get(ui_state.cursor).map(|v| v.key())
                };
                if let Some(key) = target {
                    ui_state.detail_scroll = 0;
                    explorer.select(key).await;
                }
            }
            Action::Close => {
                ui_state.detail_scroll = 0;
                explorer.deselect().await;
            }
            Action::Help => show_help_screen(terminal, config)?,
            Action::SaveConfig => {
                info!("💾 Saving configuration");
                if let Err(e) = config::save_config_to_file(config, config::DEFAULT_CONFIG_FILE) {
                    error!("❌ Failed to save configuration: {}", e);
                } else {
                    info!("✅ Configuration saved to {}", config::DEFAULT_CONFIG_FILE);
                }
            }
            Action::Ignore => {}
        }
    }

    Ok(())
}

fn show_help_screen(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
) -> Result<()> {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::{Block, Borders, Paragraph},
    };

    terminal.draw(|f| {
        let size = f.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        let mode = match config.operating_mode {
            OperatingMode::Live => "LIVE",
            OperatingMode::Demo => "DEMO",
        };
        let title = Paragraph::new(format!("Help - Pendle Vault Explorer ({})", mode))
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));

        let section = |name: &'static str| {
            Line::from(vec![Span::styled(
                name,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )])
        };

        let help_text = Paragraph::new(vec![
            section("VAULT LIST"),
            Line::from("↑/↓                 - Move between vaults"),
            Line::from("Enter               - Open vault details"),
            Line::from(""),
            section("LIQUIDITY FILTER"),
            Line::from(format!(
                "←/→                 - Lower/raise minimum liquidity by 1/{} of the largest vault",
                config.ui_settings.slider_steps
            )),
            Line::from("PgDn/PgUp           - Lower/raise by ten steps"),
            Line::from("Home/End            - Show all vaults / only the largest"),
            Line::from(""),
            section("DETAIL VIEW"),
            Line::from("↑/↓                 - Scroll"),
            Line::from("Enter               - Retry a failed detail fetch"),
            Line::from("Esc                 - Close"),
            Line::from(""),
            section("CONTROLS"),
            Line::from("R or F5             - Reload the vault listing"),
            Line::from("S                   - Save configuration"),
            Line::from("H or ?              - Show this help"),
            Line::from("Q, Esc or Ctrl+C    - Quit"),
            Line::from(""),
            section("CURRENT SESSION"),
            Line::from(format!("API base: {}", config.api_base)),
            Line::from(format!("Chain: {}", config.chain_id)),
            Line::from(""),
            Line::from("Press any key to return..."),
        ])
        .block(Block::default().borders(Borders::ALL));

        let footer = Paragraph::new("Zero APY or price values are shown as N/A")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));

        f.render_widget(title, chunks[0]);
        f.render_widget(help_text, chunks[1]);
        f.render_widget(footer, chunks[2]);
    })?;

    loop {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    break;
                }
            }
        }
    }

    Ok(())
}
