use anyhow::{Context, Result, anyhow};
use clap::Parser;
use grid_nav_core::{
    Agent, Coordinate, Direction, NoPath, Path, Pathfinder, World,
    render::{self, AGENT, PATH},
    world::{GOAL, START, WALL},
};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Map file to load: '.' open, '#' wall, 'S' start, 'G' goal
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,
    /// Rows of the generated world when no map is given
    #[arg(long, default_value_t = 12)]
    rows: usize,
    /// Columns of the generated world when no map is given
    #[arg(long, default_value_t = 32)]
    cols: usize,
    /// Chance that a generated cell becomes a wall
    #[arg(long, default_value_t = 0.25, value_parser = parse_density)]
    density: f64,
    /// Seed for world generation (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Milliseconds between agent steps
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,
    /// Write logs to this file; the terminal itself is owned by the UI
    #[arg(long, value_name = "LOG_FILE")]
    log: Option<PathBuf>,
}

fn parse_density(s: &str) -> Result<f64, String> {
    let density: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&density) {
        Ok(density)
    } else {
        Err(format!("{density} is not in 0.0..=1.0"))
    }
}

struct App {
    world: World,
    start: Coordinate,
    /// Outcome of the search, computed once at startup.
    route: Result<Path, NoPath>,
    expanded: usize,
    /// Moves along `route`, and how many have been taken.
    moves: Vec<Direction>,
    taken: usize,
    agent_at: Coordinate,
    last_move: Option<(Direction, bool)>,
    paused: bool,
    should_quit: bool,
}

impl App {
    fn new(world: World) -> Result<Self> {
        let start = world.start().ok_or_else(|| anyhow!("World has no start ('S')"))?;
        let goal = world.goal().ok_or_else(|| anyhow!("World has no goal ('G')"))?;
        let agent_at = Agent::new(&world, Some(start))?.at();

        let mut pathfinder = Pathfinder::new();
        let route = pathfinder.find_path(&world, start, goal);
        let expanded = pathfinder.expanded();
        match &route {
            Ok(path) => info!(steps = path.steps(), expanded, %path, "path found"),
            Err(reason) => warn!(%reason, expanded, "no path found"),
        }
        let moves = route.as_ref().map(Path::directions).unwrap_or_default();

        Ok(App {
            world,
            start,
            route,
            expanded,
            moves,
            taken: 0,
            agent_at,
            last_move: None,
            paused: false,
            should_quit: false,
        })
    }

    fn arrived(&self) -> bool {
        self.world.is_goal(self.agent_at)
    }

    /// Advances the agent one cell along the route.
    fn tick(&mut self) {
        if self.paused || self.arrived() {
            return;
        }
        let Some(&direction) = self.moves.get(self.taken) else {
            return;
        };
        let Ok(mut agent) = Agent::new(&self.world, Some(self.agent_at)) else {
            return;
        };
        let moved = agent.step(direction);
        self.last_move = Some((direction, moved));
        if moved {
            self.taken += 1;
            self.agent_at = agent.at();
            if self.arrived() {
                info!(steps = self.taken, "goal reached");
            }
        } else {
            warn!(at = %self.agent_at, %direction, "route step rejected, pausing");
            self.paused = true;
        }
    }

    /// Teleports the agent back to the start and rewinds the route.
    fn reset(&mut self) {
        self.agent_at = self.start;
        self.taken = 0;
        self.last_move = None;
        info!(at = %self.agent_at, "agent reset");
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(log_file) = &args.log {
        init_logging(log_file)?;
    }

    let world = load_world(&args)?;
    let mut app = App::new(world)?;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));
    restore_terminal(&mut terminal)?;

    result
}

/// Sends `tracing` output to `log_file`. `RUST_LOG` overrides the default filter.
fn init_logging(log_file: &std::path::Path) -> Result<()> {
    let file = File::create(log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("grid_nav_core=debug,grid_nav_tui=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Reads the map file if one was given, otherwise generates a world with the
/// start and goal in opposite corners.
fn load_world(args: &Args) -> Result<World> {
    if let Some(map_file) = &args.map {
        let text = std::fs::read_to_string(map_file)
            .with_context(|| format!("Failed to read map file {}", map_file.display()))?;
        let world: World = text
            .parse()
            .with_context(|| format!("Failed to load map {}", map_file.display()))?;
        info!(map = %map_file.display(), rows = world.rows(), cols = world.cols(), "map loaded");
        return Ok(world);
    }

    let mut world = World::new(args.rows, args.cols)?;
    world.set_start(Coordinate::new(0, 0));
    world.set_goal(Coordinate::new(
        args.rows as i32 - 1,
        args.cols as i32 - 1,
    ));
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let walls = world.scatter_walls(&mut rng, args.density);
    info!(seed, walls, rows = args.rows, cols = args.cols, "world generated");
    Ok(world)
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char('r') => app.reset(),
                    KeyCode::Char(' ') => app.toggle_pause(),
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let [map_area, status_area, help_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(5),
        Constraint::Length(2),
    ])
    .areas(frame.area());

    render_map(frame, map_area, app);
    render_status(frame, status_area, app);

    let help_text = Paragraph::new("'q'/'Esc' quit, 'r' reset agent, 'space' pause")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, help_area);
}

fn glyph_style(glyph: char) -> Style {
    match glyph {
        AGENT => Style::default().fg(Color::Red).bold(),
        START => Style::default().fg(Color::Green).bold(),
        GOAL => Style::default().fg(Color::Yellow).bold(),
        PATH => Style::default().fg(Color::Cyan),
        WALL => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(Color::Gray),
    }
}

/// Renders the world, route and agent onto the frame.
fn render_map(frame: &mut Frame, area: Rect, app: &App) {
    let glyphs = render::glyphs(&app.world, app.route.as_ref().ok(), Some(app.agent_at));
    let lines: Vec<Line> = glyphs
        .row_slices()
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|glyph| Span::styled(glyph.to_string(), glyph_style(*glyph)))
                    .collect::<Vec<Span>>(),
            )
        })
        .collect();

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Grid World").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}

/// Renders search results and agent progress.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let search_line = match &app.route {
        Ok(path) => Line::from(format!(
            "Path: {} steps, {} nodes expanded",
            path.steps(),
            app.expanded
        )),
        Err(reason) => Line::from(Span::styled(
            format!("No path found: {reason}"),
            Style::default().fg(Color::Red),
        )),
    };

    let mut agent_spans = vec![Span::raw(format!(
        "Agent at {} ({}/{} moves)",
        app.agent_at,
        app.taken,
        app.moves.len()
    ))];
    if let Some((direction, moved)) = app.last_move {
        let verdict = if moved { "moved" } else { "blocked" };
        agent_spans.push(Span::raw(format!(", last {direction} {verdict}")));
    }

    let state_line = if app.arrived() {
        Line::from(Span::styled(
            "Goal reached!",
            Style::default().fg(Color::Green).bold(),
        ))
    } else if app.paused {
        Line::from(Span::styled("Paused", Style::default().fg(Color::Yellow)))
    } else {
        Line::from("Walking")
    };

    let status = Paragraph::new(vec![search_line, Line::from(agent_spans), state_line])
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(map: &str) -> App {
        App::new(map.parse().unwrap()).unwrap()
    }

    #[test]
    fn ticks_walk_the_agent_to_the_goal() {
        let mut app = app(include_str!("../../maps/demo.txt"));
        let steps = app.route.as_ref().unwrap().steps();
        assert_eq!(steps, 10);

        for _ in 0..steps {
            assert!(!app.arrived());
            app.tick();
        }
        assert!(app.arrived());
        assert_eq!(app.taken, steps);

        app.tick();
        assert_eq!(app.taken, steps);
    }

    #[test]
    fn pause_and_reset() {
        let mut app = app("S..G");
        app.toggle_pause();
        app.tick();
        assert_eq!(app.agent_at, Coordinate::new(0, 0));

        app.toggle_pause();
        app.tick();
        app.tick();
        assert_eq!(app.agent_at, Coordinate::new(0, 2));

        app.reset();
        assert_eq!(app.agent_at, Coordinate::new(0, 0));
        assert_eq!(app.taken, 0);
    }

    #[test]
    fn unreachable_goal_leaves_agent_in_place() {
        let mut app = app("S#G");
        assert_eq!(app.route, Err(NoPath::Unreachable));
        app.tick();
        assert_eq!(app.agent_at, Coordinate::new(0, 0));
    }

    #[test]
    fn reset_recovers_from_any_position() {
        let mut app = app("S#.G");
        app.agent_at = Coordinate::new(0, 1);
        app.reset();
        assert_eq!(app.agent_at, Coordinate::new(0, 0));

        app.agent_at = Coordinate::new(-3, 7);
        app.taken = 2;
        app.reset();
        assert_eq!(app.agent_at, Coordinate::new(0, 0));
        assert_eq!(app.taken, 0);
    }

    #[test]
    fn density_must_be_a_probability() {
        for bad in ["NaN", "inf", "1.5", "-0.1", "dense"] {
            assert!(
                Args::try_parse_from(["grid_nav_tui", "--density", bad]).is_err(),
                "{bad} accepted"
            );
        }
        let args = Args::try_parse_from(["grid_nav_tui", "--density", "0.3"]).unwrap();
        assert_eq!(args.density, 0.3);
        let args = Args::try_parse_from(["grid_nav_tui"]).unwrap();
        assert_eq!(args.density, 0.25);
    }

    #[test]
    fn maps_need_both_endpoints() {
        assert!(App::new("S..".parse().unwrap()).is_err());
        assert!(App::new("..G".parse().unwrap()).is_err());
    }
}
