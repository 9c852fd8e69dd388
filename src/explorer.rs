//! Terminal front end using ratatui
//!
//! Roguelike-style interface over a generated map. Three modes:
//! Play moves the player, Draw paints terrain under a free cursor and Look
//! inspects whatever stands under the cursor.

use std::error::Error;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Terminal,
};
use tracing::{info, warn};

use crate::config::WildernessConfig;
use crate::entity::{Direction, Entity, EntityId, Stats};
use crate::grid::{Cell, TileCoord};
use crate::rover::Rover;
use crate::seeds::WorldSeeds;
use crate::world::{SharedWorld, Spawn, World};

/// Rows taken by the status panel, borders included.
const STATUS_HEIGHT: u16 = 4;

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// Darken a colour for use as a cell background so the glyph stands out.
fn make_bg_color((r, g, b): (u8, u8, u8)) -> Color {
    let factor = 0.35;
    Color::Rgb(
        (r as f32 * factor) as u8,
        (g as f32 * factor) as u8,
        (b as f32 * factor) as u8,
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Play,
    Draw,
    Look,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Play => "Play",
            Mode::Draw => "Draw",
            Mode::Look => "Look",
        }
    }

    pub fn next(&self) -> Mode {
        match self {
            Mode::Play => Mode::Draw,
            Mode::Draw => Mode::Look,
            Mode::Look => Mode::Play,
        }
    }
}

/// Whether the main loop should keep going after a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

fn key_direction(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Some(Direction::North),
        KeyCode::Down | KeyCode::Char('j') => Some(Direction::South),
        KeyCode::Left | KeyCode::Char('h') => Some(Direction::West),
        KeyCode::Right | KeyCode::Char('l') => Some(Direction::East),
        _ => None,
    }
}

/// Explorer state
pub struct Explorer {
    world: SharedWorld,
    config: WildernessConfig,
    player: EntityId,
    cursor: EntityId,
    rover: Option<Rover>,
    mode: Mode,
    /// Turns spent by the player
    turn: u64,
    show_help: bool,
    /// Message to display temporarily
    message: Option<String>,
    path_preview: Vec<TileCoord>,
}

impl Explorer {
    /// Build a session for a terminal of `cols` x `rows`: generate the first
    /// map, place the cursor, the player and one wandering creature.
    pub fn new(config: WildernessConfig, seeds: WorldSeeds, cols: u16, rows: u16) -> Result<Self, Box<dyn Error>> {
        let mut world = World::new(config.world_settings(), seeds)?;
        let (width, height) = config.map_size_for(cols, rows);
        world.regenerate(width, height)?;

        let cursor = world.spawn(Entity::cursor(EntityId(0), TileCoord::default()), Spawn::Start)?;
        let player = world.spawn(Entity::new(EntityId(0), "Player", '@', TileCoord::default()), Spawn::Start)?;
        let creature = world.spawn(Entity::new(EntityId(0), "Jackal", 'j', TileCoord::default()), Spawn::Anywhere)?;

        let world = world.into_shared();
        let rover = Rover::spawn(Arc::clone(&world), creature, config.rover_interval(), seeds.roaming)?;

        info!(seed = seeds.master, width, height, "explorer ready");

        let mut explorer = Explorer {
            world,
            config,
            player,
            cursor,
            rover: Some(rover),
            mode: Mode::Play,
            turn: 0,
            show_help: false,
            message: None,
            path_preview: Vec::new(),
        };
        explorer.snap_cursor_to_player();
        Ok(explorer)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn cursor(&self) -> EntityId {
        self.cursor
    }

    /// The wandering creature, while its thread is alive.
    pub fn creature(&self) -> Option<EntityId> {
        self.rover.as_ref().map(|r| r.entity())
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn path_preview(&self) -> &[TileCoord] {
        &self.path_preview
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        if let Some(rover) = &self.rover {
            rover.set_paused(mode != Mode::Play);
        }
        if mode == Mode::Play {
            self.snap_cursor_to_player();
        }
        self.path_preview.clear();
    }

    fn snap_cursor_to_player(&mut self) {
        let mut world = self.world.lock();
        if let Some(pos) = world.entity(self.player).map(|p| p.position) {
            if let Err(err) = world.teleport_ghost(self.cursor, pos) {
                warn!(%err, "cursor could not follow player");
            }
        }
    }

    fn step(&mut self, direction: Direction) {
        self.path_preview.clear();
        match self.mode {
            Mode::Play => {
                let moved = {
                    let mut world = self.world.lock();
                    let moved = world.move_entity(self.player, direction);
                    if moved {
                        self.turn += world.entity(self.player).map_or(1, |p| p.step_factor as u64);
                    }
                    moved
                };
                if moved {
                    self.snap_cursor_to_player();
                }
            }
            Mode::Draw | Mode::Look => {
                self.world.lock().move_entity(self.cursor, direction);
            }
        }
    }

    fn paint(&mut self) {
        match self.world.lock().paint_under(self.cursor) {
            Ok(Some(terrain)) => self.message = Some(format!("Painted {}", terrain)),
            Ok(None) => {}
            Err(err) => self.message = Some(format!("Cannot paint: {}", err)),
        }
    }

    fn preview_path(&mut self) {
        let result = self.world.lock().path_between(self.player, self.cursor);
        match result {
            Ok(Some(path)) => {
                self.message = Some(format!("Path: {} steps", path.len().saturating_sub(1)));
                self.path_preview = path;
            }
            Ok(None) => {
                self.message = Some("No path".to_string());
                self.path_preview.clear();
            }
            Err(err) => self.message = Some(format!("Path failed: {}", err)),
        }
    }

    /// Regenerate with a new random seed at the current size.
    fn regenerate(&mut self) {
        let seeds = WorldSeeds::default();
        let result = self.world.lock().reseed(seeds);
        self.message = Some(match result {
            Ok(()) => format!("New map! Seed: {}", seeds.master),
            Err(err) => format!("Regeneration failed: {}", err),
        });
        self.path_preview.clear();
        self.snap_cursor_to_player();
    }

    /// Regenerate for a new terminal size.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let (width, height) = self.config.map_size_for(cols, rows);
        if self.world.lock().grid().dimensions() == (width, height) {
            return;
        }
        if let Err(err) = self.world.lock().regenerate(width, height) {
            warn!(%err, "regeneration after resize failed");
        }
        self.path_preview.clear();
        self.snap_cursor_to_player();
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Flow {
        if self.show_help {
            self.show_help = false;
            return Flow::Continue;
        }

        if let Some(direction) = key_direction(code) {
            self.step(direction);
            return Flow::Continue;
        }

        match code {
            KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => self.set_mode(self.mode.next()),
            KeyCode::Esc => self.set_mode(Mode::Play),
            KeyCode::Char('a') => {
                let terrain = self.world.lock().cycle_selected_terrain();
                self.message = Some(format!("Brush: {}", terrain));
            }
            KeyCode::Char(' ') if self.mode == Mode::Draw => self.paint(),
            KeyCode::Char('p') if self.mode == Mode::Look => self.preview_path(),
            KeyCode::Char('r') => self.regenerate(),
            _ => {}
        }
        Flow::Continue
    }

    fn shutdown(&mut self) {
        if let Some(rover) = self.rover.take() {
            rover.stop();
        }
    }

    /// Draw the whole screen.
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let world = self.world.lock();
        let tracked = if self.mode == Mode::Play { self.player } else { self.cursor };
        let pos = world.entity(tracked).map(|e| e.position).unwrap_or_default();

        let title = format!(" {:03}x{:03} | {} | Turn {} ", pos.y, pos.x, self.mode.name(), self.turn);
        let mut block = Block::default().borders(Borders::ALL).title(Line::from(title));
        if self.mode == Mode::Draw {
            let brush = world.grid().selected_terrain();
            let style = world.grid().tileset().style(brush);
            let brush_title = Line::from(format!(" {} {} ", style.glyph, brush))
                .style(Style::default().fg(rgb(style.color)))
                .right_aligned();
            block = block.title(brush_title);
        }
        let inner = block.inner(area);
        block.render(area, buf);

        let [map_area, status_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(STATUS_HEIGHT)]).areas(inner);

        self.render_map(&world, map_area, buf);
        self.render_status(&world, status_area, buf);

        if self.show_help {
            render_help(map_area, buf);
        }
    }

    fn render_map(&self, world: &World, area: Rect, buf: &mut Buffer) {
        let grid = world.grid();
        let tileset = grid.tileset();
        let cell_width = tileset.cell_width() as u16;

        let to_screen = |c: TileCoord| screen_rect(area, cell_width, c);

        for (x, y, cell) in grid.cells().iter() {
            let Some(rect) = to_screen(TileCoord::new(x, y)) else {
                continue;
            };
            let (glyph, style) = match cell {
                Cell::Terrain(t) => {
                    let s = tileset.style(*t);
                    (s.glyph, Style::default().fg(rgb(s.color)).bg(make_bg_color(s.shade)))
                }
                Cell::Empty => (" ", Style::default()),
            };
            buf.set_string(rect.x, rect.y, glyph, style);
        }

        let path_style = Style::default().bg(Color::Rgb(110, 90, 0));
        for coord in &self.path_preview {
            if let Some(rect) = to_screen(*coord) {
                buf.set_style(rect, path_style);
            }
        }

        for entity in world.entities().filter(|e| !e.ghost) {
            if let Some(rect) = to_screen(entity.position) {
                let mut glyph = entity.glyph.to_string();
                while glyph.chars().count() < cell_width as usize {
                    glyph.push(' ');
                }
                let style = if entity.id == self.player {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::LightRed)
                };
                buf.set_string(rect.x, rect.y, glyph, style);
            }
        }

        if self.mode != Mode::Play {
            if let Some(rect) = world.entity(self.cursor).and_then(|c| to_screen(c.position)) {
                buf.set_style(rect, Style::default().add_modifier(Modifier::REVERSED));
            }
        }
    }

    fn render_status(&self, world: &World, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<String> = match self.mode {
            Mode::Play => match world.entity(self.player) {
                Some(player) => stat_lines(&player.stats, Some(self.turn)),
                None => vec!["No player".to_string()],
            },
            Mode::Look => {
                let under = world
                    .entity(self.cursor)
                    .and_then(|c| world.occupant(c.position));
                match under {
                    Some(entity) => {
                        let mut lines = stat_lines(&entity.stats, None);
                        lines[0] = format!("{}  {}", entity.name, lines[0]);
                        lines
                    }
                    None => vec!["Nothing Selected".to_string()],
                }
            }
            Mode::Draw => vec![
                format!("Brush: {}", world.grid().selected_terrain()),
                "Space: paint  a: next terrain".to_string(),
            ],
        };

        if let Some(msg) = &self.message {
            match lines.get_mut(1) {
                Some(second) => {
                    second.push_str("  | ");
                    second.push_str(msg);
                }
                None => lines.push(msg.clone()),
            }
        }
        let lines: Vec<Line> = lines.into_iter().map(Line::from).collect();
        Paragraph::new(lines).render(inner, buf);
    }
}

impl Drop for Explorer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn stat_lines(stats: &Stats, turn: Option<u64>) -> Vec<String> {
    let mut first = format!(
        "HP: {:>2}  STR: {:>2}  INT: {:>2}  DEX: {:>2}",
        stats.hp, stats.strength, stats.intelligence, stats.dexterity
    );
    if let Some(turn) = turn {
        first.push_str(&format!("  TURN: {}", turn));
    }
    vec![first, format!("MP: {:>2}  AC: {:>2}  EXP: {}", stats.mp, stats.ac, stats.exp)]
}

/// Screen cells covering map cell `c`, or None when it falls outside `area`.
fn screen_rect(area: Rect, cell_width: u16, c: TileCoord) -> Option<Rect> {
    let sx = area.x.checked_add(u16::try_from(c.x).ok()?.checked_mul(cell_width)?)?;
    let sy = area.y.checked_add(u16::try_from(c.y).ok()?)?;
    if sx as u32 + cell_width as u32 > area.right() as u32 || sy >= area.bottom() {
        return None;
    }
    Some(Rect::new(sx, sy, cell_width, 1))
}

fn render_help(area: Rect, buf: &mut Buffer) {
    let help_text = [
        "=== Wilderness ===",
        "",
        "  Arrows / HJKL - Move",
        "  Tab - Cycle Play/Draw/Look",
        "  Esc - Back to Play",
        "  Space - Paint (Draw)",
        "  a - Next brush terrain",
        "  p - Path to cursor (Look)",
        "  r - New map",
        "  ? - Toggle this help",
        "  q - Quit",
    ];

    let width = 34;
    let height = help_text.len() as u16 + 2;
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let help_area = Rect::new(x, y, width.min(area.width), height.min(area.height));

    Clear.render(help_area, buf);
    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray));
    let inner = block.inner(help_area);
    block.render(help_area, buf);

    for (i, line) in help_text.iter().enumerate() {
        if i as u16 >= inner.height {
            break;
        }
        buf.set_string(inner.x, inner.y + i as u16, line, Style::default().fg(Color::White));
    }
}

fn run_loop<B: Backend>(terminal: &mut Terminal<B>, explorer: &mut Explorer) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| {
            let area = f.area();
            explorer.render(area, f.buffer_mut());
        })?;

        // Redraw periodically so the creature's moves show up without input.
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                explorer.message = None;
                if explorer.handle_key(key.code) == Flow::Quit {
                    return Ok(());
                }
            }
            Event::Resize(cols, rows) => explorer.resize(cols, rows),
            _ => {}
        }
    }
}

/// Run the explorer until the user quits.
pub fn run_explorer(config: WildernessConfig, seeds: WorldSeeds) -> Result<(), Box<dyn Error>> {
    let (cols, rows) = terminal::size()?;
    let mut explorer = Explorer::new(config, seeds, cols, rows)?;

    terminal::enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut explorer);

    // Cleanup
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    explorer.shutdown();
    info!(turns = explorer.turn, "explorer closed");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::GenerationParams;
    use crate::terrain::Terrain;

    /// An all-dirt map on an 80x24 terminal with a creature that never gets
    /// to move during a test.
    fn explorer() -> Explorer {
        let config = WildernessConfig {
            rover_interval_ms: 3_600_000,
            generation: GenerationParams {
                initial_continuation: 2.0,
                initial_decay: 0.0,
                decay_increment: 0.0,
            },
            ..WildernessConfig::default()
        };
        let ex = Explorer::new(config, WorldSeeds::from_master(11), 80, 24).unwrap();
        // Keep the creature out of the corner the tests walk around in.
        let creature = ex.creature().unwrap();
        let mut master = 11;
        while {
            let pos = position(&ex, creature);
            pos.x < 6 && pos.y < 6
        } {
            master += 1;
            ex.world().lock().reseed(WorldSeeds::from_master(master)).unwrap();
        }
        ex
    }

    fn position(explorer: &Explorer, id: EntityId) -> TileCoord {
        explorer.world().lock().entity(id).unwrap().position
    }

    #[test]
    fn test_initial_layout() {
        let ex = explorer();
        assert_eq!(ex.mode(), Mode::Play);
        assert_eq!(ex.world().lock().grid().dimensions(), (77, 18));
        assert_eq!(position(&ex, ex.player()), TileCoord::new(1, 1));
        assert_eq!(position(&ex, ex.cursor()), TileCoord::new(1, 1));
        assert_eq!(ex.world().lock().entities().count(), 3);
    }

    #[test]
    fn test_modes_cycle_and_escape() {
        let mut ex = explorer();
        ex.handle_key(KeyCode::Tab);
        assert_eq!(ex.mode(), Mode::Draw);
        ex.handle_key(KeyCode::Tab);
        assert_eq!(ex.mode(), Mode::Look);
        ex.handle_key(KeyCode::Tab);
        assert_eq!(ex.mode(), Mode::Play);

        ex.handle_key(KeyCode::Tab);
        ex.handle_key(KeyCode::Esc);
        assert_eq!(ex.mode(), Mode::Play);
    }

    #[test]
    fn test_play_moves_player_and_counts_turns() {
        let mut ex = explorer();
        ex.handle_key(KeyCode::Right);
        ex.handle_key(KeyCode::Char('j'));

        assert_eq!(position(&ex, ex.player()), TileCoord::new(2, 2));
        assert_eq!(position(&ex, ex.cursor()), TileCoord::new(2, 2));
        assert_eq!(ex.turn(), 2);

        // Blocked by the top border: no turn spent.
        ex.handle_key(KeyCode::Up);
        ex.handle_key(KeyCode::Up);
        ex.handle_key(KeyCode::Up);
        assert_eq!(position(&ex, ex.player()), TileCoord::new(2, 0));
        assert_eq!(ex.turn(), 4);
    }

    #[test]
    fn test_draw_mode_paints_under_cursor() {
        let mut ex = explorer();
        ex.handle_key(KeyCode::Tab);
        ex.handle_key(KeyCode::Char('l'));
        ex.handle_key(KeyCode::Char('a'));
        assert_eq!(ex.message(), Some("Brush: grass"));

        ex.handle_key(KeyCode::Char(' '));
        let world = ex.world().lock();
        assert_eq!(world.grid().terrain_at(TileCoord::new(2, 1)), Some(Terrain::Grass));
        assert_eq!(world.entity(ex.player()).unwrap().position, TileCoord::new(1, 1));
    }

    #[test]
    fn test_space_outside_draw_mode_does_nothing() {
        let mut ex = explorer();
        ex.handle_key(KeyCode::Char(' '));
        assert_eq!(
            ex.world().lock().grid().terrain_at(TileCoord::new(1, 1)),
            Some(Terrain::Dirt)
        );
    }

    #[test]
    fn test_look_mode_path_preview() {
        let mut ex = explorer();
        ex.handle_key(KeyCode::Tab);
        ex.handle_key(KeyCode::Tab);
        for _ in 0..3 {
            ex.handle_key(KeyCode::Down);
        }
        ex.handle_key(KeyCode::Char('p'));

        assert_eq!(ex.message(), Some("Path: 3 steps"));
        assert_eq!(ex.path_preview().len(), 4);
        assert_eq!(ex.path_preview()[0], TileCoord::new(1, 1));

        // Leaving Look mode clears the preview.
        ex.handle_key(KeyCode::Esc);
        assert!(ex.path_preview().is_empty());
    }

    #[test]
    fn test_look_mode_reports_missing_path() {
        let mut ex = explorer();
        ex.handle_key(KeyCode::Tab);
        ex.handle_key(KeyCode::Tab);
        ex.handle_key(KeyCode::Right);
        ex.world().lock().set_terrain(2, 1, Terrain::Water).unwrap();

        ex.handle_key(KeyCode::Char('p'));
        assert_eq!(ex.message(), Some("No path"));
    }

    #[test]
    fn test_resize_regenerates() {
        let mut ex = explorer();
        ex.resize(40, 12);
        assert_eq!(ex.world().lock().grid().dimensions(), (37, 6));
        assert_eq!(position(&ex, ex.player()), position(&ex, ex.cursor()));
    }

    #[test]
    fn test_quit_and_help() {
        let mut ex = explorer();
        ex.handle_key(KeyCode::Char('?'));
        // Any key closes help, including 'q'.
        assert_eq!(ex.handle_key(KeyCode::Char('q')), Flow::Continue);
        assert_eq!(ex.handle_key(KeyCode::Char('q')), Flow::Quit);
    }

    #[test]
    fn test_screen_rect_clips_far_cells() {
        let area = Rect::new(1, 1, 78, 18);
        assert_eq!(screen_rect(area, 1, TileCoord::new(0, 0)), Some(Rect::new(1, 1, 1, 1)));
        assert_eq!(screen_rect(area, 2, TileCoord::new(3, 2)), Some(Rect::new(7, 3, 2, 1)));
        assert_eq!(screen_rect(area, 2, TileCoord::new(39, 0)), None);
        // Coordinates past u16::MAX must not wrap back onto the screen.
        assert_eq!(screen_rect(area, 1, TileCoord::new(65_537, 0)), None);
        assert_eq!(screen_rect(area, 1, TileCoord::new(0, 65_537)), None);
    }

    #[test]
    fn test_render_draws_player_and_title() {
        let ex = explorer();
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        ex.render(area, &mut buf);

        // Border at (0, 0), map starts at (1, 1); the player is on map cell (1, 1).
        assert_eq!(buf[(2, 2)].symbol(), "@");
        let title: String = (0..20).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(title.contains("001x001"), "title was {:?}", title);
        assert!(title.contains("Play"));
    }
}
