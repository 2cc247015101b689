use std::{error::Error, io, time::Duration};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode,
        KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tracing::{debug, info};

use crate::{
    clock::{Clock, FrameScheduler, MonotonicClock},
    config::{self, AppConfig},
    content::{Section, OWNER},
    nav::{Navigator, TouchTarget},
    render::{DeviceProfile, FrameBuffer, RenderQuality, Viewport},
    starfield::{FrameOutcome, StarfieldEngine},
    types::Rgb,
};

/// Logical units covered by one terminal column. A row covers two raster
/// rows of the same size.
const CELL_UNITS: f32 = 8.0;
const HEADER_HEIGHT: u16 = 3;
const TAB_GAP: u16 = 2;
const PANEL_MAX_WIDTH: u16 = 104;
const MENU_WIDTH: u16 = 18;

const PANEL_BG: Color = Color::Rgb(0, 1, 6);
const ACTIVE: Color = Color::LightBlue;

pub fn run(app: AppConfig) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut terminal = undo_on_err(open_terminal(), restore_terminal)?;

    let clock = MonotonicClock::new();
    let mut stage = Stage::new(&app, clock.now());
    let result = event_loop(&mut terminal, &mut stage, &clock);
    stage.teardown();
    shutdown_terminal(&mut terminal)?;
    result
}

fn open_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Best-effort reset used when setup fails halfway.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
}

fn undo_on_err<T, E>(result: Result<T, E>, undo: impl FnOnce()) -> Result<T, E> {
    if result.is_err() {
        undo();
    }
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    stage: &mut Stage,
    clock: &MonotonicClock,
) -> Result<(), Box<dyn Error>> {
    let mut scheduler = FrameScheduler::new(config::RENDER_HZ, clock.now());
    let mut frame_counter = 0_u32;
    let mut last_fps_sample = clock.now();

    loop {
        let wait = scheduler
            .until_due(clock.now())
            .unwrap_or(Duration::from_millis(50));
        if event::poll(wait)? {
            let event = event::read()?;
            if stage.handle_event(&event, clock.now()) == Control::Quit {
                scheduler.cancel();
                return Ok(());
            }
        }

        let now = clock.now();
        if !scheduler.poll(now) {
            continue;
        }
        let size = terminal.size()?;
        stage.ensure_viewport(size.width, size.height);
        stage.frame(now);
        terminal.draw(|frame| stage.draw(frame))?;

        frame_counter += 1;
        let elapsed = now.saturating_sub(last_fps_sample);
        if elapsed >= Duration::from_secs(1) {
            stage.fps = frame_counter as f32 / elapsed.as_secs_f32();
            debug!(
                fps = stage.fps,
                speed = stage.engine.speed(),
                target = stage.engine.target_speed(),
                "frame rate"
            );
            frame_counter = 0;
            last_fps_sample = now;
        }
    }
}

fn shutdown_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// The view that owns the starfield, the navigator and the drawing surface.
pub struct Stage {
    engine: StarfieldEngine,
    nav: Navigator,
    quality: RenderQuality,
    surface: Option<FrameBuffer>,
    cols: u16,
    rows: u16,
    fps: f32,
}

impl Stage {
    pub fn new(app: &AppConfig, now: Duration) -> Self {
        let quality = RenderQuality::detect(DeviceProfile {
            touch_primary: app.touch_primary,
            pixel_ratio: app.pixel_ratio,
        });
        info!(?quality, "render quality selected");
        let mut engine = StarfieldEngine::new(app.starfield.clone(), app.seed);
        debug!(particles = engine.particles().len(), "particle pool allocated");
        engine.start();
        Self {
            engine,
            nav: Navigator::new(app.navigation.clone(), now),
            quality,
            surface: None,
            cols: 0,
            rows: 0,
            fps: 0.0,
        }
    }

    /// Sizes the surface to the terminal. The first call attaches it.
    pub fn ensure_viewport(&mut self, cols: u16, rows: u16) {
        if !self.engine.is_running() {
            return;
        }
        self.cols = cols;
        self.rows = rows;
        let viewport = Viewport {
            width: cols as f32 * CELL_UNITS,
            height: rows as f32 * CELL_UNITS * 2.0,
            px_per_unit: self.quality.factor() / CELL_UNITS,
        };
        match self.surface.as_mut() {
            Some(surface) => surface.fit(viewport),
            None => {
                let surface = FrameBuffer::for_viewport(viewport);
                debug!(
                    width = surface.raster_width(),
                    height = surface.raster_height(),
                    "surface attached"
                );
                self.surface = Some(surface);
            }
        }
    }

    /// One scheduled frame: settle navigation, feed urgency, tick the engine.
    pub fn frame(&mut self, now: Duration) -> FrameOutcome {
        self.nav.update(now);
        self.engine.set_urgent(self.nav.is_urgent(now));
        self.engine.tick(self.surface.as_mut(), now.as_secs_f32())
    }

    pub fn teardown(&mut self) {
        self.engine.stop();
        self.surface = None;
    }

    pub fn handle_event(&mut self, event: &CrosstermEvent, now: Duration) -> Control {
        match event {
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                self.handle_key(key.code, now)
            }
            CrosstermEvent::Mouse(mouse) => {
                self.handle_mouse(mouse, now);
                Control::Continue
            }
            CrosstermEvent::Resize(cols, rows) => {
                self.ensure_viewport(*cols, *rows);
                Control::Continue
            }
            _ => Control::Continue,
        }
    }

    fn handle_key(&mut self, code: KeyCode, now: Duration) -> Control {
        match code {
            KeyCode::Char('q') => return Control::Quit,
            KeyCode::Esc if self.nav.menu_open() => self.nav.close_menu(),
            KeyCode::Esc => return Control::Quit,
            KeyCode::Down | KeyCode::PageDown | KeyCode::Char('j') => {
                self.nav.next(now);
            }
            KeyCode::Up | KeyCode::PageUp | KeyCode::Char('k') => {
                self.nav.previous(now);
            }
            KeyCode::Tab => {
                let target = (self.nav.current() + 1) % Section::ALL.len();
                self.nav.go_to(target, now);
            }
            KeyCode::Char('m') => self.nav.toggle_menu(),
            KeyCode::Char(ch @ '1'..='9') => {
                let index = (ch as usize) - ('1' as usize);
                self.nav.go_to(index, now);
            }
            _ => {}
        }
        Control::Continue
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent, now: Duration) {
        let layout = self.layout();
        let (col, row) = (mouse.column, mouse.row);
        let y = Some(row as f32 * config::ROW_PX);
        match mouse.kind {
            MouseEventKind::ScrollDown => {
                self.nav.wheel(config::WHEEL_NOTCH_PX, now);
            }
            MouseEventKind::ScrollUp => {
                self.nav.wheel(-config::WHEEL_NOTCH_PX, now);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(index) = layout.item_at(col, row) {
                    self.nav.go_to(index, now);
                    return;
                }
                let target = layout.target_at(col, row, self.nav.section());
                if target == TouchTarget::Content && self.nav.menu_open() {
                    self.nav.close_menu();
                }
                self.nav.touch_start(y, target);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let target = layout.target_at(col, row, self.nav.section());
                self.nav.touch_move(y, target, now);
            }
            _ => {}
        }
    }

    fn layout(&self) -> ScreenLayout {
        ScreenLayout::new(
            Rect::new(0, 0, self.cols, self.rows),
            self.nav.section(),
            self.nav.menu_open(),
        )
    }

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = ScreenLayout::new(area, self.nav.section(), self.nav.menu_open());

        if let Some(surface) = &self.surface {
            frame.render_widget(Paragraph::new(starfield_lines(surface, area)), area);
        }

        let mut spans = vec![Span::styled(
            format!("{OWNER}  "),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        for (i, section) in Section::ALL.iter().enumerate() {
            let style = if i == self.nav.current() {
                Style::default().fg(ACTIVE).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::raw(" ".repeat(TAB_GAP as usize)));
            spans.push(Span::styled(format!("[{}]", section.label()), style));
        }
        spans.push(Span::styled(
            format!(
                "   {:.0} fps | speed {:.1} | m: menu | q: quit",
                self.fps,
                self.engine.speed()
            ),
            Style::default().fg(Color::DarkGray),
        ));
        let header =
            Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, layout.header);

        let block = self.nav.section().block();
        let mut lines: Vec<Line> = Vec::with_capacity(block.lines.len() + 1);
        lines.push(Line::from(""));
        lines.extend(block.lines.iter().map(|l| Line::from(*l)));
        let panel = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(Style::default().bg(PANEL_BG).fg(Color::White))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(block.title)
                    .title_alignment(Alignment::Center),
            );
        frame.render_widget(Clear, layout.panel);
        frame.render_widget(panel, layout.panel);

        if self.nav.has_next() && area.height > 1 {
            let hint = Rect::new(area.x, area.bottom() - 1, area.width, 1);
            frame.render_widget(Paragraph::new("v").alignment(Alignment::Center), hint);
        }

        if let Some(menu) = layout.menu {
            let items: Vec<Line> = Section::ALL
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    let style = if i == self.nav.current() {
                        Style::default().fg(ACTIVE)
                    } else {
                        Style::default()
                    };
                    Line::styled(format!(" {} {}", i + 1, s.label()), style)
                })
                .collect();
            frame.render_widget(Clear, menu);
            frame.render_widget(
                Paragraph::new(items)
                    .style(Style::default().bg(PANEL_BG))
                    .block(Block::default().borders(Borders::ALL).title("Menu")),
                menu,
            );
        }
    }
}

/// Screen regions shared by drawing and hit testing.
#[derive(Debug)]
struct ScreenLayout {
    header: Rect,
    tabs: [Rect; 4],
    panel: Rect,
    menu: Option<Rect>,
}

impl ScreenLayout {
    fn new(area: Rect, section: Section, menu_open: bool) -> Self {
        let header = Rect::new(area.x, area.y, area.width, HEADER_HEIGHT.min(area.height));

        let mut tabs = [Rect::default(); 4];
        let mut x = area.x + OWNER.len() as u16 + 2;
        for (tab, s) in tabs.iter_mut().zip(Section::ALL) {
            x += TAB_GAP;
            let width = s.label().len() as u16 + 2;
            *tab = Rect::new(x, area.y, width, 1).intersection(area);
            x += width;
        }

        let block = section.block();
        let longest = block.lines.iter().map(|l| l.len()).max().unwrap_or(0) as u16;
        let width = (longest + 6).min(PANEL_MAX_WIDTH).min(area.width);
        let height = (block.lines.len() as u16 + 3).min(area.height.saturating_sub(HEADER_HEIGHT));
        let panel = Rect::new(
            area.x + (area.width - width) / 2,
            area.y + HEADER_HEIGHT.min(area.height) + (area.height.saturating_sub(HEADER_HEIGHT + height)) / 2,
            width,
            height,
        );

        let menu = menu_open.then(|| {
            let w = MENU_WIDTH.min(area.width);
            let h = (Section::ALL.len() as u16 + 2).min(area.height.saturating_sub(HEADER_HEIGHT));
            Rect::new(area.right() - w, area.y + HEADER_HEIGHT.min(area.height), w, h)
        });

        Self {
            header,
            tabs,
            panel,
            menu,
        }
    }

    /// Section index under a click on a header tab or an open menu entry.
    fn item_at(&self, col: u16, row: u16) -> Option<usize> {
        if let Some(menu) = self.menu {
            if contains(menu, col, row) {
                let first = menu.y + 1;
                return (row >= first)
                    .then(|| (row - first) as usize)
                    .filter(|i| *i < Section::ALL.len());
            }
        }
        self.tabs.iter().position(|tab| contains(*tab, col, row))
    }

    fn target_at(&self, col: u16, row: u16, section: Section) -> TouchTarget {
        if self.menu.is_some_and(|menu| contains(menu, col, row)) {
            TouchTarget::Menu
        } else if contains(self.header, col, row) {
            TouchTarget::Header
        } else if section == Section::Contact && contains(self.panel, col, row) {
            TouchTarget::Link
        } else {
            TouchTarget::Content
        }
    }
}

fn contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x && col < rect.right() && row >= rect.y && row < rect.bottom()
}

/// Half-block rendering: each cell shows two raster rows, the upper one as
/// foreground and the lower one as background.
fn starfield_lines(surface: &FrameBuffer, area: Rect) -> Vec<Line<'static>> {
    let cols = area.width.max(1) as f32;
    let rows = (area.height.max(1) as f32) * 2.0;
    (0..area.height)
        .map(|y| {
            let spans: Vec<Span> = (0..area.width)
                .map(|x| {
                    let u = (x as f32 + 0.5) / cols;
                    let top = surface.sample(u, (y as f32 * 2.0 + 0.5) / rows);
                    let bottom = surface.sample(u, (y as f32 * 2.0 + 1.5) / rows);
                    Span::styled("▀", Style::default().fg(color_for(top)).bg(color_for(bottom)))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn color_for(color: Rgb) -> Color {
    let (r, g, b) = color.to_u8();
    Color::Rgb(r, g, b)
}
