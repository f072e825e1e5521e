//! TUI module - Plan editor with swipeable week rows
//!
//! Drag a week to the left with the mouse to reveal its delete button.

use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};
use tracing::{info, warn};

use crate::db::Database;
use crate::plan::WorkoutPlan;
use crate::swipe::{
    DeleteButtonStyle, HiddenArea, RowState, RowVisuals, SwipeConfig, SwipeRow, TapOutcome,
};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Width in cells of the delete button behind each week
const DELETE_WIDTH: f64 = 10.0;

fn week_row() -> SwipeRow {
    SwipeRow::new(SwipeConfig {
        settle_duration: Duration::from_millis(200),
        ..SwipeConfig::default().with_right(HiddenArea::with_delete_button(
            DELETE_WIDTH,
            DeleteButtonStyle {
                max_icon_size: 1.0,
                max_font_size: 1.0,
            },
        ))
    })
}

/// A release this long after the last drag sample is not a flick
const STALE_VELOCITY: Duration = Duration::from_millis(100);

/// Mouse press on a week row, possibly turning into a drag
#[derive(Debug, Clone, Copy)]
struct Pointer {
    row: usize,
    start_x: u16,
    last_x: u16,
    last_at: Instant,
    velocity: f64,
    dragging: bool,
}

impl Pointer {
    /// Velocity to release with; zero if the pointer rested before letting go
    fn release_velocity(&self, now: Instant) -> f64 {
        if now.saturating_duration_since(self.last_at) > STALE_VELOCITY {
            0.0
        } else {
            self.velocity
        }
    }
}

/// App state for TUI
pub struct App {
    db: Database,
    plan: WorkoutPlan,
    rows: Vec<SwipeRow>,
    selected: usize,
    pointer: Option<Pointer>,
    list_area: Rect,
    status: String,
    dirty: bool,
    should_quit: bool,
}

impl App {
    pub fn new(db: Database, plan_id: i64) -> Result<Self> {
        let plan = db.require_plan(plan_id)?;
        let rows = plan.weeks.iter().map(|_| week_row()).collect();
        Ok(Self {
            db,
            plan,
            rows,
            selected: 0,
            pointer: None,
            list_area: Rect::default(),
            status: String::new(),
            dirty: false,
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            let now = Instant::now();
            for row in &mut self.rows {
                row.tick(now);
            }
            terminal.draw(|frame| self.render(frame, now))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, now: Instant) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        let title = format!(
            "liftplan - {} [{}]{}",
            self.plan.name,
            self.plan.status.as_str(),
            if self.dirty { " *" } else { "" }
        );
        let header = Paragraph::new(title)
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);

        let weeks_block = Block::default().borders(Borders::ALL).title("Weeks");
        self.list_area = weeks_block.inner(body[0]);
        frame.render_widget(weeks_block, body[0]);

        for (i, week) in self.plan.weeks.iter().enumerate() {
            let y = self.list_area.y + i as u16;
            if y >= self.list_area.bottom() {
                break;
            }
            let line = Rect::new(self.list_area.x, y, self.list_area.width, 1);
            let label = if week.repeat > 0 {
                format!("Week {}-{} ({} workouts)", week.position, week.last_position(), week.workouts.len())
            } else {
                format!("Week {} ({} workouts)", week.position, week.workouts.len())
            };
            render_row(frame, line, &label, &self.rows[i].visuals(now), i == self.selected);
        }

        frame.render_widget(self.week_details(), body[1]);

        let footer_text = if self.status.is_empty() {
            "q: quit | a: add week | d: delete | +/-: repeat | s: save | drag left: delete".to_string()
        } else {
            self.status.clone()
        };
        let footer = Paragraph::new(footer_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn week_details(&self) -> List<'_> {
        let mut items = Vec::new();
        if let Some(week) = self.plan.weeks.get(self.selected) {
            for workout in &week.workouts {
                items.push(ListItem::new(format!("{}", workout.day)).style(Style::default().bold()));
                for exercise in &workout.exercises {
                    items.push(ListItem::new(format!(
                        "  {} {}x{} @ {} {}{}",
                        exercise.name,
                        exercise.sets,
                        exercise.repetitions,
                        exercise.weight,
                        exercise.unit.label(),
                        if exercise.added_in_current_session { " (new)" } else { "" }
                    )));
                }
            }
        }
        List::new(items).block(Block::default().borders(Borders::ALL).title("Workouts"))
    }

    fn handle_events(&mut self) -> Result<()> {
        let animating = self.rows.iter().any(SwipeRow::is_animating);
        let timeout = Duration::from_millis(if animating { 16 } else { 100 });
        if !event::poll(timeout)? {
            return Ok(());
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key.code)?,
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::FocusLost => self.cancel_pointer(),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<()> {
        self.status.clear();
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.plan.weeks.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('a') => {
                if self.plan.add_week() {
                    self.rows.push(week_row());
                    self.selected = self.plan.weeks.len() - 1;
                    self.dirty = true;
                } else {
                    self.status = "Plan is too long".to_string();
                }
            }
            KeyCode::Char('d') => self.delete_week(self.selected),
            KeyCode::Char('+') => self.change_repeat(1),
            KeyCode::Char('-') => self.change_repeat(-1),
            KeyCode::Char('s') => match self.db.update_plan(&mut self.plan) {
                Ok(()) => {
                    self.dirty = false;
                    self.status = "Saved".to_string();
                }
                Err(e) => {
                    warn!("failed to save plan: {:#}", e);
                    self.status = format!("Save failed: {:#}", e);
                }
            },
            KeyCode::Esc => self.cancel_pointer(),
            _ => {}
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let now = Instant::now();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(row) = self.row_at(mouse.column, mouse.row) {
                    self.pointer = Some(Pointer {
                        row,
                        start_x: mouse.column,
                        last_x: mouse.column,
                        last_at: now,
                        velocity: 0.0,
                        dragging: false,
                    });
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(pointer) = self.pointer.as_mut() else {
                    return;
                };
                if !pointer.dragging {
                    let row = &mut self.rows[pointer.row];
                    row.cancel_tap();
                    pointer.dragging = row.drag_start(now);
                }
                let dt = now.saturating_duration_since(pointer.last_at).as_secs_f64();
                if dt > 0.0 {
                    pointer.velocity = (mouse.column as f64 - pointer.last_x as f64) / dt;
                }
                pointer.last_x = mouse.column;
                pointer.last_at = now;
                let translation = mouse.column as f64 - pointer.start_x as f64;
                self.rows[pointer.row].drag_update(translation);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let Some(pointer) = self.pointer.take() else {
                    return;
                };
                if pointer.dragging {
                    let translation = mouse.column as f64 - pointer.start_x as f64;
                    self.rows[pointer.row].drag_end(translation, pointer.release_velocity(now), now);
                } else {
                    self.tap(pointer.row, mouse.column, now);
                }
            }
            _ => {}
        }
    }

    fn tap(&mut self, index: usize, column: u16, now: Instant) {
        let row = &self.rows[index];
        let on_delete_button = row.state() == RowState::Open
            && !row.is_animating()
            && column >= self.list_area.right().saturating_sub((-row.current_offset()).round() as u16);
        if on_delete_button {
            self.delete_week(index);
            return;
        }
        if self.rows[index].tap(now) == TapOutcome::Pressed {
            self.selected = index;
        }
    }

    fn cancel_pointer(&mut self) {
        if let Some(pointer) = self.pointer.take() {
            self.rows[pointer.row].drag_cancel(Instant::now());
        }
    }

    fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.list_area;
        if column < area.x || column >= area.right() || row < area.y || row >= area.bottom() {
            return None;
        }
        let index = (row - area.y) as usize;
        (index < self.plan.weeks.len()).then_some(index)
    }

    fn delete_week(&mut self, index: usize) {
        let Some(position) = self.plan.weeks.get(index).map(|w| w.position) else {
            return;
        };
        if self.plan.delete_week(position) {
            self.rows.remove(index);
            self.selected = self.selected.min(self.plan.weeks.len().saturating_sub(1));
            self.dirty = true;
            self.status = format!("Deleted week {}", position);
            info!(position, "week deleted from editor");
        }
    }

    fn change_repeat(&mut self, delta: i32) {
        let Some(week) = self.plan.weeks.get(self.selected) else {
            return;
        };
        let (position, repeat) = (week.position, week.repeat);
        let new_repeat = repeat.saturating_add(delta);
        if self.plan.change_week_repeat(position, new_repeat) {
            self.dirty = true;
        } else if new_repeat < 0 {
            self.status = "Repeat cannot be negative".to_string();
        } else {
            self.status = "Plan is too long".to_string();
        }
    }
}

/// Draw one week line shifted by its swipe offset, with the delete button behind it
fn render_row(frame: &mut Frame, line: Rect, label: &str, visuals: &RowVisuals, selected: bool) {
    let shift = (-visuals.translation).round().clamp(0.0, line.width as f64) as u16;

    let mut style = if selected {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default()
    };
    if visuals.feedback_opacity < 1.0 {
        style = style.add_modifier(Modifier::DIM);
    }
    let main = Rect::new(line.x, line.y, line.width - shift, 1);
    frame.render_widget(Paragraph::new(label.to_string()).style(style).scroll((0, shift)), main);

    if let Some(reveal) = visuals.right
        && shift > 0
    {
        let button = Rect::new(line.x + line.width - shift, line.y, shift, 1);
        let level = (255.0 * reveal.opacity).round() as u8;
        let text = if reveal.font_size.unwrap_or(0.0) >= 1.0 { "Delete" } else { "" };
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::White).bg(Color::Rgb(level, 0, 0))),
            button,
        );
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(DisableMouseCapture)?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
