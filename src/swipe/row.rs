//! Per-row swipe state machine
//!
//! Closed (offset 0) and Open (offset at a hidden area's snap point) are the
//! rest states; Dragging follows the pointer. Releasing a drag settles the
//! row to the resolved snap point with an eased animation.

use std::time::{Duration, Instant};

use super::{SharedOffset, ease_in_out, resolve_snap_point};

/// Opacity at the bottom of the press pulse
pub const PRESSED_OPACITY: f64 = 0.7;

/// Opacity of a hidden area that has only just started to show
pub const MIN_REVEAL_OPACITY: f64 = 0.5;

/// Delete button drawn inside a hidden area, grown as the area is revealed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeleteButtonStyle {
    pub max_icon_size: f64,
    pub max_font_size: f64,
}

impl Default for DeleteButtonStyle {
    fn default() -> Self {
        Self {
            max_icon_size: 24.0,
            max_font_size: 14.0,
        }
    }
}

/// Area behind the row, uncovered by swiping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HiddenArea {
    /// Distance from closed to the open snap point
    pub width: f64,
    pub delete_button: Option<DeleteButtonStyle>,
}

impl HiddenArea {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            delete_button: None,
        }
    }

    pub fn with_delete_button(width: f64, style: DeleteButtonStyle) -> Self {
        Self {
            width,
            delete_button: Some(style),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SwipeConfig {
    /// Revealed by dragging right (positive offsets)
    pub left: Option<HiddenArea>,
    /// Revealed by dragging left (negative offsets)
    pub right: Option<HiddenArea>,
    pub settle_duration: Duration,
    pub feedback_duration: Duration,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            left: None,
            right: None,
            settle_duration: Duration::from_millis(300),
            feedback_duration: Duration::from_millis(200),
        }
    }
}

impl SwipeConfig {
    pub fn with_left(mut self, area: HiddenArea) -> Self {
        self.left = Some(area);
        self
    }

    pub fn with_right(mut self, area: HiddenArea) -> Self {
        self.right = Some(area);
        self
    }

    /// Rest offsets in ascending order, always including 0
    pub fn snap_points(&self) -> Vec<f64> {
        let mut points = Vec::with_capacity(3);
        if let Some(right) = &self.right {
            points.push(-right.width);
        }
        points.push(0.0);
        if let Some(left) = &self.left {
            points.push(left.width);
        }
        points
    }

    /// Whether any drag is allowed at all
    pub fn is_enabled(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }

    /// Keep the offset on the sides that have a hidden area
    pub fn clamp(&self, offset: f64) -> f64 {
        let min = if self.right.is_some() { f64::NEG_INFINITY } else { 0.0 };
        let max = if self.left.is_some() { f64::INFINITY } else { 0.0 };
        offset.clamp(min, max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Closed,
    Open,
    Dragging,
}

/// What a tap on the row amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// The row was closed; the caller should run its press action
    Pressed,
    /// The row was open; it is closing and the press is swallowed
    Closed,
}

/// Visual parameters of one hidden area for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealVisuals {
    pub width: f64,
    pub reveal_fraction: f64,
    pub opacity: f64,
    pub icon_size: Option<f64>,
    pub font_size: Option<f64>,
}

impl RevealVisuals {
    fn new(area: &HiddenArea, revealed: f64) -> Self {
        let reveal_fraction = if area.width > 0.0 {
            (revealed / area.width).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            width: revealed,
            reveal_fraction,
            opacity: MIN_REVEAL_OPACITY + (1.0 - MIN_REVEAL_OPACITY) * reveal_fraction,
            icon_size: area.delete_button.map(|b| b.max_icon_size * reveal_fraction),
            font_size: area.delete_button.map(|b| b.max_font_size * reveal_fraction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowVisuals {
    /// Horizontal shift of the main area
    pub translation: f64,
    pub left: Option<RevealVisuals>,
    pub right: Option<RevealVisuals>,
    pub feedback_opacity: f64,
}

#[derive(Debug, Clone, Copy)]
struct DragSession {
    start_offset: f64,
}

#[derive(Debug, Clone, Copy)]
struct Settle {
    from: f64,
    to: f64,
    started: Instant,
}

/// Gesture state of a single swipeable row
#[derive(Debug)]
pub struct SwipeRow {
    config: SwipeConfig,
    offset: SharedOffset,
    drag: Option<DragSession>,
    settle: Option<Settle>,
    press_started: Option<Instant>,
}

impl SwipeRow {
    pub fn new(config: SwipeConfig) -> Self {
        Self {
            config,
            offset: SharedOffset::default(),
            drag: None,
            settle: None,
            press_started: None,
        }
    }

    pub fn config(&self) -> &SwipeConfig {
        &self.config
    }

    /// Read handle for the renderer
    pub fn offset(&self) -> SharedOffset {
        self.offset.clone()
    }

    pub fn current_offset(&self) -> f64 {
        self.offset.load()
    }

    pub fn state(&self) -> RowState {
        if self.drag.is_some() {
            return RowState::Dragging;
        }
        let rest = match &self.settle {
            Some(settle) => settle.to,
            None => self.offset.load(),
        };
        if rest == 0.0 { RowState::Closed } else { RowState::Open }
    }

    /// True while a settle animation or press pulse still needs frames
    pub fn is_animating(&self) -> bool {
        self.settle.is_some() || self.press_started.is_some()
    }

    /// Begin a drag. Returns false when the row has no hidden areas.
    pub fn drag_start(&mut self, now: Instant) -> bool {
        if !self.config.is_enabled() {
            return false;
        }
        // Pick up from wherever a running settle has got to
        self.tick(now);
        self.settle = None;
        self.drag = Some(DragSession {
            start_offset: self.offset.load(),
        });
        true
    }

    pub fn drag_update(&mut self, translation: f64) {
        if let Some(drag) = &self.drag {
            self.offset
                .store(self.config.clamp(drag.start_offset + translation));
        }
    }

    /// Release the drag and settle to the snap point it was heading for
    pub fn drag_end(&mut self, translation: f64, velocity: f64, now: Instant) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let position = self.config.clamp(drag.start_offset + translation);
        self.offset.store(position);

        let target = resolve_snap_point(position, velocity, &self.config.snap_points());
        self.settle_to(target, now);
    }

    /// The platform interrupted the gesture
    pub fn drag_cancel(&mut self, now: Instant) {
        self.press_started = None;
        if self.drag.take().is_some() {
            let target =
                resolve_snap_point(self.offset.load(), 0.0, &self.config.snap_points());
            self.settle_to(target, now);
        }
    }

    /// A completed tap. An open row closes instead of reporting a press.
    pub fn tap(&mut self, now: Instant) -> TapOutcome {
        if self.state() == RowState::Open {
            self.press_started = None;
            self.settle_to(0.0, now);
            TapOutcome::Closed
        } else {
            self.press_started = Some(now);
            TapOutcome::Pressed
        }
    }

    /// Tap failed or was cancelled: drop any press feedback
    pub fn cancel_tap(&mut self) {
        self.press_started = None;
    }

    /// Close the row without a gesture (e.g. after its action ran)
    pub fn close(&mut self, now: Instant) {
        self.drag = None;
        self.settle_to(0.0, now);
    }

    /// Advance animations to `now`, writing the shared offset
    pub fn tick(&mut self, now: Instant) {
        if let Some(settle) = self.settle {
            let progress = progress(settle.started, now, self.config.settle_duration);
            if progress >= 1.0 {
                self.offset.store(settle.to);
                self.settle = None;
            } else {
                let eased = ease_in_out(progress);
                self.offset
                    .store(settle.from + (settle.to - settle.from) * eased);
            }
        }

        if let Some(started) = self.press_started
            && progress(started, now, self.config.feedback_duration) >= 1.0
        {
            self.press_started = None;
        }
    }

    pub fn feedback_opacity(&self, now: Instant) -> f64 {
        let Some(started) = self.press_started else {
            return 1.0;
        };
        let t = progress(started, now, self.config.feedback_duration);
        if t >= 1.0 {
            return 1.0;
        }
        // Down to PRESSED_OPACITY at the midpoint and back
        let depth = 1.0 - (2.0 * t - 1.0).abs();
        1.0 - (1.0 - PRESSED_OPACITY) * depth
    }

    pub fn visuals(&self, now: Instant) -> RowVisuals {
        let offset = self.offset.load();
        RowVisuals {
            translation: offset,
            left: self
                .config
                .left
                .as_ref()
                .map(|area| RevealVisuals::new(area, offset.max(0.0))),
            right: self
                .config
                .right
                .as_ref()
                .map(|area| RevealVisuals::new(area, (-offset).max(0.0))),
            feedback_opacity: self.feedback_opacity(now),
        }
    }

    fn settle_to(&mut self, target: f64, now: Instant) {
        let from = self.offset.load();
        if from == target || self.config.settle_duration.is_zero() {
            self.offset.store(target);
            self.settle = None;
        } else {
            self.settle = Some(Settle {
                from,
                to: target,
                started: now,
            });
        }
    }
}

fn progress(started: Instant, now: Instant, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    now.saturating_duration_since(started).as_secs_f64() / duration.as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn delete_row() -> SwipeRow {
        SwipeRow::new(
            SwipeConfig::default()
                .with_right(HiddenArea::with_delete_button(100.0, DeleteButtonStyle::default())),
        )
    }

    fn open_row(row: &mut SwipeRow, t0: Instant) {
        assert!(row.drag_start(t0));
        row.drag_update(-80.0);
        row.drag_end(-80.0, 0.0, t0);
        row.tick(t0 + ms(300));
    }

    #[test]
    fn test_new_row_is_closed() {
        let row = delete_row();
        assert_eq!(row.state(), RowState::Closed);
        assert_eq!(row.current_offset(), 0.0);
        assert_eq!(row.config().snap_points(), vec![-100.0, 0.0]);
    }

    #[test]
    fn test_drag_opens_row() {
        let t0 = Instant::now();
        let mut row = delete_row();

        row.drag_start(t0);
        assert_eq!(row.state(), RowState::Dragging);
        row.drag_update(-70.0);
        assert_eq!(row.current_offset(), -70.0);

        row.drag_end(-70.0, 0.0, t0);
        assert_eq!(row.state(), RowState::Open);
        assert!(row.is_animating());

        row.tick(t0 + ms(150));
        let mid = row.current_offset();
        assert!(mid < -70.0 && mid > -100.0, "mid-settle offset {}", mid);

        row.tick(t0 + ms(300));
        assert_eq!(row.current_offset(), -100.0);
        assert!(!row.is_animating());
    }

    #[test]
    fn test_short_drag_settles_closed() {
        let t0 = Instant::now();
        let mut row = delete_row();
        row.drag_start(t0);
        row.drag_update(-30.0);
        row.drag_end(-30.0, 0.0, t0);
        assert_eq!(row.state(), RowState::Closed);
        row.tick(t0 + ms(400));
        assert_eq!(row.current_offset(), 0.0);
    }

    #[test]
    fn test_flick_closes_open_row() {
        let t0 = Instant::now();
        let mut row = delete_row();
        open_row(&mut row, t0);

        let t1 = t0 + ms(1000);
        row.drag_start(t1);
        row.drag_update(10.0);
        row.drag_end(10.0, 600.0, t1);
        row.tick(t1 + ms(300));
        assert_eq!(row.current_offset(), 0.0);
    }

    #[test]
    fn test_unsupported_direction_is_clamped() {
        let t0 = Instant::now();
        let mut row = delete_row();
        row.drag_start(t0);
        row.drag_update(50.0);
        assert_eq!(row.current_offset(), 0.0);
        row.drag_update(-150.0);
        assert_eq!(row.current_offset(), -150.0);
    }

    #[test]
    fn test_both_sides_allow_any_direction() {
        let t0 = Instant::now();
        let mut row = SwipeRow::new(
            SwipeConfig::default()
                .with_left(HiddenArea::new(60.0))
                .with_right(HiddenArea::new(100.0)),
        );
        assert_eq!(row.config().snap_points(), vec![-100.0, 0.0, 60.0]);

        row.drag_start(t0);
        row.drag_update(45.0);
        row.drag_end(45.0, 0.0, t0);
        row.tick(t0 + ms(300));
        assert_eq!(row.current_offset(), 60.0);
        assert_eq!(row.state(), RowState::Open);
    }

    #[test]
    fn test_disabled_row_ignores_drags() {
        let t0 = Instant::now();
        let mut row = SwipeRow::new(SwipeConfig::default());
        assert!(!row.drag_start(t0));
        row.drag_update(-80.0);
        row.drag_end(-80.0, -500.0, t0);
        assert_eq!(row.current_offset(), 0.0);
        assert_eq!(row.tap(t0), TapOutcome::Pressed);
    }

    #[test]
    fn test_tap_on_closed_row_presses() {
        let t0 = Instant::now();
        let mut row = delete_row();
        assert_eq!(row.tap(t0), TapOutcome::Pressed);

        assert_eq!(row.feedback_opacity(t0), 1.0);
        assert!((row.feedback_opacity(t0 + ms(100)) - PRESSED_OPACITY).abs() < 1e-9);
        assert_eq!(row.feedback_opacity(t0 + ms(200)), 1.0);

        row.tick(t0 + ms(200));
        assert!(!row.is_animating());
    }

    #[test]
    fn test_tap_on_open_row_closes_without_press() {
        let t0 = Instant::now();
        let mut row = delete_row();
        open_row(&mut row, t0);

        let t1 = t0 + ms(500);
        assert_eq!(row.tap(t1), TapOutcome::Closed);
        assert_eq!(row.state(), RowState::Closed);
        assert_eq!(row.feedback_opacity(t1 + ms(100)), 1.0);
        row.tick(t1 + ms(300));
        assert_eq!(row.current_offset(), 0.0);
    }

    #[test]
    fn test_drag_during_settle_starts_from_current_value() {
        let t0 = Instant::now();
        let mut row = delete_row();
        row.drag_start(t0);
        row.drag_end(-70.0, 0.0, t0);

        let t1 = t0 + ms(150);
        row.drag_start(t1);
        let picked_up = row.current_offset();
        assert!(picked_up < -70.0 && picked_up > -100.0);

        row.drag_update(5.0);
        assert!((row.current_offset() - (picked_up + 5.0)).abs() < 1e-9);

        // The superseded settle must not move the row any more
        row.tick(t0 + ms(600));
        assert!((row.current_offset() - (picked_up + 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_cancel_resets_feedback_and_settles() {
        let t0 = Instant::now();
        let mut row = delete_row();
        row.tap(t0);
        row.drag_start(t0);
        row.drag_update(-90.0);
        row.drag_cancel(t0 + ms(50));
        assert_eq!(row.feedback_opacity(t0 + ms(100)), 1.0);
        row.tick(t0 + ms(400));
        assert_eq!(row.current_offset(), -100.0);
    }

    #[test]
    fn test_cancel_tap_resets_feedback() {
        let t0 = Instant::now();
        let mut row = delete_row();
        row.tap(t0);
        row.cancel_tap();
        assert_eq!(row.feedback_opacity(t0 + ms(100)), 1.0);
    }

    #[test]
    fn test_visuals_interpolate_reveal() {
        let t0 = Instant::now();
        let mut row = delete_row();
        row.drag_start(t0);

        row.drag_update(0.0);
        let closed = row.visuals(t0).right.unwrap();
        assert_eq!(closed.width, 0.0);
        assert_eq!(closed.icon_size, Some(0.0));

        row.drag_update(-50.0);
        let half = row.visuals(t0);
        assert_eq!(half.translation, -50.0);
        let right = half.right.unwrap();
        assert_eq!(right.width, 50.0);
        assert_eq!(right.reveal_fraction, 0.5);
        assert_eq!(right.opacity, 0.75);
        assert_eq!(right.icon_size, Some(12.0));
        assert_eq!(right.font_size, Some(7.0));
        assert!(half.left.is_none());
    }

    #[test]
    fn test_delete_button_does_not_grow_past_snap_point() {
        let t0 = Instant::now();
        let mut row = delete_row();
        row.drag_start(t0);
        row.drag_update(-180.0);
        let right = row.visuals(t0).right.unwrap();
        assert_eq!(right.width, 180.0);
        assert_eq!(right.reveal_fraction, 1.0);
        assert_eq!(right.opacity, 1.0);
        assert_eq!(right.icon_size, Some(24.0));
        assert_eq!(right.font_size, Some(14.0));
    }

    #[test]
    fn test_renderer_handle_sees_updates() {
        let t0 = Instant::now();
        let mut row = delete_row();
        let handle = row.offset();
        row.drag_start(t0);
        row.drag_update(-33.0);
        assert_eq!(handle.load(), -33.0);
    }
}
