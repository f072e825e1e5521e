//! Swipe-to-reveal rows
//!
//! A row rests at one of a few snap points (closed at 0, open at the width
//! of a hidden area). Drags move it continuously; on release it settles
//! to the snap point the drag was heading for.

pub mod offset;
pub mod row;
pub mod snap;

pub use offset::SharedOffset;
pub use row::{
    DeleteButtonStyle, HiddenArea, RevealVisuals, RowState, RowVisuals, SwipeConfig, SwipeRow,
    TapOutcome,
};
pub use snap::{resolve_snap_point, PROJECTION_FACTOR};

/// Cubic ease-in-ease-out over progress `t` in 0.0..=1.0
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let inv = -2.0 * t + 2.0;
        1.0 - inv * inv * inv / 2.0
    }
}
