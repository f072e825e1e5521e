//! Nearest snap point for a finished drag

/// Seconds of travel a release velocity is projected forward
pub const PROJECTION_FACTOR: f64 = 0.2;

/// Pick the rest position a drag released at `position` with `velocity` settles to.
///
/// The release point is projected along the velocity so a fast flick lands
/// on the point it is heading toward. On a tie the first point in slice
/// order wins. An empty slice resolves to the closed position (0).
pub fn resolve_snap_point(position: f64, velocity: f64, snap_points: &[f64]) -> f64 {
    let projected = position + velocity * PROJECTION_FACTOR;

    let mut best: Option<(f64, f64)> = None;
    for &point in snap_points {
        let distance = (point - projected).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((point, distance)),
        }
    }

    best.map(|(point, _)| point).unwrap_or(0.0)
}
