/// Pure interpolation for timed visuals.
///
/// The core never owns timing: the main loop ticks elapsed counters and
/// the renderer calls this to position the sliding banner. No coroutines,
/// no frame callbacks inside the engine.

/// Linear offset from 0 to `distance` over `duration` ticks.
/// Clamped at both ends; a zero duration jumps straight to `distance`.
pub fn slide_offset(elapsed: u32, duration: u32, distance: i32) -> i32 {
    if duration == 0 || elapsed >= duration {
        return distance;
    }
    (distance as i64 * elapsed as i64 / duration as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(slide_offset(0, 10, 40), 0);
    }

    #[test]
    fn ends_at_distance() {
        assert_eq!(slide_offset(10, 10, 40), 40);
        assert_eq!(slide_offset(25, 10, 40), 40);
    }

    #[test]
    fn midpoint_is_half() {
        assert_eq!(slide_offset(5, 10, 40), 20);
    }

    #[test]
    fn zero_duration_snaps() {
        assert_eq!(slide_offset(0, 0, 7), 7);
    }

    #[test]
    fn negative_distance_slides_down() {
        assert_eq!(slide_offset(5, 10, -40), -20);
    }
}
