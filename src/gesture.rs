//! Press-and-move detection for starting a drag-out
//!
//! A press on a file row arms a candidate; the drag only starts once the
//! pointer has travelled far enough on either axis, so ordinary clicks keep
//! working as selection.

use crate::config::DragOutConfig;

/// Default travel, in logical pixels, before a press becomes a drag
pub const DEFAULT_DRAG_THRESHOLD: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Drag candidate tracker for one list/tree control
#[derive(Debug)]
pub struct DragGesture<T> {
    threshold: f64,
    pending: Option<(Point, T)>,
}

impl<T> Default for DragGesture<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD)
    }
}

impl<T> DragGesture<T> {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            pending: None,
        }
    }

    /// Gesture using the configured drag threshold
    pub fn from_config(config: &DragOutConfig) -> Self {
        Self::new(config.drag_threshold)
    }

    /// Pointer pressed on `item`. Replaces any earlier candidate.
    pub fn press(&mut self, at: Point, item: T) {
        self.pending = Some((at, item));
    }

    /// Pointer moved. Returns the item once the threshold is reached; the
    /// gesture is disarmed at that point so a drag starts only once.
    pub fn moved(&mut self, to: Point) -> Option<T> {
        let (start, _) = self.pending.as_ref()?;
        let dx = (to.x - start.x).abs();
        let dy = (to.y - start.y).abs();
        if dx >= self.threshold || dy >= self.threshold {
            return self.pending.take().map(|(_, item)| item);
        }
        None
    }

    /// Pointer released or capture lost
    pub fn release(&mut self) {
        self.pending = None;
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_moves_do_not_start_drag() {
        let mut gesture = DragGesture::default();
        gesture.press(Point::new(10.0, 10.0), "A.TXT");
        assert_eq!(gesture.moved(Point::new(13.0, 7.5)), None);
        assert!(gesture.is_armed());
    }

    #[test]
    fn test_threshold_on_either_axis() {
        let mut gesture = DragGesture::default();
        gesture.press(Point::new(10.0, 10.0), "A.TXT");
        assert_eq!(gesture.moved(Point::new(10.0, 14.0)), Some("A.TXT"));
        // Fires once only
        assert_eq!(gesture.moved(Point::new(40.0, 40.0)), None);

        gesture.press(Point::new(0.0, 0.0), "B.TXT");
        assert_eq!(gesture.moved(Point::new(-4.0, 0.0)), Some("B.TXT"));
    }

    #[test]
    fn test_threshold_comes_from_config() {
        let config = DragOutConfig {
            drag_threshold: 10.0,
            ..Default::default()
        };
        let mut gesture = DragGesture::from_config(&config);
        gesture.press(Point::new(0.0, 0.0), "A.TXT");
        assert_eq!(gesture.moved(Point::new(6.0, 6.0)), None);
        assert_eq!(gesture.moved(Point::new(0.0, 10.0)), Some("A.TXT"));
    }

    #[test]
    fn test_release_disarms() {
        let mut gesture = DragGesture::new(8.0);
        gesture.press(Point::new(0.0, 0.0), 1u32);
        gesture.release();
        assert!(!gesture.is_armed());
        assert_eq!(gesture.moved(Point::new(100.0, 100.0)), None);
    }
}
