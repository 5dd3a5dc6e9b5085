//! Drag rectangle geometry

use capture_x11::{Point, Rect};

/// Calculate selection rectangle from the anchor and the current pointer
pub fn normalize(anchor: Point, pointer: Point) -> Rect {
    let x = anchor.x.min(pointer.x);
    let y = anchor.y.min(pointer.y);
    let width = (pointer.x - anchor.x).unsigned_abs();
    let height = (pointer.y - anchor.y).unsigned_abs();

    Rect::new(x, y, width, height)
}

/// A finalized selection needs a non-zero area
pub fn is_valid_selection(rect: &Rect) -> bool {
    !rect.is_empty()
}

/// Rectangle tracked during one drag.
///
/// Every update rebuilds the rectangle from the anchor; the previous value is
/// never adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionModel {
    anchor: Point,
    rect: Rect,
}

impl RegionModel {
    /// Start a zero-area rectangle at `anchor`
    pub fn begin(anchor: Point) -> Self {
        Self {
            anchor,
            rect: Rect::new(anchor.x, anchor.y, 0, 0),
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn update(&mut self, pointer: Point) -> Rect {
        self.rect = normalize(self.anchor, pointer);
        self.rect
    }

    /// Freeze the rectangle at the release position
    pub fn finalize(mut self, pointer: Point) -> Rect {
        self.update(pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_up_left_and_down_right_agree() {
        let up_left = normalize(Point::new(100, 100), Point::new(50, 50));
        let down_right = normalize(Point::new(50, 50), Point::new(100, 100));
        assert_eq!(up_left, Rect::new(50, 50, 50, 50));
        assert_eq!(up_left, down_right);
    }

    #[test]
    fn mixed_quadrants() {
        assert_eq!(
            normalize(Point::new(10, 80), Point::new(40, 20)),
            Rect::new(10, 20, 30, 60)
        );
        assert_eq!(
            normalize(Point::new(-20, 5), Point::new(-50, 9)),
            Rect::new(-50, 5, 30, 4)
        );
    }

    #[test]
    fn normalize_matches_min_and_abs_for_all_points() {
        let coords = [-7, 0, 3, 50, 100, 1919];
        for &ax in &coords {
            for &ay in &coords {
                for &rx in &coords {
                    for &ry in &coords {
                        let rect = normalize(Point::new(ax, ay), Point::new(rx, ry));
                        assert_eq!(rect.x, ax.min(rx));
                        assert_eq!(rect.y, ay.min(ry));
                        assert_eq!(rect.width, (rx - ax).unsigned_abs());
                        assert_eq!(rect.height, (ry - ay).unsigned_abs());
                    }
                }
            }
        }
    }

    #[test]
    fn reversing_direction_does_not_drift() {
        let mut model = RegionModel::begin(Point::new(100, 100));
        model.update(Point::new(150, 160));
        model.update(Point::new(40, 30));
        model.update(Point::new(120, 90));
        assert_eq!(model.rect(), Rect::new(100, 90, 20, 10));
        assert_eq!(model.update(Point::new(100, 100)), Rect::new(100, 100, 0, 0));
    }

    #[test]
    fn begins_with_zero_area_at_anchor() {
        let model = RegionModel::begin(Point::new(12, 34));
        assert_eq!(model.rect(), Rect::new(12, 34, 0, 0));
        assert!(!is_valid_selection(&model.rect()));
    }

    #[test]
    fn finalize_uses_release_point() {
        let mut model = RegionModel::begin(Point::new(0, 0));
        model.update(Point::new(10, 10));
        assert_eq!(model.finalize(Point::new(12, 11)), Rect::new(0, 0, 12, 11));
    }
}
