//! Pure layout math: deterministic, no I/O. Targets are computed against the
//! work area and applied by the orchestrator.

use crate::Rect;

/// Cascade: window *i* is the base rect shifted by `(i*dx, i*dy)`, clamped per
/// axis so it stays inside `work`. Width and height are never changed. When the
/// base is larger than the work area the clamp range is inverted and the lower
/// bound wins, pinning the window to the work-area origin on that axis.
pub fn cascade(work: Rect, base: Rect, count: usize, dx: i32, dy: i32) -> Vec<Rect> {
    let mut rects = Vec::with_capacity(count);
    for i in 0..count as i32 {
        let x = clamp_low_wins(base.x + i * dx, work.x, work.right() - base.w);
        let y = clamp_low_wins(base.y + i * dy, work.y, work.bottom() - base.h);
        rects.push(Rect::new(x, y, base.w, base.h));
    }
    rects
}

/// Tile: row-major grid of `ceil(sqrt(count))` columns. Cells are the work area
/// divided evenly (floored, minimum 1px); each window is shrunk to its cell but
/// never upscaled beyond the base size, and sits at its cell's top-left.
pub fn tile(work: Rect, base: Rect, count: usize) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }

    let cols = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);
    let cell_w = (work.w / cols as i32).max(1);
    let cell_h = (work.h / rows as i32).max(1);
    let w = base.w.min(cell_w);
    let h = base.h.min(cell_h);

    let mut rects = Vec::with_capacity(count);
    for i in 0..count {
        let row = (i / cols) as i32;
        let col = (i % cols) as i32;
        rects.push(Rect::new(work.x + col * cell_w, work.y + row * cell_h, w, h));
    }
    rects
}

fn clamp_low_wins(v: i32, low: i32, high: i32) -> i32 {
    v.min(high).max(low)
}
