use crate::monitor::Monitor;
use crate::xwrapper::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientHandle(pub x11::xlib::XID);

impl From<Window> for ClientHandle {
    fn from(w: Window) -> Self {
        ClientHandle(w.0)
    }
}

/// WM_NORMAL_HINTS as read from the client, normalised so that absent
/// fields are zero. The adjustment algorithm follows ICCCM 4.1.2.3.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizeHints {
    pub base_w: i32,
    pub base_h: i32,
    pub min_w: i32,
    pub min_h: i32,
    pub max_w: i32,
    pub max_h: i32,
    pub inc_w: i32,
    pub inc_h: i32,
    pub min_aspect: f32,
    pub max_aspect: f32,
}

impl SizeHints {
    /// Clamp a candidate size to the client's hints: aspect ratio first,
    /// then resize increments relative to the base size, then min/max.
    pub fn adjust(&self, mut w: i32, mut h: i32) -> (i32, i32) {
        let base_is_min = self.base_w == self.min_w && self.base_h == self.min_h;
        if !base_is_min {
            w -= self.base_w;
            h -= self.base_h;
        }
        if self.min_aspect > 0.0 && self.max_aspect > 0.0 {
            if self.max_aspect < w as f32 / h as f32 {
                w = (h as f32 * self.max_aspect + 0.5) as i32;
            } else if self.min_aspect < h as f32 / w as f32 {
                h = (w as f32 * self.min_aspect + 0.5) as i32;
            }
        }
        // increment calculation requires base-free dimensions
        if base_is_min {
            w -= self.base_w;
            h -= self.base_h;
        }
        if self.inc_w > 0 {
            w -= w % self.inc_w;
        }
        if self.inc_h > 0 {
            h -= h % self.inc_h;
        }
        w = (w + self.base_w).max(self.min_w);
        h = (h + self.base_h).max(self.min_h);
        if self.max_w > 0 {
            w = w.min(self.max_w);
        }
        if self.max_h > 0 {
            h = h.min(self.max_h);
        }
        (w, h)
    }

    pub fn is_fixed(&self) -> bool {
        self.max_w > 0
            && self.max_h > 0
            && self.max_w == self.min_w
            && self.max_h == self.min_h
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub oldx: i32,
    pub oldy: i32,
    pub oldw: i32,
    pub oldh: i32,
    /// Geometry stashed by minimize, restored on un-minimize.
    pub saved_x: i32,
    pub saved_y: i32,
    pub saved_w: i32,
    pub saved_h: i32,
    pub hints: SizeHints,
    pub hints_valid: bool,
    pub bw: i32,
    pub old_bw: i32,
    pub tags: u32,
    pub is_fixed: bool,
    pub is_floating: bool,
    pub is_urgent: bool,
    pub never_focus: bool,
    /// Floating flag as it was before entering fullscreen.
    pub old_floating: bool,
    pub is_fullscreen: bool,
    pub is_minimized: bool,
    pub monitor_idx: usize,
    pub win: Window,
}

impl Client {
    pub fn new(win: Window, x: i32, y: i32, w: i32, h: i32, old_bw: i32, monitor_idx: usize) -> Self {
        Client {
            name: String::new(),
            x,
            y,
            w,
            h,
            oldx: x,
            oldy: y,
            oldw: w,
            oldh: h,
            saved_x: 0,
            saved_y: 0,
            saved_w: 0,
            saved_h: 0,
            hints: SizeHints::default(),
            hints_valid: false,
            bw: 0,
            old_bw,
            tags: 0,
            is_fixed: false,
            is_floating: false,
            is_urgent: false,
            never_focus: false,
            old_floating: false,
            is_fullscreen: false,
            is_minimized: false,
            monitor_idx,
            win,
        }
    }

    pub fn handle(&self) -> ClientHandle {
        ClientHandle(self.win.0)
    }

    /// External width, border included.
    pub fn width(&self) -> i32 {
        self.w + 2 * self.bw
    }

    /// External height, border included.
    pub fn height(&self) -> i32 {
        self.h + 2 * self.bw
    }

    pub fn is_visible_on(&self, m: &Monitor) -> bool {
        (self.tags & m.tags()) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_without_hints_is_identity() {
        let hints = SizeHints::default();
        assert_eq!(hints.adjust(800, 600), (800, 600));
    }

    #[test]
    fn adjust_rounds_to_increments_over_base() {
        // a terminal: 2px base, 7x13 cells
        let hints = SizeHints {
            base_w: 2,
            base_h: 2,
            inc_w: 7,
            inc_h: 13,
            ..SizeHints::default()
        };
        let (w, h) = hints.adjust(800, 600);
        assert_eq!((w - 2) % 7, 0);
        assert_eq!((h - 2) % 13, 0);
        assert!(w <= 800 && h <= 600);
    }

    #[test]
    fn adjust_enforces_min_and_max() {
        let hints = SizeHints {
            min_w: 100,
            min_h: 50,
            max_w: 400,
            max_h: 300,
            ..SizeHints::default()
        };
        assert_eq!(hints.adjust(10, 10), (100, 50));
        assert_eq!(hints.adjust(1000, 1000), (400, 300));
    }

    #[test]
    fn adjust_enforces_aspect_ratio() {
        let hints = SizeHints {
            min_aspect: 1.0,
            max_aspect: 1.0,
            ..SizeHints::default()
        };
        // wider than 1:1 gets its width pulled in
        let (w, h) = hints.adjust(800, 400);
        assert_eq!((w, h), (400, 400));
        // taller than 1:1 gets its height pulled in
        let (w, h) = hints.adjust(400, 800);
        assert_eq!((w, h), (400, 400));
    }

    #[test]
    fn adjust_is_idempotent() {
        let hints = SizeHints {
            base_w: 4,
            base_h: 4,
            min_w: 120,
            min_h: 90,
            max_w: 1600,
            max_h: 1200,
            inc_w: 8,
            inc_h: 16,
            min_aspect: 0.5,
            max_aspect: 2.0,
            ..SizeHints::default()
        };
        let first = hints.adjust(777, 555);
        let second = hints.adjust(first.0, first.1);
        assert_eq!(first, second);
    }

    #[test]
    fn fixed_requires_equal_min_max() {
        let fixed = SizeHints {
            min_w: 200,
            min_h: 100,
            max_w: 200,
            max_h: 100,
            ..SizeHints::default()
        };
        assert!(fixed.is_fixed());
        let free = SizeHints {
            min_w: 200,
            min_h: 100,
            max_w: 400,
            max_h: 100,
            ..SizeHints::default()
        };
        assert!(!free.is_fixed());
        assert!(!SizeHints::default().is_fixed());
    }
}
