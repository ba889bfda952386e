use crate::client::ClientHandle;
use crate::config;
use crate::layouts::{Layout, LAYOUTS};
use crate::xwrapper::Window;

#[derive(Debug, Clone)]
pub struct Monitor {
    pub num: i32,
    pub lt_symbol: String,
    pub mfact: f32,
    pub nmaster: i32,
    pub by: i32,
    /// Output rectangle as reported by Xinerama.
    pub mx: i32,
    pub my: i32,
    pub mw: i32,
    pub mh: i32,
    /// Working area: output minus the bar strip.
    pub wx: i32,
    pub wy: i32,
    pub ww: i32,
    pub wh: i32,
    pub selected_tags: usize,
    pub selected_lt: usize,
    pub tagset: [u32; 2],
    pub show_bar: bool,
    pub top_bar: bool,
    /// Client order list, most recently managed at the head.
    pub clients: Vec<ClientHandle>,
    /// Focus history, most recently focused at the head.
    pub stack: Vec<ClientHandle>,
    pub sel: Option<ClientHandle>,
    pub bar_window: Window,
    pub lt: [&'static Layout; 2],
}

impl Monitor {
    pub fn new(num: i32) -> Self {
        Monitor {
            num,
            lt_symbol: LAYOUTS[0].symbol.to_string(),
            mfact: config::MFACT,
            nmaster: config::NMASTER,
            by: 0,
            mx: 0,
            my: 0,
            mw: 0,
            mh: 0,
            wx: 0,
            wy: 0,
            ww: 0,
            wh: 0,
            selected_tags: 0,
            selected_lt: 0,
            tagset: [1, 1],
            show_bar: config::SHOW_BAR,
            top_bar: config::TOP_BAR,
            clients: Vec::new(),
            stack: Vec::new(),
            sel: None,
            bar_window: Window(0),
            lt: [&LAYOUTS[0], &LAYOUTS[1 % LAYOUTS.len()]],
        }
    }

    /// The currently viewed tag mask.
    pub fn tags(&self) -> u32 {
        self.tagset[self.selected_tags]
    }

    pub fn layout(&self) -> &'static Layout {
        self.lt[self.selected_lt]
    }

    /// Recompute the working area and bar position from the output
    /// rectangle and the bar visibility flags.
    pub fn update_bar_pos(&mut self, bar_height: i32) {
        self.wy = self.my;
        self.wh = self.mh;
        if self.show_bar {
            self.wh -= bar_height;
            self.by = if self.top_bar { self.wy } else { self.wy + self.wh };
            self.wy = if self.top_bar { self.wy + bar_height } else { self.wy };
        } else {
            self.by = -bar_height;
        }
    }

    /// Area of the intersection between a rectangle and the working area.
    pub fn intersect_area(&self, x: i32, y: i32, w: i32, h: i32) -> i32 {
        ((x + w).min(self.wx + self.ww) - x.max(self.wx)).max(0)
            * ((y + h).min(self.wy + self.wh) - y.max(self.wy)).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor_1080p() -> Monitor {
        let mut m = Monitor::new(0);
        m.mx = 0;
        m.my = 0;
        m.mw = 1920;
        m.mh = 1080;
        m
    }

    #[test]
    fn top_bar_shrinks_working_area_from_above() {
        let mut m = monitor_1080p();
        m.show_bar = true;
        m.top_bar = true;
        m.update_bar_pos(18);
        assert_eq!(m.by, 0);
        assert_eq!(m.wy, 18);
        assert_eq!(m.wh, 1062);
    }

    #[test]
    fn bottom_bar_shrinks_working_area_from_below() {
        let mut m = monitor_1080p();
        m.show_bar = true;
        m.top_bar = false;
        m.update_bar_pos(18);
        assert_eq!(m.by, 1062);
        assert_eq!(m.wy, 0);
        assert_eq!(m.wh, 1062);
    }

    #[test]
    fn hidden_bar_parks_off_screen() {
        let mut m = monitor_1080p();
        m.show_bar = false;
        m.update_bar_pos(18);
        assert_eq!(m.by, -18);
        assert_eq!(m.wy, 0);
        assert_eq!(m.wh, 1080);
    }

    #[test]
    fn intersect_area_clips_to_working_area() {
        let mut m = monitor_1080p();
        m.update_bar_pos(18);
        assert_eq!(m.intersect_area(0, 18, 100, 100), 100 * 100);
        // straddles the left edge
        assert_eq!(m.intersect_area(-50, 18, 100, 100), 50 * 100);
        // fully outside
        assert_eq!(m.intersect_area(-200, 18, 100, 100), 0);
    }
}
