use crate::ivec2::ivec2;
use crate::*;

impl Wmux {
    pub fn draw_bars(&mut self) {
        for i in 0..self.mons.len() {
            self.draw_bar(i);
        }
    }

    pub fn draw_bar(&mut self, mon_idx: usize) {
        if !self.mons[mon_idx].show_bar || self.mons[mon_idx].bar_window.0 == 0 {
            return;
        }

        let is_selmon = mon_idx == self.selected_monitor;
        let bar_wh = ivec2(self.mons[mon_idx].ww, self.bar_height);
        let barwin = self.mons[mon_idx].bar_window;
        let font_h = self.xwrapper.get_font_height() as i32;
        let boxs = font_h / 9;
        let boxw = font_h / 6 + 2;
        let lpad = (self.lr_padding / 2) as u32;

        let (mut occ, mut urg) = (0u32, 0u32);
        for handle in &self.mons[mon_idx].clients {
            if let Some(c) = self.clients.get(handle) {
                occ |= c.tags;
                if c.is_urgent {
                    urg |= c.tags;
                }
            }
        }
        let sel_tags = self.mons[mon_idx]
            .sel
            .and_then(|s| self.clients.get(&s))
            .map(|c| c.tags)
            .unwrap_or(0);

        self.xwrapper.rect(Colour::NormBg, ivec2(0, 0), bar_wh, true);

        // status first, right-aligned, selected monitor only
        let mut status_w = 0;
        if is_selmon {
            let status = self.status_text.clone();
            status_w = self.xwrapper.text_width(&status) as i32 + self.lr_padding;
            let tl = ivec2(bar_wh.x - status_w, 0);
            self.xwrapper
                .text(Colour::NormFg, tl, ivec2(status_w, bar_wh.y), lpad, &status);
        }

        // tag cells
        let mut x = 0;
        let viewed = self.mons[mon_idx].tags();
        for (i, tag) in config::TAGS.iter().enumerate() {
            let w = self.xwrapper.text_width(tag) as i32 + self.lr_padding;
            let selected = viewed & (1 << i) != 0;
            let cell = ivec2(w, bar_wh.y);
            self.xwrapper.rect(Colour::bg(selected), ivec2(x, 0), cell, true);
            self.xwrapper.text(Colour::fg(selected), ivec2(x, 0), cell, lpad, tag);
            if occ & (1 << i) != 0 {
                // filled square: the selection lives here; hollow: only
                // unselected or urgent occupants
                let filled = is_selmon && sel_tags & (1 << i) != 0 && urg & (1 << i) == 0;
                self.xwrapper.rect(
                    Colour::fg(selected),
                    ivec2(x + boxs, boxs),
                    ivec2(boxw, boxw),
                    filled,
                );
            }
            if urg & (1 << i) != 0 {
                self.xwrapper
                    .rect(Colour::UrgBorder, ivec2(x + 1, 1), cell - ivec2(2, 2), false);
            }
            x += w;
        }

        // layout symbol
        let lt_symbol = self.mons[mon_idx].lt_symbol.clone();
        let lt_w = self.xwrapper.text_width(&lt_symbol) as i32 + self.lr_padding;
        let lt_cell = ivec2(lt_w, bar_wh.y);
        self.xwrapper.rect(Colour::NormBg, ivec2(x, 0), lt_cell, true);
        self.xwrapper.text(Colour::NormFg, ivec2(x, 0), lt_cell, lpad, &lt_symbol);
        x += lt_w;

        // the selected client's title fills whatever is left
        let title_w = bar_wh.x - status_w - x;
        if title_w > self.bar_height {
            let title_cell = ivec2(title_w, bar_wh.y);
            let sel = self.mons[mon_idx]
                .sel
                .and_then(|s| self.clients.get(&s))
                .map(|c| (c.name.clone(), c.is_floating, c.is_fixed));
            match sel {
                Some((name, floating, fixed)) => {
                    self.xwrapper
                        .rect(Colour::bg(is_selmon), ivec2(x, 0), title_cell, true);
                    self.xwrapper
                        .text(Colour::fg(is_selmon), ivec2(x, 0), title_cell, lpad, &name);
                    if floating {
                        self.xwrapper.rect(
                            Colour::fg(is_selmon),
                            ivec2(x + boxs, boxs),
                            ivec2(boxw, boxw),
                            fixed,
                        );
                    }
                }
                None => {
                    self.xwrapper.rect(Colour::NormBg, ivec2(x, 0), title_cell, true);
                }
            }
        }

        self.xwrapper
            .map_drawable(barwin, 0, 0, bar_wh.x as u32, bar_wh.y as u32);
    }
}

/// Resolve a bar click to its region using the same cell widths the
/// renderer uses.
pub fn hit_test_monitor(wm: &Wmux, mon_idx: usize, x: i32) -> (Click, usize) {
    let tag_widths: Vec<i32> = config::TAGS
        .iter()
        .map(|t| wm.xwrapper.text_width(t) as i32 + wm.lr_padding)
        .collect();
    let lt_w = wm.xwrapper.text_width(&wm.mons[mon_idx].lt_symbol) as i32 + wm.lr_padding;
    let status_w = wm.xwrapper.text_width(&wm.status_text) as i32 + wm.lr_padding;
    hit_test(x, wm.mons[mon_idx].ww, &tag_widths, lt_w, status_w)
}

/// Pure region arithmetic: tags, then the layout symbol, the status on
/// the right edge, and everything between belongs to the window title
/// whether or not a client is selected.
pub(crate) fn hit_test(
    x: i32,
    ww: i32,
    tag_widths: &[i32],
    lt_symbol_w: i32,
    status_w: i32,
) -> (Click, usize) {
    let mut edge = 0;
    for (i, w) in tag_widths.iter().enumerate() {
        edge += w;
        if x < edge {
            return (Click::TagBar, i);
        }
    }
    if x < edge + lt_symbol_w {
        return (Click::LtSymbol, 0);
    }
    if x > ww - status_w {
        return (Click::StatusText, 0);
    }
    (Click::WinTitle, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAGS: [i32; 3] = [20, 20, 20];

    #[test]
    fn clicks_resolve_to_tags_in_order() {
        assert_eq!(hit_test(0, 800, &TAGS, 30, 100), (Click::TagBar, 0));
        assert_eq!(hit_test(19, 800, &TAGS, 30, 100), (Click::TagBar, 0));
        assert_eq!(hit_test(20, 800, &TAGS, 30, 100), (Click::TagBar, 1));
        assert_eq!(hit_test(59, 800, &TAGS, 30, 100), (Click::TagBar, 2));
    }

    #[test]
    fn layout_symbol_sits_after_the_tags() {
        assert_eq!(hit_test(60, 800, &TAGS, 30, 100), (Click::LtSymbol, 0));
        assert_eq!(hit_test(89, 800, &TAGS, 30, 100), (Click::LtSymbol, 0));
    }

    #[test]
    fn status_owns_the_right_edge() {
        assert_eq!(hit_test(701, 800, &TAGS, 30, 100), (Click::StatusText, 0));
        assert_eq!(hit_test(799, 800, &TAGS, 30, 100), (Click::StatusText, 0));
    }

    #[test]
    fn the_gap_belongs_to_the_title() {
        assert_eq!(hit_test(90, 800, &TAGS, 30, 100), (Click::WinTitle, 0));
        assert_eq!(hit_test(700, 800, &TAGS, 30, 100), (Click::WinTitle, 0));
    }
}
