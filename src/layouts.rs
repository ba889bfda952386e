use crate::client::ClientHandle;
use crate::state::Wmux;

#[derive(Debug)]
pub struct Layout {
    pub symbol: &'static str,
    pub arrange: Option<fn(&mut Wmux, usize)>,
}

pub static LAYOUTS: [Layout; 3] = [
    Layout {
        symbol: "[]=",
        arrange: Some(tile),
    },
    Layout {
        symbol: "><>",
        arrange: None,
    },
    Layout {
        symbol: "[M]",
        arrange: Some(monocle),
    },
];

/// Width of the master column. Zero when there is no master area at all,
/// the full working width while every client still fits in it.
pub(crate) fn master_width(ww: i32, n: usize, nmaster: i32, mfact: f32) -> i32 {
    if n > nmaster.max(0) as usize {
        if nmaster > 0 {
            (ww as f32 * mfact) as i32
        } else {
            0
        }
    } else {
        ww
    }
}

/// (y offset, height) for each row of a column of `rows` windows stacked
/// into `wh` pixels. Integer division pushes the remainder into the last
/// row.
pub(crate) fn column_slots(wh: i32, rows: usize) -> Vec<(i32, i32)> {
    let mut slots = Vec::with_capacity(rows);
    let mut off = 0;
    for i in 0..rows {
        let h = (wh - off) / (rows - i) as i32;
        slots.push((off, h));
        if off + h < wh {
            off += h;
        }
    }
    slots
}

fn visible_tiled(wm: &Wmux, mon_idx: usize) -> Vec<ClientHandle> {
    let mon = &wm.mons[mon_idx];
    mon.clients
        .iter()
        .filter(|h| {
            wm.clients
                .get(h)
                .map_or(false, |c| !c.is_floating && c.is_visible_on(mon))
        })
        .cloned()
        .collect()
}

fn tile(wm: &mut Wmux, mon_idx: usize) {
    let tiled = visible_tiled(wm, mon_idx);
    let n = tiled.len();
    if n == 0 {
        return;
    }

    let (wx, wy, ww, wh, nmaster, mfact) = {
        let mon = &wm.mons[mon_idx];
        (mon.wx, mon.wy, mon.ww, mon.wh, mon.nmaster.max(0), mon.mfact)
    };

    let mw = master_width(ww, n, nmaster, mfact);
    let mrows = n.min(nmaster as usize);
    let master = column_slots(wh, mrows);
    let stack = column_slots(wh, n - mrows);

    for (i, &handle) in tiled.iter().enumerate() {
        let bw = wm.clients[&handle].bw;
        if i < mrows {
            let (my, h) = master[i];
            wm.resize(handle, wx, wy + my, mw - 2 * bw, h - 2 * bw, false);
        } else {
            let (ty, h) = stack[i - mrows];
            wm.resize(handle, wx + mw, wy + ty, ww - mw - 2 * bw, h - 2 * bw, false);
        }
    }
}

fn monocle(wm: &mut Wmux, mon_idx: usize) {
    let visible = {
        let mon = &wm.mons[mon_idx];
        mon.clients
            .iter()
            .filter(|h| wm.clients.get(h).map_or(false, |c| c.is_visible_on(mon)))
            .count()
    };
    if visible > 0 {
        wm.mons[mon_idx].lt_symbol = format!("[{}]", visible);
    }

    let (wx, wy, ww, wh) = {
        let mon = &wm.mons[mon_idx];
        (mon.wx, mon.wy, mon.ww, mon.wh)
    };
    for handle in visible_tiled(wm, mon_idx) {
        let bw = wm.clients[&handle].bw;
        wm.resize(handle, wx, wy, ww - 2 * bw, wh - 2 * bw, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_takes_mfact_of_the_width() {
        assert_eq!(master_width(1920, 3, 1, 0.55), 1056);
    }

    #[test]
    fn no_master_means_pure_stack() {
        assert_eq!(master_width(1920, 3, 0, 0.55), 0);
    }

    #[test]
    fn few_clients_fill_the_full_width() {
        assert_eq!(master_width(1920, 1, 1, 0.55), 1920);
        assert_eq!(master_width(1920, 2, 2, 0.55), 1920);
    }

    #[test]
    fn column_splits_evenly() {
        assert_eq!(column_slots(1038, 2), vec![(0, 519), (519, 519)]);
    }

    #[test]
    fn column_remainder_lands_in_the_last_row() {
        assert_eq!(column_slots(1039, 2), vec![(0, 519), (519, 520)]);
        assert_eq!(column_slots(100, 3), vec![(0, 33), (33, 33), (66, 34)]);
    }

    #[test]
    fn single_row_spans_the_column() {
        assert_eq!(column_slots(1062, 1), vec![(0, 1062)]);
    }

    // 1920x1080, bar 18px, mfact 0.55, nmaster 1, three tiled clients:
    // master 1056 wide, two stacked rows of 531
    #[test]
    fn three_clients_master_stack_geometry() {
        let wh = 1080 - 18;
        assert_eq!(master_width(1920, 3, 1, 0.55), 1056);
        assert_eq!(column_slots(wh, 1), vec![(0, 1062)]);
        assert_eq!(column_slots(wh, 2), vec![(0, 531), (531, 531)]);
    }
}
