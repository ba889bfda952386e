use std::ffi::CString;
use std::os::raw::c_char;

use x11::xlib;

use crate::config::SNAP;
use crate::*;

#[derive(Clone, Debug)]
pub enum Action {
    Spawn(Command),
    ToggleBar,
    FocusStack(i32),
    IncNMaster(i32),
    SetMFact(f32),
    Zoom,
    /// View the given tag mask; 0 flips back to the previous tagset.
    View(u32),
    KillClient,
    /// None cycles between the two assigned layouts.
    SetLayout(Option<&'static Layout>),
    ToggleFloating,
    ToggleMinimize,
    Tag(u32),
    ToggleView(u32),
    ToggleTag(u32),
    CycleTag(i32),
    FocusMon(i32),
    TagMon(i32),
    MoveMouse,
    ResizeMouse,
    Quit,
}

impl Action {
    pub fn execute(&self, state: &mut Wmux) {
        match self {
            Action::Spawn(cmd) => {
                state.spawn(*cmd);
            }
            Action::ToggleBar => {
                let selmon_idx = state.selected_monitor;
                let bh = state.bar_height;
                let (wx, by, ww, barwin) = {
                    let m = &mut state.mons[selmon_idx];
                    m.show_bar = !m.show_bar;
                    m.update_bar_pos(bh);
                    (m.wx, m.by, m.ww, m.bar_window)
                };
                state
                    .xwrapper
                    .move_resize_window(barwin, wx, by, ww as u32, bh as u32);
                state.arrange(Some(selmon_idx));
            }
            Action::FocusStack(dir) => {
                state.focus_stack(*dir);
            }
            Action::IncNMaster(i) => {
                let selmon_idx = state.selected_monitor;
                let m = &mut state.mons[selmon_idx];
                m.nmaster = (m.nmaster + i).max(0);
                state.arrange(Some(selmon_idx));
            }
            Action::SetMFact(f) => {
                let selmon_idx = state.selected_monitor;
                let m = &mut state.mons[selmon_idx];
                if m.layout().arrange.is_none() {
                    return;
                }
                // values above 1.0 set mfact absolutely
                let new_f = if *f < 1.0 { *f + m.mfact } else { *f - 1.0 };
                if !(0.05..=0.95).contains(&new_f) {
                    return;
                }
                m.mfact = new_f;
                state.arrange(Some(selmon_idx));
            }
            Action::Zoom => {
                let selmon_idx = state.selected_monitor;
                let sel = match state.mons[selmon_idx].sel {
                    Some(s) => s,
                    None => return,
                };
                let mon = &state.mons[selmon_idx];
                if mon.layout().arrange.is_none() || state.clients[&sel].is_floating {
                    return;
                }
                let tiled: Vec<ClientHandle> = mon
                    .clients
                    .iter()
                    .filter(|h| {
                        state
                            .clients
                            .get(h)
                            .map_or(false, |c| !c.is_floating && c.is_visible_on(mon))
                    })
                    .cloned()
                    .collect();
                // zooming the master swaps it with the next tiled client
                let target = if tiled.first() == Some(&sel) {
                    match tiled.get(1) {
                        Some(&h) => h,
                        None => return,
                    }
                } else {
                    sel
                };
                state.pop(target);
            }
            Action::View(mask) => {
                state.view(*mask);
            }
            Action::KillClient => {
                state.kill_client();
            }
            Action::SetLayout(l) => {
                let selmon_idx = state.selected_monitor;
                let same = match l {
                    Some(lt) => std::ptr::eq(*lt, state.mons[selmon_idx].layout()),
                    None => false,
                };
                if !same {
                    let m = &mut state.mons[selmon_idx];
                    m.selected_lt ^= 1;
                }
                if let Some(lt) = l {
                    let m = &mut state.mons[selmon_idx];
                    m.lt[m.selected_lt] = *lt;
                }
                let has_sel = {
                    let m = &mut state.mons[selmon_idx];
                    m.lt_symbol = m.layout().symbol.to_string();
                    m.sel.is_some()
                };
                if has_sel {
                    state.arrange(Some(selmon_idx));
                } else {
                    state.draw_bar(selmon_idx);
                }
            }
            Action::ToggleFloating => {
                state.toggle_floating();
            }
            Action::ToggleMinimize => {
                if let Some(sel) = state.mons[state.selected_monitor].sel {
                    if state.clients[&sel].is_minimized {
                        state.restore(sel);
                    } else {
                        state.minimize(sel);
                    }
                }
            }
            Action::Tag(mask) => {
                let selmon_idx = state.selected_monitor;
                if let Some(sel) = state.mons[selmon_idx].sel {
                    if mask & config::TAG_MASK != 0 {
                        state.clients.get_mut(&sel).unwrap().tags = mask & config::TAG_MASK;
                        state.focus(None);
                        state.arrange(Some(selmon_idx));
                    }
                }
            }
            Action::ToggleView(mask) => {
                let selmon_idx = state.selected_monitor;
                let m = &mut state.mons[selmon_idx];
                let newtagset = m.tags() ^ (mask & config::TAG_MASK);
                if newtagset != 0 {
                    m.tagset[m.selected_tags] = newtagset;
                    state.focus(None);
                    state.arrange(Some(selmon_idx));
                }
            }
            Action::ToggleTag(mask) => {
                let selmon_idx = state.selected_monitor;
                if let Some(sel) = state.mons[selmon_idx].sel {
                    let newtags = state.clients[&sel].tags ^ (mask & config::TAG_MASK);
                    if newtags != 0 {
                        state.clients.get_mut(&sel).unwrap().tags = newtags;
                        state.focus(None);
                        state.arrange(Some(selmon_idx));
                    }
                }
            }
            Action::CycleTag(dir) => {
                let tagset = state.mons[state.selected_monitor].tags();
                if tagset.count_ones() != 1 {
                    return;
                }
                let num_tags = config::TAGS.len() as i32;
                let cur = tagset.trailing_zeros() as i32;
                let next = (cur + dir + num_tags) % num_tags;
                state.view(1 << next);
            }
            Action::FocusMon(dir) => {
                if state.mons.len() <= 1 {
                    return;
                }
                let m = state.dir_to_monitor(*dir);
                if m == state.selected_monitor {
                    return;
                }
                if let Some(sel) = state.mons[state.selected_monitor].sel {
                    state.unfocus(sel, false);
                }
                state.selected_monitor = m;
                state.focus(None);
            }
            Action::TagMon(dir) => {
                if state.mons.len() <= 1 {
                    return;
                }
                if let Some(sel) = state.mons[state.selected_monitor].sel {
                    let target = state.dir_to_monitor(*dir);
                    state.send_to_monitor(sel, target);
                }
            }
            Action::MoveMouse => {
                state.move_mouse();
            }
            Action::ResizeMouse => {
                state.resize_mouse();
            }
            Action::Quit => {
                state.running = false;
            }
        }
    }
}

impl Wmux {
    /// Fork/exec per the usual WM contract: the child drops the X
    /// connection, detaches from our session and gets default SIGCHLD
    /// back before execvp.
    pub fn spawn(&mut self, cmd: Command) {
        let argv = cmd.argv(self.mons[self.selected_monitor].num);
        log::info!("spawning {:?}", argv);
        unsafe {
            if libc::fork() == 0 {
                libc::close(self.xwrapper.connection_fd());
                libc::setsid();
                libc::signal(libc::SIGCHLD, libc::SIG_DFL);

                let cstrs: Vec<CString> = argv
                    .iter()
                    .map(|a| CString::new(a.as_str()).unwrap())
                    .collect();
                let mut ptrs: Vec<*const c_char> =
                    cstrs.iter().map(|c| c.as_ptr()).collect();
                ptrs.push(std::ptr::null());

                libc::execvp(ptrs[0], ptrs.as_ptr());
                eprintln!("wmux: execvp '{}' failed", argv[0]);
                libc::_exit(1);
            }
        }
    }

    pub fn toggle_floating(&mut self) {
        let selmon_idx = self.selected_monitor;
        let sel = match self.mons[selmon_idx].sel {
            Some(s) => s,
            None => return,
        };
        let (fullscreen, fixed, floating) = {
            let c = &self.clients[&sel];
            (c.is_fullscreen, c.is_fixed, c.is_floating)
        };
        if fullscreen {
            return;
        }
        let new_floating = !floating || fixed;
        self.clients.get_mut(&sel).unwrap().is_floating = new_floating;
        if new_floating {
            let (x, y, w, h) = {
                let c = &self.clients[&sel];
                (c.x, c.y, c.w, c.h)
            };
            self.resize(sel, x, y, w, h, false);
        }
        self.arrange(Some(selmon_idx));
    }

    pub fn kill_client(&mut self) {
        let sel = match self.mons[self.selected_monitor].sel {
            Some(s) => s,
            None => return,
        };
        let win = self.clients[&sel].win;
        if !self
            .xwrapper
            .send_event(win, self.xwrapper.atoms.get(Atom::Wm(WM::Delete)))
        {
            self.xwrapper.grab_server();
            self.xwrapper.set_ignore_error_handler();
            self.xwrapper.set_close_down_mode(xlib::DestroyAll);
            self.xwrapper.kill_client(win);
            self.xwrapper.sync(false);
            self.xwrapper.set_default_error_handler();
            self.xwrapper.ungrab_server();
        }
    }

    /// Modal pointer-driven move. Motion is throttled to 60 Hz, edges
    /// snap to the working area and to other clients, and dragging a
    /// tiled client far enough un-tiles it.
    pub fn move_mouse(&mut self) {
        let selmon_idx = self.selected_monitor;
        let sel = match self.mons[selmon_idx].sel {
            Some(s) => s,
            None => return,
        };
        if self.clients[&sel].is_fullscreen {
            return;
        }
        self.restack(selmon_idx);
        let (ocx, ocy) = {
            let c = &self.clients[&sel];
            (c.x, c.y)
        };
        if !self.xwrapper.grab_pointer(self.cursor[CursorType::Move as usize]) {
            return;
        }
        let (px, py) = match self.xwrapper.query_pointer_position() {
            Some(p) => p,
            None => {
                self.xwrapper.ungrab_pointer();
                return;
            }
        };

        let mut last_time: xlib::Time = 0;
        loop {
            let ev = self
                .xwrapper
                .mask_event(MOUSE_MASK | xlib::ExposureMask | xlib::SubstructureRedirectMask);
            match ev.get_type() {
                xlib::ConfigureRequest | xlib::Expose | xlib::MapRequest => {
                    events::dispatch(self, &ev);
                }
                xlib::MotionNotify => {
                    let mev = unsafe { ev.motion };
                    if mev.time.wrapping_sub(last_time) <= 1000 / 60 {
                        continue;
                    }
                    last_time = mev.time;
                    if self.clients.get(&sel).is_none() {
                        break;
                    }

                    let mut nx = ocx + (mev.x - px);
                    let mut ny = ocy + (mev.y - py);
                    let (wx, wy, ww, wh) = {
                        let m = &self.mons[selmon_idx];
                        (m.wx, m.wy, m.ww, m.wh)
                    };
                    let (cw, ch, cx, cy, ext_w, ext_h, floating) = {
                        let c = &self.clients[&sel];
                        (c.w, c.h, c.x, c.y, c.width(), c.height(), c.is_floating)
                    };

                    if (wx - nx).abs() < SNAP {
                        nx = wx;
                    } else if ((wx + ww) - (nx + ext_w)).abs() < SNAP {
                        nx = wx + ww - ext_w;
                    }
                    if (wy - ny).abs() < SNAP {
                        ny = wy;
                    } else if ((wy + wh) - (ny + ext_h)).abs() < SNAP {
                        ny = wy + wh - ext_h;
                    }

                    let neighbours: Vec<(i32, i32, i32, i32)> = {
                        let mon = &self.mons[selmon_idx];
                        mon.clients
                            .iter()
                            .filter(|&&h| h != sel)
                            .filter_map(|h| self.clients.get(h))
                            .filter(|d| d.is_visible_on(mon))
                            .map(|d| (d.x, d.y, d.width(), d.height()))
                            .collect()
                    };
                    for (dx, dy, dw, dh) in neighbours {
                        for edge in [dx, dx + dw] {
                            if (edge - nx).abs() < SNAP {
                                nx = edge;
                            }
                            if (edge - (nx + ext_w)).abs() < SNAP {
                                nx = edge - ext_w;
                            }
                        }
                        for edge in [dy, dy + dh] {
                            if (edge - ny).abs() < SNAP {
                                ny = edge;
                            }
                            if (edge - (ny + ext_h)).abs() < SNAP {
                                ny = edge - ext_h;
                            }
                        }
                    }

                    let tiled_layout = self.mons[selmon_idx].layout().arrange.is_some();
                    if !floating
                        && tiled_layout
                        && ((nx - cx).abs() > SNAP || (ny - cy).abs() > SNAP)
                    {
                        self.toggle_floating();
                    }
                    if !tiled_layout || self.clients[&sel].is_floating {
                        self.resize(sel, nx, ny, cw, ch, true);
                    }
                }
                xlib::ButtonRelease => break,
                _ => {}
            }
        }
        self.xwrapper.ungrab_pointer();

        if let Some(c) = self.clients.get(&sel) {
            let (x, y, w, h) = (c.x, c.y, c.w, c.h);
            let m = self.rect_to_monitor(x, y, w, h);
            if m != self.selected_monitor {
                self.send_to_monitor(sel, m);
                self.selected_monitor = m;
                self.focus(None);
            }
        }
    }

    /// Modal pointer-driven resize from the bottom-right corner.
    pub fn resize_mouse(&mut self) {
        let selmon_idx = self.selected_monitor;
        let sel = match self.mons[selmon_idx].sel {
            Some(s) => s,
            None => return,
        };
        if self.clients[&sel].is_fullscreen {
            return;
        }
        self.restack(selmon_idx);
        let (ocx, ocy, win) = {
            let c = &self.clients[&sel];
            (c.x, c.y, c.win)
        };
        if !self.xwrapper.grab_pointer(self.cursor[CursorType::Resize as usize]) {
            return;
        }
        {
            let c = &self.clients[&sel];
            self.xwrapper.warp_pointer(win, c.w + c.bw - 1, c.h + c.bw - 1);
        }

        let mut last_time: xlib::Time = 0;
        loop {
            let ev = self
                .xwrapper
                .mask_event(MOUSE_MASK | xlib::ExposureMask | xlib::SubstructureRedirectMask);
            match ev.get_type() {
                xlib::ConfigureRequest | xlib::Expose | xlib::MapRequest => {
                    events::dispatch(self, &ev);
                }
                xlib::MotionNotify => {
                    let mev = unsafe { ev.motion };
                    if mev.time.wrapping_sub(last_time) <= 1000 / 60 {
                        continue;
                    }
                    last_time = mev.time;
                    if self.clients.get(&sel).is_none() {
                        break;
                    }

                    let (bw, cw, ch, floating, cmon_idx) = {
                        let c = &self.clients[&sel];
                        (c.bw, c.w, c.h, c.is_floating, c.monitor_idx)
                    };
                    let nw = (mev.x - ocx - 2 * bw + 1).max(1);
                    let nh = (mev.y - ocy - 2 * bw + 1).max(1);

                    let within_monitor = {
                        let m = &self.mons[selmon_idx];
                        let cm = &self.mons[cmon_idx];
                        cm.wx + nw >= m.wx
                            && cm.wx + nw <= m.wx + m.ww
                            && cm.wy + nh >= m.wy
                            && cm.wy + nh <= m.wy + m.wh
                    };
                    let tiled_layout = self.mons[selmon_idx].layout().arrange.is_some();
                    if within_monitor
                        && !floating
                        && tiled_layout
                        && ((nw - cw).abs() > SNAP || (nh - ch).abs() > SNAP)
                    {
                        self.toggle_floating();
                    }
                    if !tiled_layout || self.clients[&sel].is_floating {
                        let (x, y) = {
                            let c = &self.clients[&sel];
                            (c.x, c.y)
                        };
                        self.resize(sel, x, y, nw, nh, true);
                    }
                }
                xlib::ButtonRelease => break,
                _ => {}
            }
        }
        if let Some(c) = self.clients.get(&sel) {
            self.xwrapper.warp_pointer(win, c.w + c.bw - 1, c.h + c.bw - 1);
        }
        self.xwrapper.ungrab_pointer();
        while self.xwrapper.check_mask_event(xlib::EnterWindowMask).is_some() {}

        if let Some(c) = self.clients.get(&sel) {
            let (x, y, w, h) = (c.x, c.y, c.w, c.h);
            let m = self.rect_to_monitor(x, y, w, h);
            if m != self.selected_monitor {
                self.send_to_monitor(sel, m);
                self.selected_monitor = m;
                self.focus(None);
            }
        }
    }
}
