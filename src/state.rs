use std::collections::HashMap;
use std::ffi::CString;
use std::os::raw::c_int;

use x11::xlib;

use crate::*;

// Global state, threaded explicitly through every handler.
pub struct Wmux {
    pub status_text: String,
    pub screen: c_int,
    pub screen_width: c_int,
    pub screen_height: c_int,
    pub bar_height: c_int,
    pub lr_padding: c_int,
    pub numlock_mask: u32,
    pub running: bool,
    pub cursor: [CursorId; CursorType::Last as usize],
    pub xwrapper: XWrapper,
    pub mons: Vec<Monitor>,
    pub selected_monitor: usize,
    /// Monitor the pointer was last seen on, for root MotionNotify.
    pub motion_monitor: Option<usize>,
    pub root: Window,
    pub wm_check_window: Window,
    pub clients: HashMap<ClientHandle, Client>,
}

impl Wmux {
    pub fn new() -> Result<Wmux, WmuxError> {
        let mut xwrapper = XWrapper::connect()?;
        unsafe {
            let locale = CString::new("").unwrap();
            if libc::setlocale(libc::LC_CTYPE, locale.as_ptr()).is_null()
                || !xwrapper.supports_locale()
            {
                log::warn!("no locale support");
            }
        }
        xwrapper.check_for_other_wm()?;
        xwrapper.set_default_error_handler();

        let mut state = Wmux {
            status_text: String::new(),
            screen: 0,
            screen_width: 0,
            screen_height: 0,
            bar_height: 0,
            lr_padding: 0,
            numlock_mask: 0,
            running: true,
            cursor: [CursorId(0); CursorType::Last as usize],
            xwrapper,
            mons: Vec::new(),
            selected_monitor: 0,
            motion_monitor: None,
            root: Window(0),
            wm_check_window: Window(0),
            clients: HashMap::new(),
        };

        state.setup()?;
        Ok(state)
    }

    fn setup(&mut self) -> Result<(), WmuxError> {
        // do not transform children into zombies when they terminate,
        // and reap any inherited from .xinitrc immediately
        unsafe {
            let mut sa: libc::sigaction = std::mem::zeroed();
            libc::sigemptyset(&mut sa.sa_mask);
            sa.sa_flags = libc::SA_NOCLDSTOP | libc::SA_NOCLDWAIT | libc::SA_RESTART;
            sa.sa_sigaction = libc::SIG_IGN;
            libc::sigaction(libc::SIGCHLD, &sa, std::ptr::null_mut());
            while libc::waitpid(-1, std::ptr::null_mut(), libc::WNOHANG) > 0 {}
        }

        self.screen = self.xwrapper.default_screen();
        self.screen_width = self.xwrapper.display_width(self.screen);
        self.screen_height = self.xwrapper.display_height(self.screen);
        self.root = self.xwrapper.root_window(self.screen);

        if !self.xwrapper.fontset_create(&config::FONTS) {
            return Err(WmuxError::NoFonts);
        }
        let font_h = self.xwrapper.get_font_height() as i32;
        self.lr_padding = font_h;
        self.bar_height = font_h + 2;

        self.update_geom();

        self.cursor[CursorType::Normal as usize] = self.xwrapper.create_font_cursor_as_id(68);
        self.cursor[CursorType::Resize as usize] = self.xwrapper.create_font_cursor_as_id(120);
        self.cursor[CursorType::Move as usize] = self.xwrapper.create_font_cursor_as_id(52);

        self.update_bars();
        self.update_status();

        // supporting window advertising ourselves per EWMH
        self.wm_check_window = self.xwrapper.create_simple_window(self.root, 0, 0, 1, 1, 0, 0, 0);
        let check_val = self.wm_check_window.0;
        self.xwrapper.change_property(
            self.wm_check_window,
            self.xwrapper.atoms.get(Atom::Net(Net::WMCheck)),
            xlib::XA_WINDOW,
            32,
            xlib::PropModeReplace,
            &check_val as *const u64 as *const u8,
            1,
        );
        let wm_name = b"wmux";
        self.xwrapper.change_property(
            self.wm_check_window,
            self.xwrapper.atoms.get(Atom::Net(Net::WMName)),
            self.xwrapper.atoms.utf8_string(),
            8,
            xlib::PropModeReplace,
            wm_name.as_ptr(),
            wm_name.len() as i32,
        );
        self.xwrapper.change_property(
            self.root,
            self.xwrapper.atoms.get(Atom::Net(Net::WMCheck)),
            xlib::XA_WINDOW,
            32,
            xlib::PropModeReplace,
            &check_val as *const u64 as *const u8,
            1,
        );
        self.xwrapper.change_property(
            self.root,
            self.xwrapper.atoms.get(Atom::Net(Net::Supported)),
            xlib::XA_ATOM,
            32,
            xlib::PropModeReplace,
            self.xwrapper.atoms.net_atom_ptr() as *const u8,
            Net::Last as i32,
        );
        self.xwrapper.clear_client_list(self.root);

        unsafe {
            let mut wa: xlib::XSetWindowAttributes = std::mem::zeroed();
            wa.cursor = self.cursor[CursorType::Normal as usize].0;
            wa.event_mask = xlib::SubstructureRedirectMask
                | xlib::SubstructureNotifyMask
                | xlib::ButtonPressMask
                | xlib::PointerMotionMask
                | xlib::EnterWindowMask
                | xlib::LeaveWindowMask
                | xlib::StructureNotifyMask
                | xlib::PropertyChangeMask;
            self.xwrapper.change_window_attributes(
                self.root,
                (xlib::CWEventMask | xlib::CWCursor) as u64,
                &mut wa,
            );
            self.xwrapper.select_input(self.root, wa.event_mask);
        }

        self.grab_keys();
        self.focus(None);
        Ok(())
    }

    // ---- lookups ----

    pub fn window_to_client_handle(&self, w: xlib::Window) -> Option<ClientHandle> {
        let handle = ClientHandle::from(Window(w));
        if self.clients.contains_key(&handle) {
            Some(handle)
        } else {
            None
        }
    }

    pub fn window_to_monitor(&self, w: xlib::Window) -> usize {
        if Window(w) == self.root {
            if let Some((x, y)) = self.xwrapper.query_pointer_position() {
                return self.rect_to_monitor(x, y, 1, 1);
            }
        }
        for (i, m) in self.mons.iter().enumerate() {
            if m.bar_window == Window(w) {
                return i;
            }
        }
        if let Some(handle) = self.window_to_client_handle(w) {
            if let Some(client) = self.clients.get(&handle) {
                return client.monitor_idx;
            }
        }
        self.selected_monitor
    }

    /// Monitor with the largest overlap with the rectangle.
    pub fn rect_to_monitor(&self, x: i32, y: i32, w: i32, h: i32) -> usize {
        let mut r = self.selected_monitor;
        let mut area = 0;
        for (i, m) in self.mons.iter().enumerate() {
            let a = m.intersect_area(x, y, w, h);
            if a > area {
                area = a;
                r = i;
            }
        }
        r
    }

    pub fn dir_to_monitor(&self, dir: i32) -> usize {
        if dir > 0 {
            (self.selected_monitor + 1) % self.mons.len()
        } else {
            (self.selected_monitor + self.mons.len() - 1) % self.mons.len()
        }
    }

    fn first_visible_in_stack(&self, mon_idx: usize) -> Option<ClientHandle> {
        let mon = &self.mons[mon_idx];
        mon.stack
            .iter()
            .find(|h| self.clients.get(h).map_or(false, |c| c.is_visible_on(mon)))
            .cloned()
    }

    // ---- arranging ----

    pub fn arrange(&mut self, mon_idx: Option<usize>) {
        match mon_idx {
            Some(idx) => {
                self.show_hide(idx);
                self.arrange_monitor(idx);
                self.restack(idx);
            }
            None => {
                for i in 0..self.mons.len() {
                    self.show_hide(i);
                }
                for i in 0..self.mons.len() {
                    self.arrange_monitor(i);
                }
            }
        }
    }

    pub fn arrange_monitor(&mut self, mon_idx: usize) {
        let layout = self.mons[mon_idx].layout();
        self.mons[mon_idx].lt_symbol = layout.symbol.to_string();
        if let Some(arrange_fn) = layout.arrange {
            arrange_fn(self, mon_idx);
        }
    }

    /// Tag switches stay O(1): invisible clients are pushed off screen
    /// but remain mapped.
    fn show_hide(&mut self, mon_idx: usize) {
        let stack = self.mons[mon_idx].stack.clone();

        // show visible clients top down
        for &handle in &stack {
            if let Some(c) = self.clients.get(&handle).cloned() {
                if c.is_visible_on(&self.mons[mon_idx]) {
                    self.xwrapper.move_window(c.win, c.x, c.y);
                    let mon = &self.mons[c.monitor_idx];
                    if (mon.layout().arrange.is_none() || c.is_floating) && !c.is_fullscreen {
                        self.resize(handle, c.x, c.y, c.w, c.h, false);
                    }
                }
            }
        }

        // hide invisible clients bottom up
        for &handle in stack.iter().rev() {
            if let Some(c) = self.clients.get(&handle) {
                if !c.is_visible_on(&self.mons[mon_idx]) {
                    self.xwrapper.move_window(c.win, -2 * c.width(), c.y);
                }
            }
        }
    }

    pub fn restack(&mut self, mon_idx: usize) {
        self.draw_bar(mon_idx);

        let mon = &self.mons[mon_idx];
        let sel = match mon.sel {
            Some(s) => s,
            None => return,
        };
        let tiled_layout = mon.layout().arrange.is_some();

        if let Some(c) = self.clients.get(&sel) {
            if c.is_floating || !tiled_layout {
                self.xwrapper.raise_window(c.win);
            }
        }

        if tiled_layout {
            let mon = &self.mons[mon_idx];
            let below: Vec<Window> = mon
                .stack
                .iter()
                .filter_map(|h| self.clients.get(h))
                .filter(|c| !c.is_floating && c.is_visible_on(mon))
                .map(|c| c.win)
                .collect();
            self.xwrapper.restack_below(mon.bar_window, &below);
        }

        self.xwrapper.sync(false);
        // restacking sweeps the pointer across windows; drop the
        // resulting crossing events so focus stays put
        while self.xwrapper.check_mask_event(xlib::EnterWindowMask).is_some() {}
    }

    // ---- focus ----

    pub fn focus(&mut self, handle: Option<ClientHandle>) {
        let visible = |h: &ClientHandle| {
            self.clients
                .get(h)
                .map_or(false, |c| c.is_visible_on(&self.mons[c.monitor_idx]))
        };
        let handle = match handle.filter(visible) {
            Some(h) => Some(h),
            None => self.first_visible_in_stack(self.selected_monitor),
        };

        if let Some(sel) = self.mons[self.selected_monitor].sel {
            if Some(sel) != handle {
                self.unfocus(sel, false);
            }
        }

        if let Some(h) = handle {
            let (win, mon_idx, urgent) = {
                let c = &self.clients[&h];
                (c.win, c.monitor_idx, c.is_urgent)
            };
            if mon_idx != self.selected_monitor {
                self.selected_monitor = mon_idx;
            }
            if urgent {
                self.set_urgent(h, false);
            }
            let mon = &mut self.mons[mon_idx];
            mon.stack.retain(|&s| s != h);
            mon.stack.insert(0, h);
            self.grab_buttons(h, true);
            self.xwrapper.set_window_border_color(win, Colour::SelBorder);
            self.set_focus(h);
        } else {
            self.xwrapper.set_input_focus(self.root, xlib::RevertToPointerRoot);
            self.xwrapper.delete_active_window(self.root);
        }
        self.mons[self.selected_monitor].sel = handle;
        self.draw_bars();
    }

    pub fn unfocus(&mut self, handle: ClientHandle, setfocus: bool) {
        let win = match self.clients.get(&handle) {
            Some(c) => c.win,
            None => return,
        };
        self.grab_buttons(handle, false);
        self.xwrapper.set_window_border_color(win, Colour::NormBorder);
        if setfocus {
            self.xwrapper.set_input_focus(self.root, xlib::RevertToPointerRoot);
            self.xwrapper.delete_active_window(self.root);
        }
    }

    /// Hand X input focus to the client, honouring the ICCCM no-input
    /// model: never-focus clients only get WM_TAKE_FOCUS.
    pub fn set_focus(&mut self, handle: ClientHandle) {
        let (win, never_focus) = match self.clients.get(&handle) {
            Some(c) => (c.win, c.never_focus),
            None => return,
        };
        if !never_focus {
            self.xwrapper.set_input_focus(win, xlib::RevertToPointerRoot);
            self.xwrapper.set_active_window(self.root, win);
        }
        self.xwrapper
            .send_event(win, self.xwrapper.atoms.get(Atom::Wm(WM::TakeFocus)));
    }

    /// Cycle selection through the visible clients in list order.
    pub fn focus_stack(&mut self, dir: i32) {
        let mon = &self.mons[self.selected_monitor];
        let sel = match mon.sel {
            Some(s) => s,
            None => return,
        };
        if config::LOCK_FULLSCREEN
            && self.clients.get(&sel).map_or(false, |c| c.is_fullscreen)
        {
            return;
        }

        let visible: Vec<ClientHandle> = mon
            .clients
            .iter()
            .filter(|h| self.clients.get(h).map_or(false, |c| c.is_visible_on(mon)))
            .cloned()
            .collect();
        if visible.is_empty() {
            return;
        }

        let next = match visible.iter().position(|&h| h == sel) {
            Some(pos) => {
                let len = visible.len() as i32;
                visible[((pos as i32 + dir + len) % len) as usize]
            }
            None => visible[0],
        };
        self.focus(Some(next));
        self.restack(self.selected_monitor);
    }

    /// Promote a client to the head of the order list (zoom target).
    pub fn pop(&mut self, handle: ClientHandle) {
        let mon_idx = match self.clients.get(&handle) {
            Some(c) => c.monitor_idx,
            None => return,
        };
        let mon = &mut self.mons[mon_idx];
        mon.clients.retain(|&h| h != handle);
        mon.clients.insert(0, handle);
        self.focus(Some(handle));
        self.arrange(Some(mon_idx));
    }

    // ---- geometry ----

    pub fn resize(&mut self, handle: ClientHandle, x: i32, y: i32, w: i32, h: i32, interact: bool) {
        if let Some((x, y, w, h)) = self.apply_size_hints(handle, x, y, w, h, interact) {
            self.resize_client(handle, x, y, w, h);
        }
    }

    pub fn resize_client(&mut self, handle: ClientHandle, x: i32, y: i32, w: i32, h: i32) {
        let (win, bw) = match self.clients.get_mut(&handle) {
            Some(c) => {
                c.oldx = c.x;
                c.x = x;
                c.oldy = c.y;
                c.y = y;
                c.oldw = c.w;
                c.w = w;
                c.oldh = c.h;
                c.h = h;
                (c.win, c.bw)
            }
            None => return,
        };
        self.xwrapper.configure_window(win, x, y, w, h, bw);
        self.send_configure(handle);
        self.xwrapper.sync(false);
    }

    /// Containment and ICCCM hint application for a candidate rectangle.
    /// Returns None when the result equals the client's current geometry.
    fn apply_size_hints(
        &mut self,
        handle: ClientHandle,
        mut x: i32,
        mut y: i32,
        mut w: i32,
        mut h: i32,
        interact: bool,
    ) -> Option<(i32, i32, i32, i32)> {
        w = w.max(1);
        h = h.max(1);

        let (mon_idx, bw, ext_w, ext_h, is_floating, hints_valid) = {
            let c = self.clients.get(&handle)?;
            (c.monitor_idx, c.bw, c.width(), c.height(), c.is_floating, c.hints_valid)
        };

        if interact {
            if x > self.screen_width {
                x = self.screen_width - ext_w;
            }
            if y > self.screen_height {
                y = self.screen_height - ext_h;
            }
            if x + w + 2 * bw < 0 {
                x = 0;
            }
            if y + h + 2 * bw < 0 {
                y = 0;
            }
        } else {
            let m = &self.mons[mon_idx];
            if x >= m.wx + m.ww {
                x = m.wx + m.ww - ext_w;
            }
            if y >= m.wy + m.wh {
                y = m.wy + m.wh - ext_h;
            }
            if x + w + 2 * bw <= m.wx {
                x = m.wx;
            }
            if y + h + 2 * bw <= m.wy {
                y = m.wy;
            }
        }
        if h < self.bar_height {
            h = self.bar_height;
        }
        if w < self.bar_height {
            w = self.bar_height;
        }

        let untiled = self.mons[mon_idx].layout().arrange.is_none();
        if config::RESIZE_HINTS || is_floating || untiled {
            if !hints_valid {
                self.update_size_hints(handle);
            }
            let hints = self.clients[&handle].hints;
            let (nw, nh) = hints.adjust(w, h);
            w = nw;
            h = nh;
        }

        let c = &self.clients[&handle];
        if x != c.x || y != c.y || w != c.w || h != c.h {
            Some((x, y, w, h))
        } else {
            None
        }
    }

    pub fn update_size_hints(&mut self, handle: ClientHandle) {
        let win = match self.clients.get(&handle) {
            Some(c) => c.win,
            None => return,
        };
        let hints = self.xwrapper.get_wm_normal_hints(win);
        if let Some(c) = self.clients.get_mut(&handle) {
            c.is_fixed = hints.is_fixed();
            c.hints = hints;
            c.hints_valid = true;
        }
    }

    pub fn send_configure(&self, handle: ClientHandle) {
        if let Some(c) = self.clients.get(&handle) {
            self.xwrapper
                .send_configure_notify(c.win, c.x, c.y, c.w, c.h, c.bw);
        }
    }

    // ---- client sub-states ----

    pub fn set_fullscreen(&mut self, handle: ClientHandle, fullscreen: bool) {
        let (win, was_fullscreen, mon_idx) = match self.clients.get(&handle) {
            Some(c) => (c.win, c.is_fullscreen, c.monitor_idx),
            None => return,
        };

        if fullscreen && !was_fullscreen {
            self.xwrapper.set_fullscreen_prop(win, true);
            let (mx, my, mw, mh) = {
                let m = &self.mons[mon_idx];
                (m.mx, m.my, m.mw, m.mh)
            };
            if let Some(c) = self.clients.get_mut(&handle) {
                c.is_fullscreen = true;
                c.old_floating = c.is_floating;
                c.old_bw = c.bw;
                c.bw = 0;
                c.is_floating = true;
            }
            self.resize_client(handle, mx, my, mw, mh);
            self.xwrapper.raise_window(win);
        } else if !fullscreen && was_fullscreen {
            self.xwrapper.set_fullscreen_prop(win, false);
            let (x, y, w, h) = {
                let c = self.clients.get_mut(&handle).unwrap();
                c.is_fullscreen = false;
                c.is_floating = c.old_floating;
                c.bw = c.old_bw;
                c.x = c.oldx;
                c.y = c.oldy;
                c.w = c.oldw;
                c.h = c.oldh;
                (c.x, c.y, c.w, c.h)
            };
            self.resize_client(handle, x, y, w, h);
            self.arrange(Some(mon_idx));
        }
    }

    pub fn set_urgent(&mut self, handle: ClientHandle, urgent: bool) {
        let win = match self.clients.get_mut(&handle) {
            Some(c) => {
                c.is_urgent = urgent;
                c.win
            }
            None => return,
        };
        self.xwrapper.set_urgency_hint(win, urgent);
    }

    /// Park a client in the dock strip, keeping its geometry for restore.
    pub fn minimize(&mut self, handle: ClientHandle) {
        let mon_idx = match self.clients.get_mut(&handle) {
            Some(c) if !c.is_minimized => {
                c.saved_x = c.x;
                c.saved_y = c.y;
                c.saved_w = c.w;
                c.saved_h = c.h;
                c.is_minimized = true;
                c.is_floating = true;
                c.is_fullscreen = false;
                c.is_fixed = true;
                c.monitor_idx
            }
            _ => return,
        };
        self.layout_dock_strip(mon_idx);
        self.arrange(Some(mon_idx));
    }

    pub fn restore(&mut self, handle: ClientHandle) {
        let (mon_idx, x, y, w, h) = match self.clients.get_mut(&handle) {
            Some(c) if c.is_minimized => {
                c.is_minimized = false;
                c.is_fixed = c.hints.is_fixed();
                (c.monitor_idx, c.saved_x, c.saved_y, c.saved_w, c.saved_h)
            }
            _ => return,
        };
        self.resize(handle, x, y, w, h, true);
        self.layout_dock_strip(mon_idx);
        self.arrange(Some(mon_idx));
    }

    /// Pack the monitor's minimized clients left-to-right along the top
    /// of its output area.
    fn layout_dock_strip(&mut self, mon_idx: usize) {
        let strip_y = self.mons[mon_idx].my + self.xwrapper.get_font_height() as i32 + 2;
        let mut x = self.mons[mon_idx].mx;
        let minimized: Vec<ClientHandle> = self.mons[mon_idx]
            .clients
            .iter()
            .filter(|h| self.clients.get(h).map_or(false, |c| c.is_minimized))
            .cloned()
            .collect();
        for handle in minimized {
            self.resize(handle, x, strip_y, config::DOCK_STRIP_W, config::DOCK_STRIP_H, false);
            x += config::DOCK_STRIP_W;
        }
    }

    /// Move a client to another monitor, adopting that monitor's tags.
    pub fn send_to_monitor(&mut self, handle: ClientHandle, target_idx: usize) {
        let mon_idx = match self.clients.get(&handle) {
            Some(c) => c.monitor_idx,
            None => return,
        };
        if mon_idx == target_idx {
            return;
        }
        self.unfocus(handle, true);
        let mon = &mut self.mons[mon_idx];
        mon.clients.retain(|&h| h != handle);
        self.detach_stack(handle, mon_idx);
        let target_tags = self.mons[target_idx].tags();
        if let Some(c) = self.clients.get_mut(&handle) {
            c.monitor_idx = target_idx;
            c.tags = target_tags;
        }
        let target = &mut self.mons[target_idx];
        target.clients.insert(0, handle);
        target.stack.insert(0, handle);
        self.focus(None);
        self.arrange(None);
    }

    /// Remove from the focus stack, electing the next visible client when
    /// the removed one was selected.
    pub fn detach_stack(&mut self, handle: ClientHandle, mon_idx: usize) {
        self.mons[mon_idx].stack.retain(|&h| h != handle);
        if self.mons[mon_idx].sel == Some(handle) {
            let next = self.first_visible_in_stack(mon_idx);
            self.mons[mon_idx].sel = next;
        }
    }

    // ---- tags ----

    pub fn view(&mut self, tagmask: u32) {
        let mon = &mut self.mons[self.selected_monitor];
        if (tagmask & config::TAG_MASK) == mon.tags() {
            return;
        }
        mon.selected_tags ^= 1; // toggle between the two tagsets
        if tagmask & config::TAG_MASK != 0 {
            mon.tagset[mon.selected_tags] = tagmask & config::TAG_MASK;
        }
        self.focus(None);
        self.arrange(Some(self.selected_monitor));
    }

    // ---- property updates ----

    /// _NET_WM_NAME, falling back to WM_NAME, falling back to a marker
    /// for clients that never set a title.
    pub fn fetch_title(&self, win: Window) -> String {
        self.xwrapper
            .get_text_prop(win, self.xwrapper.atoms.get(Atom::Net(Net::WMName)))
            .or_else(|| self.xwrapper.get_text_prop(win, xlib::XA_WM_NAME))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "broken".to_string())
    }

    pub fn update_title(&mut self, handle: ClientHandle) {
        let win = match self.clients.get(&handle) {
            Some(c) => c.win,
            None => return,
        };
        let name = self.fetch_title(win);
        if let Some(c) = self.clients.get_mut(&handle) {
            c.name = name;
        }
    }

    pub fn update_window_type(&mut self, handle: ClientHandle) {
        let win = match self.clients.get(&handle) {
            Some(c) => c.win,
            None => return,
        };
        let state = self
            .xwrapper
            .get_atom_prop(win, self.xwrapper.atoms.get(Atom::Net(Net::WMState)));
        let wtype = self
            .xwrapper
            .get_atom_prop(win, self.xwrapper.atoms.get(Atom::Net(Net::WMWindowType)));

        if state == Some(self.xwrapper.atoms.get(Atom::Net(Net::WMFullscreen))) {
            self.set_fullscreen(handle, true);
        }
        if wtype == Some(self.xwrapper.atoms.get(Atom::Net(Net::WMWindowTypeDialog))) {
            if let Some(c) = self.clients.get_mut(&handle) {
                c.is_floating = true;
            }
        }
    }

    pub fn update_wm_hints(&mut self, handle: ClientHandle) {
        let win = match self.clients.get(&handle) {
            Some(c) => c.win,
            None => return,
        };
        if let Some((urgent, input)) = self.xwrapper.read_wm_hints(win) {
            let selected = self.mons[self.selected_monitor].sel == Some(handle);
            if selected && urgent {
                // the selected client never shows as urgent
                self.xwrapper.set_urgency_hint(win, false);
            } else if let Some(c) = self.clients.get_mut(&handle) {
                c.is_urgent = urgent;
            }
            if let Some(c) = self.clients.get_mut(&handle) {
                c.never_focus = input.map_or(false, |i| !i);
            }
        }
    }

    pub fn update_status(&mut self) {
        match config::STATUS_SOURCE {
            config::StatusSource::Clock => {
                self.status_text =
                    chrono::Local::now().format("%d/%m/%Y %H-%M-%S").to_string();
            }
            config::StatusSource::RootTitle => {
                self.status_text = self
                    .xwrapper
                    .get_text_prop(self.root, xlib::XA_WM_NAME)
                    .unwrap_or_else(|| format!("wmux-{}", env!("CARGO_PKG_VERSION")));
            }
        }
        self.draw_bar(self.selected_monitor);
    }

    pub fn update_client_list(&mut self) {
        self.xwrapper.clear_client_list(self.root);
        for mon in &self.mons {
            for handle in &mon.clients {
                if let Some(c) = self.clients.get(handle) {
                    self.xwrapper.append_client_list(self.root, c.win);
                }
            }
        }
    }

    // ---- input grabs ----

    pub fn grab_keys(&mut self) {
        self.numlock_mask = self.xwrapper.get_numlock_mask();
        let key_specs: Vec<KeySpecification> = config::keys()
            .iter()
            .map(|k| KeySpecification {
                mask: k.mask,
                keysym: k.keysym,
            })
            .collect();
        self.xwrapper.grab_keys(self.root, self.numlock_mask, &key_specs);
    }

    pub fn grab_buttons(&mut self, handle: ClientHandle, focused: bool) {
        self.numlock_mask = self.xwrapper.get_numlock_mask();
        let win = match self.clients.get(&handle) {
            Some(c) => c.win,
            None => return,
        };
        let bindings: Vec<(u32, u32)> = config::buttons()
            .iter()
            .filter(|b| b.click == Click::ClientWin)
            .map(|b| (b.mask, b.button))
            .collect();
        self.xwrapper
            .grab_buttons(win, focused, &bindings, self.numlock_mask);
    }

    // ---- multihead ----

    /// Create the per-monitor bar windows that don't exist yet.
    pub fn update_bars(&mut self) {
        for i in 0..self.mons.len() {
            if self.mons[i].bar_window.0 != 0 {
                continue;
            }
            let (wx, by, ww) = {
                let m = &self.mons[i];
                (m.wx, m.by, m.ww)
            };
            let barwin = unsafe {
                let mut wa: xlib::XSetWindowAttributes = std::mem::zeroed();
                wa.override_redirect = 1;
                wa.background_pixmap = xlib::ParentRelative as u64;
                wa.event_mask = xlib::ButtonPressMask | xlib::ExposureMask;
                self.xwrapper.create_window(
                    self.root,
                    wx,
                    by,
                    ww as u32,
                    self.bar_height as u32,
                    0,
                    self.xwrapper.default_depth(self.screen),
                    xlib::InputOutput as u32,
                    self.xwrapper.default_visual(self.screen),
                    (xlib::CWOverrideRedirect | xlib::CWBackPixmap | xlib::CWEventMask) as u64,
                    &mut wa,
                )
            };
            self.xwrapper
                .define_cursor(barwin, self.cursor[CursorType::Normal as usize]);
            self.xwrapper.map_raised(barwin);
            self.mons[i].bar_window = barwin;
        }
    }

    /// Reconcile the monitor list against Xinerama. Returns true when
    /// anything moved.
    pub fn update_geom(&mut self) -> bool {
        let mut dirty = false;

        if let Some(unique) = self.xwrapper.xinerama_screens() {
            let n = self.mons.len();
            let nn = unique.len();

            for i in n..nn {
                self.mons.push(Monitor::new(i as i32));
            }
            for (i, &(x, y, w, h)) in unique.iter().enumerate() {
                let m = &mut self.mons[i];
                if i >= n || x != m.mx || y != m.my || w != m.mw || h != m.mh {
                    dirty = true;
                    m.num = i as i32;
                    m.mx = x;
                    m.wx = x;
                    m.my = y;
                    m.wy = y;
                    m.mw = w;
                    m.ww = w;
                    m.mh = h;
                    m.wh = h;
                    m.update_bar_pos(self.bar_height);
                }
            }
            // fold removed monitors into the primary one
            for i in (nn..n).rev() {
                dirty = true;
                let dead = self.mons.remove(i);
                for &handle in dead.clients.iter() {
                    if let Some(c) = self.clients.get_mut(&handle) {
                        c.monitor_idx = 0;
                    }
                    self.mons[0].clients.insert(0, handle);
                    self.mons[0].stack.insert(0, handle);
                }
                if dead.bar_window.0 != 0 {
                    self.xwrapper.unmap_window(dead.bar_window);
                    self.xwrapper.destroy_window(dead.bar_window);
                }
            }
            if self.selected_monitor >= self.mons.len() {
                self.selected_monitor = 0;
            }
        } else {
            // no Xinerama: one monitor spanning the whole screen
            if self.mons.is_empty() {
                self.mons.push(Monitor::new(0));
            }
            let (sw, sh, bh) = (self.screen_width, self.screen_height, self.bar_height);
            let m = &mut self.mons[0];
            if m.mw != sw || m.mh != sh {
                dirty = true;
                m.mw = sw;
                m.ww = sw;
                m.mh = sh;
                m.wh = sh;
                m.update_bar_pos(bh);
            }
        }

        if dirty {
            self.selected_monitor = 0;
            self.selected_monitor = self.window_to_monitor(self.root.0);
        }
        dirty
    }

    // ---- shutdown ----

    pub fn cleanup(&mut self) {
        self.view(!0);
        // a null arranger keeps unmanage from retiling on every removal
        let sellt = self.mons[self.selected_monitor].selected_lt;
        self.mons[self.selected_monitor].lt[sellt] = &LAYOUTS[1];
        for mon_idx in 0..self.mons.len() {
            while let Some(&handle) = self.mons[mon_idx].stack.first() {
                self.unmanage(handle, false);
            }
        }
        self.xwrapper.ungrab_keys(self.root);
        for i in 0..self.mons.len() {
            let barwin = self.mons[i].bar_window;
            if barwin.0 != 0 {
                self.xwrapper.unmap_window(barwin);
                self.xwrapper.destroy_window(barwin);
                self.mons[i].bar_window = Window(0);
            }
        }
        self.xwrapper.destroy_window(self.wm_check_window);
        self.xwrapper.sync(false);
        self.xwrapper
            .set_input_focus(Window(xlib::PointerRoot as u64), xlib::RevertToPointerRoot);
        self.xwrapper.delete_active_window(self.root);
    }
}
