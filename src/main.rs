use std::env;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::Write;
use std::panic;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use simplelog::{CombinedLogger, Config, LevelFilter, WriteLogger};
use x11::xlib;

pub mod actions;
pub mod bar;
pub mod client;
pub mod colour;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod ivec2;
pub mod layouts;
pub mod monitor;
pub mod state;
pub mod xwrapper;

pub use actions::*;
pub use client::*;
pub use colour::*;
pub use command::*;
pub use config::{Click, StatusSource};
pub use error::*;
pub use ivec2::*;
pub use layouts::*;
pub use monitor::*;
pub use state::*;
pub use xwrapper::*;

#[derive(PartialEq, Copy, Clone)]
pub enum CursorType {
    Normal,
    Resize,
    Move,
    Last,
}

impl Wmux {
    fn apply_rules(&self, client: &mut Client) {
        client.is_floating = false;
        client.tags = 0;

        let (instance, class) = self
            .xwrapper
            .get_window_class(client.win)
            .unwrap_or_default();

        for rule in config::RULES.iter() {
            if rule.matches(&class, &instance, &client.name) {
                client.is_floating = rule.is_floating;
                client.tags |= rule.tags;
                if rule.monitor >= 0 && (rule.monitor as usize) < self.mons.len() {
                    client.monitor_idx = rule.monitor as usize;
                }
            }
        }

        client.tags = if client.tags & config::TAG_MASK != 0 {
            client.tags & config::TAG_MASK
        } else {
            self.mons[client.monitor_idx].tags()
        };
        log::info!(
            "rules for '{}' (class {:?}, instance {:?}): tags={:b}, floating={}, monitor={}",
            client.name,
            class,
            instance,
            client.tags,
            client.is_floating,
            client.monitor_idx
        );
    }

    pub fn manage(&mut self, w: xlib::Window, wa: &xlib::XWindowAttributes) {
        let win = Window(w);
        let handle = ClientHandle::from(win);
        let mut client = Client::new(
            win,
            wa.x,
            wa.y,
            wa.width,
            wa.height,
            wa.border_width,
            self.selected_monitor,
        );
        client.name = self.fetch_title(win);

        // transients inherit tags and monitor from their parent
        let trans_handle = self
            .xwrapper
            .get_transient_for_hint(win)
            .and_then(|t| self.window_to_client_handle(t.0));
        if let Some(parent_handle) = trans_handle {
            let parent = &self.clients[&parent_handle];
            client.monitor_idx = parent.monitor_idx;
            client.tags = parent.tags;
        } else {
            self.apply_rules(&mut client);
        }

        client.bw = config::BORDER_PX;
        let m = &self.mons[client.monitor_idx];
        if client.x + client.width() > m.wx + m.ww {
            client.x = m.wx + m.ww - client.width();
        }
        if client.y + client.height() > m.wy + m.wh {
            client.y = m.wy + m.wh - client.height();
        }
        client.x = client.x.max(m.wx);
        client.y = client.y.max(m.wy);

        let mon_idx = client.monitor_idx;
        self.clients.insert(handle, client);

        self.xwrapper.configure_border_width(win, config::BORDER_PX);
        self.xwrapper.set_window_border_color(win, Colour::NormBorder);
        self.send_configure(handle); // propagates the border if the size stays put
        self.update_window_type(handle);
        self.update_size_hints(handle);
        self.update_wm_hints(handle);
        self.xwrapper.select_input(
            win,
            xlib::EnterWindowMask
                | xlib::FocusChangeMask
                | xlib::PropertyChangeMask
                | xlib::StructureNotifyMask,
        );
        self.grab_buttons(handle, false);

        {
            let c = self.clients.get_mut(&handle).unwrap();
            if !c.is_floating {
                c.is_floating = trans_handle.is_some() || c.is_fixed;
                c.old_floating = c.is_floating;
            }
        }
        if self.clients[&handle].is_floating {
            self.xwrapper.raise_window(win);
        }

        self.mons[mon_idx].clients.insert(0, handle);
        self.mons[mon_idx].stack.insert(0, handle);
        self.xwrapper.append_client_list(self.root, win);

        // map far off screen first; some toolkits misread their first
        // exposure otherwise
        let (cx, cy, cw, ch) = {
            let c = &self.clients[&handle];
            (c.x, c.y, c.w, c.h)
        };
        self.xwrapper
            .move_resize_window(win, cx + 2 * self.screen_width, cy, cw as u32, ch as u32);
        self.xwrapper.set_client_state(win, NORMAL_STATE);

        if mon_idx == self.selected_monitor {
            if let Some(sel) = self.mons[self.selected_monitor].sel {
                self.unfocus(sel, false);
            }
        }
        self.mons[mon_idx].sel = Some(handle);
        self.arrange(Some(mon_idx));
        self.xwrapper.map_window(win);
        self.focus(None);
    }

    pub fn unmanage(&mut self, handle: ClientHandle, destroyed: bool) {
        let (mon_idx, win, old_bw) = match self.clients.get(&handle) {
            Some(c) => (c.monitor_idx, c.win, c.old_bw),
            None => return,
        };

        self.mons[mon_idx].clients.retain(|&h| h != handle);
        self.detach_stack(handle, mon_idx);

        if !destroyed {
            // the window may vanish while we restore it
            self.xwrapper.grab_server();
            self.xwrapper.set_ignore_error_handler();
            self.xwrapper.release_window(win, old_bw);
            self.xwrapper.set_client_state(win, WITHDRAWN_STATE);
            self.xwrapper.sync(false);
            self.xwrapper.set_default_error_handler();
            self.xwrapper.ungrab_server();
        }

        self.clients.remove(&handle);
        self.focus(None);
        self.update_client_list();
        self.arrange(Some(mon_idx));
    }

    /// Adopt windows that were mapped before we took over the root.
    /// Plain windows first, then transients so their parents exist.
    pub fn scan(&mut self) {
        let wins = match self.xwrapper.query_tree(self.root) {
            Some(w) => w,
            None => return,
        };

        for &win in &wins {
            let wa = match self.xwrapper.get_window_attributes(win) {
                Some(wa) => wa,
                None => continue,
            };
            if wa.override_redirect != 0 || self.xwrapper.get_transient_for_hint(win).is_some()
            {
                continue;
            }
            if wa.map_state == xlib::IsViewable
                || self.xwrapper.get_wm_state(win) == Some(ICONIC_STATE)
            {
                self.manage(win.0, &wa);
            }
        }
        for &win in &wins {
            let wa = match self.xwrapper.get_window_attributes(win) {
                Some(wa) => wa,
                None => continue,
            };
            if self.xwrapper.get_transient_for_hint(win).is_some()
                && (wa.map_state == xlib::IsViewable
                    || self.xwrapper.get_wm_state(win) == Some(ICONIC_STATE))
            {
                self.manage(win.0, &wa);
            }
        }
    }

    pub fn run(&mut self) {
        const STATUS_INTERVAL: Duration = Duration::from_millis(500);
        let mut last_status = Instant::now();

        self.xwrapper.sync(false);
        while self.running {
            while self.running && self.xwrapper.pending() > 0 {
                if let Some(ev) = self.xwrapper.next_event() {
                    events::dispatch(self, &ev);
                }
            }
            if last_status.elapsed() >= STATUS_INTERVAL {
                self.update_status();
                last_status = Instant::now();
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

/// Panics land in the log file even when the logger itself is broken.
fn setup_panic_hook() {
    let log_path = config::LOG_PATH.clone();
    panic::set_hook(Box::new(move |panic_info| {
        let panic_msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            format!("panic occurred: {}", s)
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            format!("panic occurred: {}", s)
        } else {
            "panic occurred: unknown payload".to_string()
        };

        let location = if let Some(location) = panic_info.location() {
            format!(" at {}:{}:{}", location.file(), location.line(), location.column())
        } else {
            " at unknown location".to_string()
        };

        let full_msg = format!("PANIC: {}{}", panic_msg, location);
        eprintln!("{}", full_msg);

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [ERROR] {}", timestamp, full_msg);
            let _ = file.flush();
        }
    }));
}

fn setup_logger() {
    let log_path = &*config::LOG_PATH;
    let data_path = &*config::DATA_PATH;
    if let Err(e) = create_dir_all(data_path) {
        eprintln!("failed to create log directory: {}", e);
    }
    CombinedLogger::init(vec![WriteLogger::new(
        LevelFilter::Info,
        Config::default(),
        File::create(log_path)
            .unwrap_or_else(|e| panic!("failed to create log file at {:?}: {}", log_path, e)),
    )])
    .expect("failed to initialize logger");
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() == 2 && args[1] == "-v" {
        println!("wmux-{}", env!("CARGO_PKG_VERSION"));
        return;
    } else if args.len() != 1 {
        eprintln!("usage: wmux [-v]");
        process::exit(1);
    }

    setup_logger();
    setup_panic_hook();
    log::info!("starting wmux-{}", env!("CARGO_PKG_VERSION"));
    log::info!("log file: {:?}", &*config::LOG_PATH);

    let mut wm = match Wmux::new() {
        Ok(wm) => wm,
        Err(e) => {
            log::error!("{}", e);
            die(&e.to_string());
        }
    };

    #[cfg(target_os = "openbsd")]
    unsafe {
        let promises = std::ffi::CString::new("stdio rpath proc exec").unwrap();
        if libc::pledge(promises.as_ptr(), std::ptr::null()) == -1 {
            die("pledge");
        }
    }

    wm.scan();
    wm.run();
    wm.cleanup();
    log::info!("clean shutdown");
}
