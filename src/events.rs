use x11::xlib;

use crate::*;

pub type Handler = fn(&mut Wmux, &xlib::XEvent);

/// O(1) dispatch: one slot per X event type, absent slots drop the
/// event. The interactive move/resize pumps route through this same
/// table so the rest of the system keeps behaving mid-drag.
pub static HANDLERS: [Option<Handler>; xlib::LASTEvent as usize] = {
    let mut table: [Option<Handler>; xlib::LASTEvent as usize] =
        [None; xlib::LASTEvent as usize];
    table[xlib::ButtonPress as usize] = Some(button_press);
    table[xlib::ClientMessage as usize] = Some(client_message);
    table[xlib::ConfigureRequest as usize] = Some(configure_request);
    table[xlib::ConfigureNotify as usize] = Some(configure_notify);
    table[xlib::DestroyNotify as usize] = Some(destroy_notify);
    table[xlib::EnterNotify as usize] = Some(enter_notify);
    table[xlib::Expose as usize] = Some(expose);
    table[xlib::FocusIn as usize] = Some(focus_in);
    table[xlib::KeyPress as usize] = Some(key_press);
    table[xlib::MappingNotify as usize] = Some(mapping_notify);
    table[xlib::MapRequest as usize] = Some(map_request);
    table[xlib::MotionNotify as usize] = Some(motion_notify);
    table[xlib::PropertyNotify as usize] = Some(property_notify);
    table[xlib::UnmapNotify as usize] = Some(unmap_notify);
    table
};

pub fn dispatch(wm: &mut Wmux, ev: &xlib::XEvent) {
    let ty = ev.get_type() as usize;
    if let Some(&Some(handler)) = HANDLERS.get(ty) {
        handler(wm, ev);
    }
}

/// Tag-bar bindings carry an empty mask and get the clicked tag filled
/// in here.
fn resolve_tag_action(action: Action, click: Click, tag_idx: usize) -> Action {
    if click != Click::TagBar {
        return action;
    }
    match action {
        Action::View(0) => Action::View(1 << tag_idx),
        Action::ToggleView(0) => Action::ToggleView(1 << tag_idx),
        Action::Tag(0) => Action::Tag(1 << tag_idx),
        Action::ToggleTag(0) => Action::ToggleTag(1 << tag_idx),
        other => other,
    }
}

fn button_press(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.button };
    let mut click = Click::RootWin;
    let mut clicked_tag = 0usize;

    // a press on another monitor moves the selection there first
    let m = wm.window_to_monitor(ev.window);
    if m != wm.selected_monitor {
        if let Some(sel) = wm.mons[wm.selected_monitor].sel {
            wm.unfocus(sel, true);
        }
        wm.selected_monitor = m;
        wm.focus(None);
    }

    if Window(ev.window) == wm.mons[wm.selected_monitor].bar_window {
        let (c, tag) = bar::hit_test_monitor(wm, wm.selected_monitor, ev.x);
        click = c;
        clicked_tag = tag;
    } else if let Some(handle) = wm.window_to_client_handle(ev.window) {
        wm.focus(Some(handle));
        wm.restack(wm.selected_monitor);
        wm.xwrapper.allow_events(xlib::ReplayPointer);
        click = Click::ClientWin;
    }

    for binding in config::buttons() {
        if binding.click == click
            && binding.button == ev.button
            && wm.xwrapper.clean_mask(binding.mask, wm.numlock_mask)
                == wm.xwrapper.clean_mask(ev.state, wm.numlock_mask)
        {
            resolve_tag_action(binding.action.clone(), click, clicked_tag).execute(wm);
        }
    }
}

fn client_message(wm: &mut Wmux, e: &xlib::XEvent) {
    let cme = unsafe { e.client_message };
    let handle = match wm.window_to_client_handle(cme.window) {
        Some(h) => h,
        None => return,
    };

    if cme.message_type == wm.xwrapper.atoms.get(Atom::Net(Net::WMState)) {
        let fullscreen = wm.xwrapper.atoms.get(Atom::Net(Net::WMFullscreen)) as i64;
        if cme.data.get_long(1) == fullscreen || cme.data.get_long(2) == fullscreen {
            // action: 1 add, 0 remove, 2 toggle
            let add = cme.data.get_long(0) == 1
                || (cme.data.get_long(0) == 2 && !wm.clients[&handle].is_fullscreen);
            wm.set_fullscreen(handle, add);
        }
    } else if cme.message_type == wm.xwrapper.atoms.get(Atom::Net(Net::ActiveWindow)) {
        let selected = wm.mons[wm.selected_monitor].sel == Some(handle);
        if !selected && !wm.clients[&handle].is_urgent {
            wm.set_urgent(handle, true);
        }
    }
}

fn configure_request(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.configure_request };

    if let Some(handle) = wm.window_to_client_handle(ev.window) {
        if ev.value_mask & xlib::CWBorderWidth as u64 != 0 {
            if let Some(c) = wm.clients.get_mut(&handle) {
                c.bw = ev.border_width;
            }
        } else {
            let untiled =
                wm.mons[wm.selected_monitor].layout().arrange.is_none();
            let is_floating = wm.clients[&handle].is_floating;
            if is_floating || untiled {
                let mon_idx = wm.clients[&handle].monitor_idx;
                let (mx, my, mw, mh) = {
                    let m = &wm.mons[mon_idx];
                    (m.mx, m.my, m.mw, m.mh)
                };
                let (win, x, y, w, h, only_moved) = {
                    let c = wm.clients.get_mut(&handle).unwrap();
                    if ev.value_mask & xlib::CWX as u64 != 0 {
                        c.oldx = c.x;
                        c.x = mx + ev.x;
                    }
                    if ev.value_mask & xlib::CWY as u64 != 0 {
                        c.oldy = c.y;
                        c.y = my + ev.y;
                    }
                    if ev.value_mask & xlib::CWWidth as u64 != 0 {
                        c.oldw = c.w;
                        c.w = ev.width;
                    }
                    if ev.value_mask & xlib::CWHeight as u64 != 0 {
                        c.oldh = c.h;
                        c.h = ev.height;
                    }
                    // keep runaway floaters centered on their monitor
                    if c.x + c.w > mx + mw && c.is_floating {
                        c.x = mx + (mw / 2 - c.width() / 2);
                    }
                    if c.y + c.h > my + mh && c.is_floating {
                        c.y = my + (mh / 2 - c.height() / 2);
                    }
                    let only_moved = ev.value_mask & (xlib::CWX | xlib::CWY) as u64 != 0
                        && ev.value_mask & (xlib::CWWidth | xlib::CWHeight) as u64 == 0;
                    (c.win, c.x, c.y, c.w, c.h, only_moved)
                };
                if only_moved {
                    wm.send_configure(handle);
                }
                let visible = {
                    let c = &wm.clients[&handle];
                    c.is_visible_on(&wm.mons[mon_idx])
                };
                if visible {
                    wm.xwrapper.move_resize_window(win, x, y, w as u32, h as u32);
                }
            } else {
                // deny: reply with the geometry the tiler decided on
                wm.send_configure(handle);
            }
        }
    } else {
        wm.xwrapper.configure_pass_through(&ev);
    }
    wm.xwrapper.sync(false);
}

fn configure_notify(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.configure };
    if ev.window != wm.root.0 {
        return;
    }

    let dirty = wm.screen_width != ev.width || wm.screen_height != ev.height;
    wm.screen_width = ev.width;
    wm.screen_height = ev.height;
    if wm.update_geom() || dirty {
        log::info!("root resized to {}x{}, redetecting monitors", ev.width, ev.height);
        wm.xwrapper.resize_drawable(
            wm.screen_width as u32,
            (wm.bar_height + config::BAR_DRAWABLE_PAD) as u32,
        );
        wm.update_bars();
        for i in 0..wm.mons.len() {
            let fullscreen: Vec<ClientHandle> = {
                let mon = &wm.mons[i];
                mon.clients
                    .iter()
                    .filter(|h| wm.clients.get(h).map_or(false, |c| c.is_fullscreen))
                    .cloned()
                    .collect()
            };
            let (mx, my, mw, mh, wx, by, ww, barwin) = {
                let m = &wm.mons[i];
                (m.mx, m.my, m.mw, m.mh, m.wx, m.by, m.ww, m.bar_window)
            };
            for handle in fullscreen {
                wm.resize_client(handle, mx, my, mw, mh);
            }
            if barwin.0 != 0 {
                wm.xwrapper
                    .move_resize_window(barwin, wx, by, ww as u32, wm.bar_height as u32);
            }
        }
        wm.focus(None);
        wm.arrange(None);
    }
}

fn destroy_notify(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.destroy_window };
    if let Some(handle) = wm.window_to_client_handle(ev.window) {
        wm.unmanage(handle, true);
    }
}

fn unmap_notify(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.unmap };
    if let Some(handle) = wm.window_to_client_handle(ev.window) {
        if ev.send_event != 0 {
            // synthetic: the client withdrew itself per ICCCM 4.1.4
            let win = wm.clients[&handle].win;
            wm.xwrapper.set_client_state(win, WITHDRAWN_STATE);
        } else {
            wm.unmanage(handle, false);
        }
    }
}

fn enter_notify(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.crossing };
    if (ev.mode != xlib::NotifyNormal || ev.detail == xlib::NotifyInferior)
        && ev.window != wm.root.0
    {
        return;
    }

    let handle = wm.window_to_client_handle(ev.window);
    let m = match handle {
        Some(h) => wm.clients[&h].monitor_idx,
        None => wm.window_to_monitor(ev.window),
    };
    if m != wm.selected_monitor {
        if let Some(sel) = wm.mons[wm.selected_monitor].sel {
            wm.unfocus(sel, true);
        }
        wm.selected_monitor = m;
    } else if handle.is_none() || handle == wm.mons[wm.selected_monitor].sel {
        return;
    }
    wm.focus(handle);
}

fn expose(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.expose };
    if ev.count == 0 {
        let m = wm.window_to_monitor(ev.window);
        wm.draw_bar(m);
    }
}

/// Some clients grab focus for themselves; push it back onto the
/// selection.
fn focus_in(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.focus_change };
    if let Some(sel) = wm.mons[wm.selected_monitor].sel {
        if wm.clients.get(&sel).map_or(false, |c| c.win.0 != ev.window) {
            wm.set_focus(sel);
        }
    }
}

fn key_press(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.key };
    let keysym = wm.xwrapper.keycode_to_keysym(ev.keycode) as u32;
    for key in config::keys() {
        if keysym == key.keysym
            && wm.xwrapper.clean_mask(key.mask, wm.numlock_mask)
                == wm.xwrapper.clean_mask(ev.state, wm.numlock_mask)
        {
            key.action.execute(wm);
        }
    }
}

fn mapping_notify(wm: &mut Wmux, e: &xlib::XEvent) {
    let mut ev = unsafe { e.mapping };
    wm.xwrapper.refresh_keyboard_mapping(&mut ev);
    if ev.request == xlib::MappingKeyboard {
        wm.grab_keys();
    }
}

fn map_request(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.map_request };
    if let Some(wa) = wm.xwrapper.get_window_attributes(Window(ev.window)) {
        if wa.override_redirect != 0 {
            return;
        }
        if wm.window_to_client_handle(ev.window).is_none() {
            wm.manage(ev.window, &wa);
        }
    }
}

fn motion_notify(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.motion };
    if ev.window != wm.root.0 {
        return;
    }
    let m = wm.rect_to_monitor(ev.x_root, ev.y_root, 1, 1);
    if Some(m) != wm.motion_monitor && wm.motion_monitor.is_some() {
        if let Some(sel) = wm.mons[wm.selected_monitor].sel {
            wm.unfocus(sel, true);
        }
        wm.selected_monitor = m;
        wm.focus(None);
    }
    wm.motion_monitor = Some(m);
}

fn property_notify(wm: &mut Wmux, e: &xlib::XEvent) {
    let ev = unsafe { e.property };

    if ev.window == wm.root.0 && ev.atom == xlib::XA_WM_NAME {
        wm.update_status();
        return;
    }
    if ev.state == xlib::PropertyDelete {
        return;
    }
    let handle = match wm.window_to_client_handle(ev.window) {
        Some(h) => h,
        None => return,
    };

    if ev.atom == xlib::XA_WM_TRANSIENT_FOR {
        let (win, is_floating, mon_idx) = {
            let c = &wm.clients[&handle];
            (c.win, c.is_floating, c.monitor_idx)
        };
        if !is_floating {
            if let Some(trans) = wm.xwrapper.get_transient_for_hint(win) {
                if wm.window_to_client_handle(trans.0).is_some() {
                    wm.clients.get_mut(&handle).unwrap().is_floating = true;
                    wm.arrange(Some(mon_idx));
                }
            }
        }
    } else if ev.atom == xlib::XA_WM_NORMAL_HINTS {
        // re-read lazily on the next resize
        wm.clients.get_mut(&handle).unwrap().hints_valid = false;
    } else if ev.atom == xlib::XA_WM_HINTS {
        wm.update_wm_hints(handle);
        wm.draw_bars();
    }

    if ev.atom == xlib::XA_WM_NAME
        || ev.atom == wm.xwrapper.atoms.get(Atom::Net(Net::WMName))
    {
        wm.update_title(handle);
        let mon_idx = wm.clients[&handle].monitor_idx;
        if wm.mons[mon_idx].sel == Some(handle) {
            wm.draw_bar(mon_idx);
        }
    }
    if ev.atom == wm.xwrapper.atoms.get(Atom::Net(Net::WMWindowType)) {
        wm.update_window_type(handle);
    }
}
