use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_long, c_uchar, c_uint, c_ulong};
use std::ptr::null_mut;

use fontconfig::{self};
use x11::{keysym, xft, xinerama, xlib};

use crate::client::SizeHints;
use crate::colour::{Colour, ALL_COLOURS};
use crate::error::WmuxError;
use crate::ivec2::IVec2;

pub fn die(s: &str) -> ! {
    eprintln!("wmux: {}", s);
    std::process::exit(1);
}

// From <X11/Xproto.h>
pub const X_SET_INPUT_FOCUS: u8 = 42;
pub const X_POLY_TEXT8: u8 = 74;
pub const X_POLY_FILL_RECTANGLE: u8 = 69;
pub const X_POLY_SEGMENT: u8 = 66;
pub const X_CONFIGURE_WINDOW: u8 = 12;
pub const X_GRAB_BUTTON: u8 = 28;
pub const X_GRAB_KEY: u8 = 33;
pub const X_COPY_AREA: u8 = 62;

// From <X11/Xutil.h>; WM_STATE values per ICCCM 4.1.3.1
pub const WITHDRAWN_STATE: c_long = 0;
pub const NORMAL_STATE: c_long = 1;
pub const ICONIC_STATE: c_long = 3;

pub const BUTTON_MASK: c_long = xlib::ButtonPressMask | xlib::ButtonReleaseMask;
pub const MOUSE_MASK: c_long = BUTTON_MASK | xlib::PointerMotionMask;

static mut X_ERROR_OCCURRED: bool = false;

/// Inside server-grab brackets every error is swallowed; the window we
/// are touching may already be gone.
unsafe extern "C" fn x_error_ignore(
    _dpy: *mut xlib::Display,
    _ee: *mut xlib::XErrorEvent,
) -> c_int {
    0
}

unsafe extern "C" fn x_error_start(
    _dpy: *mut xlib::Display,
    _ee: *mut xlib::XErrorEvent,
) -> c_int {
    unsafe {
        X_ERROR_OCCURRED = true;
        0
    }
}

/// There's no way to check accesses to destroyed windows, thus those
/// cases are ignored (especially on UnmapNotify's). Anything outside the
/// whitelist is fatal.
unsafe extern "C" fn x_error(_dpy: *mut xlib::Display, ee: *mut xlib::XErrorEvent) -> c_int {
    let ee = unsafe { &*ee };
    if ee.error_code == xlib::BadWindow
        || (ee.request_code == X_SET_INPUT_FOCUS && ee.error_code == xlib::BadMatch)
        || (ee.request_code == X_POLY_TEXT8 && ee.error_code == xlib::BadDrawable)
        || (ee.request_code == X_POLY_FILL_RECTANGLE && ee.error_code == xlib::BadDrawable)
        || (ee.request_code == X_POLY_SEGMENT && ee.error_code == xlib::BadDrawable)
        || (ee.request_code == X_CONFIGURE_WINDOW && ee.error_code == xlib::BadMatch)
        || (ee.request_code == X_GRAB_BUTTON && ee.error_code == xlib::BadAccess)
        || (ee.request_code == X_GRAB_KEY && ee.error_code == xlib::BadAccess)
        || (ee.request_code == X_COPY_AREA && ee.error_code == xlib::BadDrawable)
    {
        return 0;
    }

    log::error!(
        "fatal X error: request code={}, error code={}",
        ee.request_code,
        ee.error_code
    );
    die("fatal X error");
}

#[derive(PartialEq, Copy, Clone)]
pub enum Net {
    Supported,
    WMName,
    WMState,
    WMCheck,
    WMFullscreen,
    ActiveWindow,
    WMWindowType,
    WMWindowTypeDialog,
    ClientList,
    Last,
}

#[derive(PartialEq, Copy, Clone)]
pub enum WM {
    Protocols,
    Delete,
    State,
    TakeFocus,
    Last,
}

pub enum Atom {
    Net(Net),
    Wm(WM),
}

pub struct Font {
    pub dpy: *mut xlib::Display,
    pub h: c_uint,
    pub xfont: *mut xft::XftFont,
}

impl Drop for Font {
    fn drop(&mut self) {
        unsafe {
            if !self.xfont.is_null() {
                xft::XftFontClose(self.dpy, self.xfont);
            }
        }
    }
}

type Color = xft::XftColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window(pub xlib::Window);

impl Default for Window {
    fn default() -> Self {
        Window(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorId(pub u64);

pub struct KeySpecification {
    pub mask: u32,
    pub keysym: u32,
}

pub struct XWrapper {
    dpy: *mut xlib::Display,
    pub screen: c_int,
    root: xlib::Window,
    drawable: xlib::Drawable,
    gc: xlib::GC,
    xftdraw: *mut xft::XftDraw,
    pub fonts: Vec<Font>,
    colors: [Color; ALL_COLOURS.len()],
    pub atoms: Atoms,
}

impl XWrapper {
    pub fn connect() -> Result<Self, WmuxError> {
        unsafe {
            let dpy = xlib::XOpenDisplay(null_mut());
            if dpy.is_null() {
                return Err(WmuxError::DisplayOpen);
            }

            let screen = xlib::XDefaultScreen(dpy);
            let root = xlib::XRootWindow(dpy, screen);
            let w = xlib::XDisplayWidth(dpy, screen) as u32;
            let h = xlib::XDisplayHeight(dpy, screen) as u32;

            let drawable =
                xlib::XCreatePixmap(dpy, root, w, h, xlib::XDefaultDepth(dpy, screen) as u32);
            let gc = xlib::XCreateGC(dpy, root, 0, null_mut());
            xlib::XSetLineAttributes(dpy, gc, 1, xlib::LineSolid, xlib::CapButt, xlib::JoinMiter);

            let xftdraw = xft::XftDrawCreate(
                dpy,
                drawable,
                xlib::XDefaultVisual(dpy, screen),
                xlib::XDefaultColormap(dpy, screen),
            );
            if xftdraw.is_null() {
                die("failed to create XftDraw");
            }

            let atoms = Atoms::new(dpy)?;
            let mut wrapper = Self {
                dpy,
                screen,
                root,
                drawable,
                gc,
                xftdraw,
                fonts: Vec::new(),
                colors: [std::mem::zeroed(); ALL_COLOURS.len()],
                atoms,
            };
            wrapper.init_colors();
            Ok(wrapper)
        }
    }

    fn init_colors(&mut self) {
        for (i, colour) in ALL_COLOURS.iter().enumerate() {
            let rgba = colour.get_colour();
            let mut clr = unsafe { std::mem::zeroed() };
            unsafe {
                if xft::XftColorAllocValue(
                    self.dpy,
                    xlib::XDefaultVisual(self.dpy, self.screen),
                    xlib::XDefaultColormap(self.dpy, self.screen),
                    &x11::xrender::XRenderColor {
                        red: rgba[0] as u16 * 0x101,
                        green: rgba[1] as u16 * 0x101,
                        blue: rgba[2] as u16 * 0x101,
                        alpha: rgba[3] as u16 * 0x101,
                    },
                    &mut clr,
                ) == 0
                {
                    die("cannot allocate color");
                }
            }
            self.colors[i] = clr;
        }
    }

    pub fn fontset_create(&mut self, font_names: &[&str]) -> bool {
        for font_name in font_names {
            self.xfont_create(font_name);
        }
        !self.fonts.is_empty()
    }

    fn xfont_create(&mut self, font_name: &str) -> bool {
        unsafe {
            let _fc_handle = fontconfig::Fontconfig::new();

            let cstr = match CString::new(font_name) {
                Ok(s) => s,
                Err(_) => {
                    log::warn!("invalid font name '{}': contains NUL", font_name);
                    return false;
                }
            };

            let xfont = xft::XftFontOpenName(self.dpy, self.screen, cstr.as_ptr());
            if xfont.is_null() {
                log::warn!("cannot load font from name: '{}'", font_name);
                return false;
            }

            let h = ((*xfont).ascent + (*xfont).descent) as c_uint;
            self.fonts.push(Font {
                dpy: self.dpy,
                h,
                xfont,
            });
            true
        }
    }

    pub fn get_font_height(&self) -> u32 {
        if self.fonts.is_empty() {
            0
        } else {
            self.fonts[0].h
        }
    }

    pub fn rect(&mut self, color: Colour, tl: IVec2, wh: IVec2, filled: bool) {
        let clr = &self.colors[color as usize];
        unsafe {
            xlib::XSetForeground(self.dpy, self.gc, clr.pixel);
            if filled {
                xlib::XFillRectangle(self.dpy, self.drawable, self.gc, tl.x, tl.y, wh.x as _, wh.y as _);
            } else {
                xlib::XDrawRectangle(
                    self.dpy,
                    self.drawable,
                    self.gc,
                    tl.x,
                    tl.y,
                    (wh.x - 1) as _,
                    (wh.y - 1) as _,
                );
            }
        }
    }

    pub fn text(&mut self, color: Colour, tl: IVec2, wh: IVec2, lpad: u32, text: &str) {
        if self.fonts.is_empty() || text.is_empty() {
            return;
        }

        unsafe {
            let clr = &mut self.colors[color as usize];
            let usedfont = &self.fonts[0];

            let x = tl.x + lpad as i32;
            let font_height = (*usedfont.xfont).ascent + (*usedfont.xfont).descent;
            let y = tl.y + (wh.y - font_height as i32) / 2 + (*usedfont.xfont).ascent as i32;

            xft::XftDrawStringUtf8(
                self.xftdraw,
                clr,
                usedfont.xfont,
                x,
                y,
                text.as_ptr() as *const u8,
                text.len() as i32,
            );
        }
    }

    pub fn text_width(&self, text: &str) -> u32 {
        if self.fonts.is_empty() {
            return 0;
        }
        unsafe {
            let mut ext = std::mem::zeroed();
            let font = &self.fonts[0];
            xft::XftTextExtentsUtf8(
                self.dpy,
                font.xfont,
                text.as_ptr() as *const u8,
                text.len() as i32,
                &mut ext,
            );
            ext.xOff as u32
        }
    }

    pub fn map_drawable(&mut self, win: Window, x: i32, y: i32, w: u32, h: u32) {
        unsafe {
            xlib::XCopyArea(self.dpy, self.drawable, win.0, self.gc, x, y, w, h, x, y);
            xlib::XSync(self.dpy, 0);
        }
    }

    /// Re-create the backing pixmap after the screen size changed.
    pub fn resize_drawable(&mut self, w: u32, h: u32) {
        unsafe {
            xlib::XFreePixmap(self.dpy, self.drawable);
            self.drawable = xlib::XCreatePixmap(
                self.dpy,
                self.root,
                w,
                h,
                xlib::XDefaultDepth(self.dpy, self.screen) as u32,
            );
            xft::XftDrawChange(self.xftdraw, self.drawable);
        }
    }

    fn set_error_handler(
        &self,
        handler: Option<unsafe extern "C" fn(*mut xlib::Display, *mut xlib::XErrorEvent) -> c_int>,
    ) {
        unsafe {
            xlib::XSetErrorHandler(handler);
        }
    }

    pub fn set_default_error_handler(&self) {
        self.set_error_handler(Some(x_error));
    }

    pub fn set_ignore_error_handler(&self) {
        self.set_error_handler(Some(x_error_ignore));
    }

    pub fn check_for_other_wm(&mut self) -> Result<(), WmuxError> {
        unsafe {
            X_ERROR_OCCURRED = false;
            self.set_error_handler(Some(x_error_start));
            // only one client may select SubstructureRedirect on the root
            xlib::XSelectInput(self.dpy, self.root, xlib::SubstructureRedirectMask);
            self.sync(false);

            if X_ERROR_OCCURRED {
                return Err(WmuxError::OtherWmRunning);
            }
        }
        Ok(())
    }

    pub fn default_screen(&self) -> i32 {
        unsafe { xlib::XDefaultScreen(self.dpy) }
    }

    pub fn root_window(&self, screen_num: i32) -> Window {
        unsafe { Window(xlib::XRootWindow(self.dpy, screen_num)) }
    }

    pub fn display_width(&self, screen_num: i32) -> i32 {
        unsafe { xlib::XDisplayWidth(self.dpy, screen_num) }
    }

    pub fn display_height(&self, screen_num: i32) -> i32 {
        unsafe { xlib::XDisplayHeight(self.dpy, screen_num) }
    }

    pub fn connection_fd(&self) -> c_int {
        unsafe { xlib::XConnectionNumber(self.dpy) }
    }

    pub fn supports_locale(&self) -> bool {
        unsafe { xlib::XSupportsLocale() != 0 }
    }

    pub fn create_window(
        &self,
        parent: Window,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        border_width: u32,
        depth: i32,
        class: u32,
        visual: *mut xlib::Visual,
        valuemask: u64,
        attributes: &mut xlib::XSetWindowAttributes,
    ) -> Window {
        unsafe {
            Window(xlib::XCreateWindow(
                self.dpy,
                parent.0,
                x,
                y,
                width,
                height,
                border_width,
                depth,
                class,
                visual,
                valuemask,
                attributes,
            ))
        }
    }

    pub fn create_simple_window(
        &self,
        parent: Window,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        border_width: u32,
        border: u64,
        background: u64,
    ) -> Window {
        unsafe {
            Window(xlib::XCreateSimpleWindow(
                self.dpy,
                parent.0,
                x,
                y,
                width,
                height,
                border_width,
                border,
                background,
            ))
        }
    }

    pub fn destroy_window(&self, win: Window) {
        unsafe {
            xlib::XDestroyWindow(self.dpy, win.0);
        }
    }

    pub fn unmap_window(&self, win: Window) {
        unsafe {
            xlib::XUnmapWindow(self.dpy, win.0);
        }
    }

    pub fn change_window_attributes(
        &self,
        win: Window,
        value_mask: u64,
        attributes: &mut xlib::XSetWindowAttributes,
    ) {
        unsafe {
            xlib::XChangeWindowAttributes(self.dpy, win.0, value_mask, attributes);
        }
    }

    pub fn create_font_cursor_as_id(&self, shape: u32) -> CursorId {
        CursorId(unsafe { xlib::XCreateFontCursor(self.dpy, shape) })
    }

    pub fn define_cursor(&self, win: Window, cursor: CursorId) {
        unsafe {
            xlib::XDefineCursor(self.dpy, win.0, cursor.0);
        }
    }

    pub fn default_depth(&self, screen_num: i32) -> c_int {
        unsafe { xlib::XDefaultDepth(self.dpy, screen_num) }
    }

    pub fn default_visual(&self, screen_num: i32) -> *mut xlib::Visual {
        unsafe { xlib::XDefaultVisual(self.dpy, screen_num) }
    }

    pub fn map_raised(&self, win: Window) {
        unsafe { xlib::XMapRaised(self.dpy, win.0) };
    }

    pub fn map_window(&self, win: Window) {
        unsafe { xlib::XMapWindow(self.dpy, win.0) };
    }

    pub fn raise_window(&self, win: Window) {
        unsafe { xlib::XRaiseWindow(self.dpy, win.0) };
    }

    pub fn change_property(
        &self,
        win: Window,
        property: xlib::Atom,
        type_: xlib::Atom,
        format: i32,
        mode: i32,
        data: *const u8,
        nelements: i32,
    ) {
        unsafe {
            xlib::XChangeProperty(self.dpy, win.0, property, type_, format, mode, data, nelements);
        }
    }

    pub fn delete_property(&self, win: Window, property: xlib::Atom) {
        unsafe {
            xlib::XDeleteProperty(self.dpy, win.0, property);
        }
    }

    pub fn select_input(&self, win: Window, mask: i64) {
        unsafe {
            xlib::XSelectInput(self.dpy, win.0, mask);
        }
    }

    pub fn allow_events(&self, mode: i32) {
        unsafe {
            xlib::XAllowEvents(self.dpy, mode, xlib::CurrentTime);
        }
    }

    // ---- EWMH / ICCCM typed property access ----

    pub fn set_client_state(&self, win: Window, state: c_long) {
        let wm_state = self.atoms.get(Atom::Wm(WM::State));
        let data: [c_long; 2] = [state, 0];
        self.change_property(
            win,
            wm_state,
            wm_state,
            32,
            xlib::PropModeReplace,
            data.as_ptr() as *const u8,
            2,
        );
    }

    pub fn append_client_list(&self, root: Window, win: Window) {
        let list = self.atoms.get(Atom::Net(Net::ClientList));
        self.change_property(
            root,
            list,
            xlib::XA_WINDOW,
            32,
            xlib::PropModeAppend,
            &win.0 as *const u64 as *const u8,
            1,
        );
    }

    pub fn clear_client_list(&self, root: Window) {
        self.delete_property(root, self.atoms.get(Atom::Net(Net::ClientList)));
    }

    pub fn set_active_window(&self, root: Window, win: Window) {
        self.change_property(
            root,
            self.atoms.get(Atom::Net(Net::ActiveWindow)),
            xlib::XA_WINDOW,
            32,
            xlib::PropModeReplace,
            &win.0 as *const u64 as *const u8,
            1,
        );
    }

    pub fn delete_active_window(&self, root: Window) {
        self.delete_property(root, self.atoms.get(Atom::Net(Net::ActiveWindow)));
    }

    pub fn set_fullscreen_prop(&self, win: Window, fullscreen: bool) {
        let state = self.atoms.get(Atom::Net(Net::WMState));
        if fullscreen {
            let fs = self.atoms.get(Atom::Net(Net::WMFullscreen));
            self.change_property(
                win,
                state,
                xlib::XA_ATOM,
                32,
                xlib::PropModeReplace,
                &fs as *const u64 as *const u8,
                1,
            );
        } else {
            self.change_property(
                win,
                state,
                xlib::XA_ATOM,
                32,
                xlib::PropModeReplace,
                std::ptr::null(),
                0,
            );
        }
    }

    pub fn get_atom_prop(&self, win: Window, prop: xlib::Atom) -> Option<xlib::Atom> {
        unsafe {
            let mut da: xlib::Atom = 0;
            let mut di: c_int = 0;
            let mut dl: c_ulong = 0;
            let mut dl2: c_ulong = 0;
            let mut p: *mut c_uchar = null_mut();

            if xlib::XGetWindowProperty(
                self.dpy,
                win.0,
                prop,
                0,
                std::mem::size_of::<xlib::Atom>() as c_long,
                0,
                xlib::XA_ATOM,
                &mut da,
                &mut di,
                &mut dl,
                &mut dl2,
                &mut p,
            ) == xlib::Success as i32
                && !p.is_null()
            {
                let atom = *(p as *const xlib::Atom);
                xlib::XFree(p as *mut _);
                Some(atom)
            } else {
                None
            }
        }
    }

    /// WM_STATE as set by the previous manager; used when adopting
    /// already-mapped windows at startup.
    pub fn get_wm_state(&self, win: Window) -> Option<c_long> {
        unsafe {
            let wm_state = self.atoms.get(Atom::Wm(WM::State));
            let mut real: xlib::Atom = 0;
            let mut format: c_int = 0;
            let mut n: c_ulong = 0;
            let mut extra: c_ulong = 0;
            let mut p: *mut c_uchar = null_mut();

            if xlib::XGetWindowProperty(
                self.dpy,
                win.0,
                wm_state,
                0,
                2,
                0,
                wm_state,
                &mut real,
                &mut format,
                &mut n,
                &mut extra,
                &mut p,
            ) != xlib::Success as i32
            {
                return None;
            }
            if p.is_null() {
                return None;
            }
            let result = if n != 0 {
                Some(*(p as *const u32) as c_long)
            } else {
                None
            };
            xlib::XFree(p as *mut _);
            result
        }
    }

    pub fn get_text_prop(&self, win: Window, atom: xlib::Atom) -> Option<String> {
        unsafe {
            let mut name: xlib::XTextProperty = std::mem::zeroed();
            if xlib::XGetTextProperty(self.dpy, win.0, &mut name, atom) == 0
                || name.nitems == 0
                || name.value.is_null()
            {
                return None;
            }

            let result = if name.encoding == xlib::XA_STRING {
                Some(
                    CStr::from_ptr(name.value as *const c_char)
                        .to_string_lossy()
                        .into_owned(),
                )
            } else {
                let mut list: *mut *mut c_char = null_mut();
                let mut n: c_int = 0;
                if xlib::Xutf8TextPropertyToTextList(self.dpy, &name, &mut list, &mut n)
                    == xlib::Success as i32
                    && n > 0
                    && !list.is_null()
                    && !(*list).is_null()
                {
                    let s = CStr::from_ptr(*list).to_string_lossy().into_owned();
                    xlib::XFreeStringList(list);
                    Some(s)
                } else {
                    None
                }
            };
            xlib::XFree(name.value as *mut _);
            result
        }
    }

    pub fn get_window_attributes(&self, win: Window) -> Option<xlib::XWindowAttributes> {
        unsafe {
            let mut wa: xlib::XWindowAttributes = std::mem::zeroed();
            if xlib::XGetWindowAttributes(self.dpy, win.0, &mut wa) != 0 {
                Some(wa)
            } else {
                None
            }
        }
    }

    pub fn get_transient_for_hint(&self, win: Window) -> Option<Window> {
        unsafe {
            let mut transient_win: xlib::Window = 0;
            if xlib::XGetTransientForHint(self.dpy, win.0, &mut transient_win) != 0
                && transient_win != 0
            {
                Some(Window(transient_win))
            } else {
                None
            }
        }
    }

    /// (instance, class) from WM_CLASS.
    pub fn get_window_class(&self, win: Window) -> Option<(String, String)> {
        unsafe {
            let mut ch: xlib::XClassHint = std::mem::zeroed();
            if xlib::XGetClassHint(self.dpy, win.0, &mut ch) == 0 {
                return None;
            }
            let read = |p: *mut c_char| {
                if p.is_null() {
                    String::new()
                } else {
                    CStr::from_ptr(p).to_string_lossy().into_owned()
                }
            };
            let instance = read(ch.res_name);
            let class = read(ch.res_class);
            if !ch.res_name.is_null() {
                xlib::XFree(ch.res_name as *mut _);
            }
            if !ch.res_class.is_null() {
                xlib::XFree(ch.res_class as *mut _);
            }
            Some((instance, class))
        }
    }

    /// WM_NORMAL_HINTS, normalised per ICCCM: fields the client did not
    /// supply are zero.
    pub fn get_wm_normal_hints(&self, win: Window) -> SizeHints {
        unsafe {
            let mut size: xlib::XSizeHints = std::mem::zeroed();
            let mut msize: c_long = 0;
            if xlib::XGetWMNormalHints(self.dpy, win.0, &mut size, &mut msize) == 0 {
                size.flags = xlib::PSize;
            }

            let mut hints = SizeHints::default();
            if size.flags & xlib::PBaseSize != 0 {
                hints.base_w = size.base_width as i32;
                hints.base_h = size.base_height as i32;
            } else if size.flags & xlib::PMinSize != 0 {
                hints.base_w = size.min_width as i32;
                hints.base_h = size.min_height as i32;
            }
            if size.flags & xlib::PResizeInc != 0 {
                hints.inc_w = size.width_inc as i32;
                hints.inc_h = size.height_inc as i32;
            }
            if size.flags & xlib::PMaxSize != 0 {
                hints.max_w = size.max_width as i32;
                hints.max_h = size.max_height as i32;
            }
            if size.flags & xlib::PMinSize != 0 {
                hints.min_w = size.min_width as i32;
                hints.min_h = size.min_height as i32;
            } else if size.flags & xlib::PBaseSize != 0 {
                hints.min_w = size.base_width as i32;
                hints.min_h = size.base_height as i32;
            }
            if size.flags & xlib::PAspect != 0 {
                if size.min_aspect.x != 0 {
                    hints.min_aspect = size.min_aspect.y as f32 / size.min_aspect.x as f32;
                }
                if size.max_aspect.y != 0 {
                    hints.max_aspect = size.max_aspect.x as f32 / size.max_aspect.y as f32;
                }
            }
            hints
        }
    }

    /// (urgency flag, input hint if supplied) from WM_HINTS.
    pub fn read_wm_hints(&self, win: Window) -> Option<(bool, Option<bool>)> {
        unsafe {
            let wmh = xlib::XGetWMHints(self.dpy, win.0);
            if wmh.is_null() {
                return None;
            }
            let urgent = (*wmh).flags & xlib::XUrgencyHint != 0;
            let input = if (*wmh).flags & xlib::InputHint != 0 {
                Some((*wmh).input != 0)
            } else {
                None
            };
            xlib::XFree(wmh as *mut _);
            Some((urgent, input))
        }
    }

    pub fn set_urgency_hint(&self, win: Window, urgent: bool) {
        unsafe {
            let wmh = xlib::XGetWMHints(self.dpy, win.0);
            if wmh.is_null() {
                return;
            }
            (*wmh).flags = if urgent {
                (*wmh).flags | xlib::XUrgencyHint
            } else {
                (*wmh).flags & !xlib::XUrgencyHint
            };
            xlib::XSetWMHints(self.dpy, win.0, wmh);
            xlib::XFree(wmh as *mut _);
        }
    }

    pub fn query_tree(&self, win: Window) -> Option<Vec<Window>> {
        unsafe {
            let mut root_return: xlib::Window = 0;
            let mut parent_return: xlib::Window = 0;
            let mut children: *mut xlib::Window = null_mut();
            let mut nchildren: u32 = 0;
            if xlib::XQueryTree(
                self.dpy,
                win.0,
                &mut root_return,
                &mut parent_return,
                &mut children,
                &mut nchildren,
            ) == 0
            {
                return None;
            }
            let children_vec = if nchildren > 0 {
                std::slice::from_raw_parts(children, nchildren as usize)
                    .iter()
                    .map(|&w| Window(w))
                    .collect()
            } else {
                Vec::new()
            };
            if !children.is_null() {
                xlib::XFree(children as *mut _);
            }
            Some(children_vec)
        }
    }

    // ---- geometry requests ----

    pub fn move_window(&self, win: Window, x: i32, y: i32) {
        unsafe {
            xlib::XMoveWindow(self.dpy, win.0, x, y);
        }
    }

    pub fn move_resize_window(&self, win: Window, x: i32, y: i32, w: u32, h: u32) {
        unsafe {
            xlib::XMoveResizeWindow(self.dpy, win.0, x, y, w, h);
        }
    }

    pub fn configure_window(&self, win: Window, x: i32, y: i32, w: i32, h: i32, border_width: i32) {
        unsafe {
            let mut wc: xlib::XWindowChanges = std::mem::zeroed();
            wc.x = x;
            wc.y = y;
            wc.width = w;
            wc.height = h;
            wc.border_width = border_width;
            let mask = xlib::CWX | xlib::CWY | xlib::CWWidth | xlib::CWHeight | xlib::CWBorderWidth;
            xlib::XConfigureWindow(self.dpy, win.0, mask as c_uint, &mut wc);
        }
    }

    pub fn configure_border_width(&self, win: Window, border_width: i32) {
        unsafe {
            let mut wc: xlib::XWindowChanges = std::mem::zeroed();
            wc.border_width = border_width;
            xlib::XConfigureWindow(self.dpy, win.0, xlib::CWBorderWidth as c_uint, &mut wc);
        }
    }

    /// Forward an unmanaged window's ConfigureRequest untouched.
    pub fn configure_pass_through(&self, ev: &xlib::XConfigureRequestEvent) {
        unsafe {
            let mut wc: xlib::XWindowChanges = std::mem::zeroed();
            wc.x = ev.x;
            wc.y = ev.y;
            wc.width = ev.width;
            wc.height = ev.height;
            wc.border_width = ev.border_width;
            wc.sibling = ev.above;
            wc.stack_mode = ev.detail;
            xlib::XConfigureWindow(self.dpy, ev.window, ev.value_mask as c_uint, &mut wc);
        }
    }

    /// Synthetic ConfigureNotify reflecting the geometry the manager
    /// decided on (the ICCCM reply to a denied ConfigureRequest).
    pub fn send_configure_notify(&self, win: Window, x: i32, y: i32, w: i32, h: i32, bw: i32) {
        unsafe {
            let mut ce: xlib::XConfigureEvent = std::mem::zeroed();
            ce.type_ = xlib::ConfigureNotify;
            ce.display = self.dpy;
            ce.event = win.0;
            ce.window = win.0;
            ce.x = x;
            ce.y = y;
            ce.width = w;
            ce.height = h;
            ce.border_width = bw;
            ce.above = 0;
            ce.override_redirect = 0;
            let mut ev = xlib::XEvent { configure: ce };
            xlib::XSendEvent(self.dpy, win.0, 0, xlib::StructureNotifyMask, &mut ev);
        }
    }

    /// Stack `windows` below `sibling` in the given order.
    pub fn restack_below(&self, sibling: Window, windows: &[Window]) {
        unsafe {
            let mut wc: xlib::XWindowChanges = std::mem::zeroed();
            wc.stack_mode = xlib::Below;
            wc.sibling = sibling.0;
            for win in windows {
                xlib::XConfigureWindow(
                    self.dpy,
                    win.0,
                    (xlib::CWSibling | xlib::CWStackMode) as c_uint,
                    &mut wc,
                );
                wc.sibling = win.0;
            }
        }
    }

    // ---- input grabs ----

    pub fn grab_keys(&self, win: Window, numlockmask: u32, keys: &[KeySpecification]) {
        unsafe {
            xlib::XUngrabKey(self.dpy, xlib::AnyKey, xlib::AnyModifier, win.0);

            let modifiers = [0, xlib::LockMask, numlockmask, numlockmask | xlib::LockMask];
            for key in keys {
                let code = xlib::XKeysymToKeycode(self.dpy, key.keysym as u64);
                if code == 0 {
                    continue;
                }
                for &m in &modifiers {
                    xlib::XGrabKey(
                        self.dpy,
                        code as c_int,
                        key.mask | m,
                        win.0,
                        1,
                        xlib::GrabModeAsync,
                        xlib::GrabModeAsync,
                    );
                }
            }
        }
    }

    pub fn ungrab_keys(&self, win: Window) {
        unsafe {
            xlib::XUngrabKey(self.dpy, xlib::AnyKey, xlib::AnyModifier, win.0);
        }
    }

    /// Button grab policy: an unfocused client carries a catch-all
    /// synchronous grab so the first click can focus it; both states grab
    /// the configured client-window bindings.
    pub fn grab_buttons(&self, win: Window, focused: bool, bindings: &[(u32, u32)], numlockmask: u32) {
        unsafe {
            xlib::XUngrabButton(self.dpy, xlib::AnyButton as c_uint, xlib::AnyModifier, win.0);
            if !focused {
                xlib::XGrabButton(
                    self.dpy,
                    xlib::AnyButton as c_uint,
                    xlib::AnyModifier,
                    win.0,
                    0,
                    BUTTON_MASK as c_uint,
                    xlib::GrabModeSync,
                    xlib::GrabModeSync,
                    0,
                    0,
                );
            }
            let modifiers = [0, xlib::LockMask, numlockmask, numlockmask | xlib::LockMask];
            for &(mask, button) in bindings {
                for &m in &modifiers {
                    xlib::XGrabButton(
                        self.dpy,
                        button,
                        mask | m,
                        win.0,
                        0,
                        BUTTON_MASK as c_uint,
                        xlib::GrabModeAsync,
                        xlib::GrabModeSync,
                        0,
                        0,
                    );
                }
            }
        }
    }

    pub fn grab_pointer(&self, cursor: CursorId) -> bool {
        unsafe {
            xlib::XGrabPointer(
                self.dpy,
                self.root,
                0,
                MOUSE_MASK as c_uint,
                xlib::GrabModeAsync,
                xlib::GrabModeAsync,
                0,
                cursor.0,
                xlib::CurrentTime,
            ) == xlib::GrabSuccess
        }
    }

    pub fn ungrab_pointer(&self) {
        unsafe {
            xlib::XUngrabPointer(self.dpy, xlib::CurrentTime);
        }
    }

    pub fn warp_pointer(&self, win: Window, x: i32, y: i32) {
        unsafe {
            xlib::XWarpPointer(self.dpy, 0, win.0, 0, 0, 0, 0, x, y);
        }
    }

    // ---- protocols ----

    pub fn get_wm_protocols(&self, win: Window) -> Vec<xlib::Atom> {
        unsafe {
            let mut protocols_ptr: *mut xlib::Atom = null_mut();
            let mut count = 0;
            let status = xlib::XGetWMProtocols(self.dpy, win.0, &mut protocols_ptr, &mut count);

            if status != 0 && count > 0 && !protocols_ptr.is_null() {
                let protocols =
                    std::slice::from_raw_parts(protocols_ptr, count as usize).to_vec();
                xlib::XFree(protocols_ptr as *mut _);
                protocols
            } else {
                Vec::new()
            }
        }
    }

    pub fn send_client_message(&self, win: Window, message_type: xlib::Atom, data: [i64; 5]) {
        unsafe {
            let mut ev: xlib::XEvent = std::mem::zeroed();
            ev.client_message.type_ = xlib::ClientMessage;
            ev.client_message.window = win.0;
            ev.client_message.message_type = message_type;
            ev.client_message.format = 32;
            ev.client_message.data.set_long(0, data[0]);
            ev.client_message.data.set_long(1, data[1]);
            ev.client_message.data.set_long(2, data[2]);
            ev.client_message.data.set_long(3, data[3]);
            ev.client_message.data.set_long(4, data[4]);
            xlib::XSendEvent(self.dpy, win.0, 0, xlib::NoEventMask, &mut ev);
        }
    }

    /// Deliver `proto` through WM_PROTOCOLS if the client advertises it.
    pub fn send_event(&self, win: Window, proto: xlib::Atom) -> bool {
        let protocols = self.get_wm_protocols(win);
        if protocols.contains(&proto) {
            let mut data = [0; 5];
            data[0] = proto as i64;
            data[1] = xlib::CurrentTime as i64;
            self.send_client_message(win, self.atoms.get(Atom::Wm(WM::Protocols)), data);
            true
        } else {
            false
        }
    }

    // ---- server ----

    pub fn grab_server(&self) {
        unsafe { xlib::XGrabServer(self.dpy) };
    }

    pub fn ungrab_server(&self) {
        unsafe { xlib::XUngrabServer(self.dpy) };
    }

    pub fn set_close_down_mode(&self, mode: i32) {
        unsafe { xlib::XSetCloseDownMode(self.dpy, mode) };
    }

    pub fn kill_client(&self, win: Window) {
        unsafe { xlib::XKillClient(self.dpy, win.0) };
    }

    /// Hand a window back to the world: stop listening, restore its
    /// border, release button grabs.
    pub fn release_window(&self, win: Window, old_bw: i32) {
        unsafe {
            xlib::XSelectInput(self.dpy, win.0, xlib::NoEventMask);
            self.configure_border_width(win, old_bw);
            xlib::XUngrabButton(self.dpy, xlib::AnyButton as c_uint, xlib::AnyModifier, win.0);
        }
    }

    pub fn set_input_focus(&self, win: Window, revert_to: i32) {
        unsafe {
            xlib::XSetInputFocus(self.dpy, win.0, revert_to, xlib::CurrentTime);
        }
    }

    pub fn sync(&self, discard: bool) {
        unsafe { xlib::XSync(self.dpy, if discard { 1 } else { 0 }) };
    }

    pub fn pending(&self) -> i32 {
        unsafe { xlib::XPending(self.dpy) }
    }

    pub fn next_event(&self) -> Option<xlib::XEvent> {
        unsafe {
            let mut ev: xlib::XEvent = std::mem::zeroed();
            if xlib::XNextEvent(self.dpy, &mut ev) == 0 {
                Some(ev)
            } else {
                None
            }
        }
    }

    pub fn mask_event(&self, mask: c_long) -> xlib::XEvent {
        unsafe {
            let mut ev: xlib::XEvent = std::mem::zeroed();
            xlib::XMaskEvent(self.dpy, mask, &mut ev);
            ev
        }
    }

    pub fn check_mask_event(&self, mask: c_long) -> Option<xlib::XEvent> {
        unsafe {
            let mut ev: xlib::XEvent = std::mem::zeroed();
            if xlib::XCheckMaskEvent(self.dpy, mask, &mut ev) != 0 {
                Some(ev)
            } else {
                None
            }
        }
    }

    pub fn refresh_keyboard_mapping(&self, ev: &mut xlib::XMappingEvent) {
        unsafe {
            xlib::XRefreshKeyboardMapping(ev);
        }
    }

    pub fn keycode_to_keysym(&self, keycode: u32) -> u64 {
        unsafe { xlib::XKeycodeToKeysym(self.dpy, keycode as u8, 0) }
    }

    pub fn get_numlock_mask(&self) -> u32 {
        unsafe {
            let mut numlockmask = 0;
            let modmap = xlib::XGetModifierMapping(self.dpy);
            if modmap.is_null() {
                return 0;
            }

            let max_keypermod = (*modmap).max_keypermod;
            let mut p = (*modmap).modifiermap;

            for i in 0..8 {
                for _j in 0..max_keypermod {
                    if *p != 0
                        && xlib::XKeycodeToKeysym(self.dpy, *p, 0) as u32 == keysym::XK_Num_Lock
                    {
                        numlockmask = 1 << i;
                    }
                    p = p.offset(1);
                }
            }

            xlib::XFreeModifiermap(modmap);
            numlockmask as u32
        }
    }

    /// Strip NumLock and CapsLock so bindings match regardless of their
    /// state.
    pub fn clean_mask(&self, mask: u32, numlockmask: u32) -> u32 {
        mask & !(numlockmask | xlib::LockMask)
            & (xlib::ShiftMask
                | xlib::ControlMask
                | xlib::Mod1Mask
                | xlib::Mod2Mask
                | xlib::Mod3Mask
                | xlib::Mod4Mask
                | xlib::Mod5Mask)
    }

    pub fn query_pointer_position(&self) -> Option<(i32, i32)> {
        unsafe {
            let mut root_return = 0;
            let mut child_return = 0;
            let mut root_x_return = 0;
            let mut root_y_return = 0;
            let mut win_x_return = 0;
            let mut win_y_return = 0;
            let mut mask_return = 0;

            let result = xlib::XQueryPointer(
                self.dpy,
                self.root,
                &mut root_return,
                &mut child_return,
                &mut root_x_return,
                &mut root_y_return,
                &mut win_x_return,
                &mut win_y_return,
                &mut mask_return,
            );

            if result != 0 {
                Some((root_x_return, root_y_return))
            } else {
                None
            }
        }
    }

    /// Unique Xinerama screen geometries, or None when the extension is
    /// inactive. Exact duplicates (cloned outputs) are discarded.
    pub fn xinerama_screens(&self) -> Option<Vec<(i32, i32, i32, i32)>> {
        unsafe {
            if xinerama::XineramaIsActive(self.dpy) == 0 {
                return None;
            }
            let mut n: c_int = 0;
            let info = xinerama::XineramaQueryScreens(self.dpy, &mut n);
            if info.is_null() {
                return None;
            }
            let mut unique: Vec<(i32, i32, i32, i32)> = Vec::with_capacity(n as usize);
            for s in std::slice::from_raw_parts(info, n as usize) {
                let geom = (s.x_org as i32, s.y_org as i32, s.width as i32, s.height as i32);
                if !unique.contains(&geom) {
                    unique.push(geom);
                }
            }
            xlib::XFree(info as *mut _);
            Some(unique)
        }
    }

    pub fn set_window_border_color(&self, win: Window, color: Colour) {
        let pixel = self.colors[color as usize].pixel;
        unsafe {
            xlib::XSetWindowBorder(self.dpy, win.0, pixel);
        }
    }
}

impl Drop for XWrapper {
    fn drop(&mut self) {
        // fonts hold display-backed resources; free them first
        self.fonts.clear();
        unsafe {
            if !self.xftdraw.is_null() {
                xft::XftDrawDestroy(self.xftdraw);
            }
            xlib::XFreePixmap(self.dpy, self.drawable);
            xlib::XFreeGC(self.dpy, self.gc);
            xlib::XCloseDisplay(self.dpy);
        }
    }
}

pub struct Atoms {
    wmatom: [xlib::Atom; WM::Last as usize],
    netatom: [xlib::Atom; Net::Last as usize],
    utf8_string: xlib::Atom,
}

impl Atoms {
    pub fn new(dpy: *mut xlib::Display) -> Result<Self, WmuxError> {
        let mut atoms = Self {
            wmatom: [0; WM::Last as usize],
            netatom: [0; Net::Last as usize],
            utf8_string: 0,
        };

        let intern = |name: &str| -> Result<xlib::Atom, WmuxError> {
            let c_str =
                CString::new(name).map_err(|_| WmuxError::AtomIntern(name.to_string()))?;
            unsafe { Ok(xlib::XInternAtom(dpy, c_str.as_ptr(), 0)) }
        };

        atoms.wmatom[WM::Protocols as usize] = intern("WM_PROTOCOLS")?;
        atoms.wmatom[WM::Delete as usize] = intern("WM_DELETE_WINDOW")?;
        atoms.wmatom[WM::State as usize] = intern("WM_STATE")?;
        atoms.wmatom[WM::TakeFocus as usize] = intern("WM_TAKE_FOCUS")?;
        atoms.netatom[Net::ActiveWindow as usize] = intern("_NET_ACTIVE_WINDOW")?;
        atoms.netatom[Net::Supported as usize] = intern("_NET_SUPPORTED")?;
        atoms.netatom[Net::WMName as usize] = intern("_NET_WM_NAME")?;
        atoms.netatom[Net::WMState as usize] = intern("_NET_WM_STATE")?;
        atoms.netatom[Net::WMCheck as usize] = intern("_NET_SUPPORTING_WM_CHECK")?;
        atoms.netatom[Net::WMFullscreen as usize] = intern("_NET_WM_STATE_FULLSCREEN")?;
        atoms.netatom[Net::WMWindowType as usize] = intern("_NET_WM_WINDOW_TYPE")?;
        atoms.netatom[Net::WMWindowTypeDialog as usize] = intern("_NET_WM_WINDOW_TYPE_DIALOG")?;
        atoms.netatom[Net::ClientList as usize] = intern("_NET_CLIENT_LIST")?;
        atoms.utf8_string = intern("UTF8_STRING")?;

        Ok(atoms)
    }

    pub fn get(&self, atom: Atom) -> xlib::Atom {
        match atom {
            Atom::Net(net_atom) => self.netatom[net_atom as usize],
            Atom::Wm(wm_atom) => self.wmatom[wm_atom as usize],
        }
    }

    pub fn utf8_string(&self) -> xlib::Atom {
        self.utf8_string
    }

    pub fn net_atom_ptr(&self) -> *const xlib::Atom {
        self.netatom.as_ptr()
    }
}
