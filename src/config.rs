use std::path::PathBuf;
use std::sync::LazyLock;

use x11::{keysym, xlib};

use crate::actions::Action;
use crate::command::Command;
use crate::layouts::LAYOUTS;

pub const BORDER_PX: i32 = 2;
/// Pixel threshold for edge snapping during interactive move/resize.
pub const SNAP: i32 = 32;
pub const SHOW_BAR: bool = true;
pub const TOP_BAR: bool = true;
pub const MFACT: f32 = 0.55;
pub const NMASTER: i32 = 1;
/// Respect size hints in tiled resizals as well.
pub const RESIZE_HINTS: bool = true;
/// Force focus on the fullscreen window.
pub const LOCK_FULLSCREEN: bool = true;

pub const TAGS: [&str; 9] = ["1", "2", "3", "4", "5", "6", "7", "8", "9"];
const _: () = assert!(TAGS.len() <= 31, "tag mask must fit an u32 bit array");

pub const TAG_MASK: u32 = (1 << TAGS.len()) - 1;

pub const FONTS: [&str; 1] = ["monospace:size=12"];

/// Extra vertical room reserved on the drawing surface above the bar
/// height (theme constant; lets the bar be taller than the font).
pub const BAR_DRAWABLE_PAD: i32 = 20;

/// Cell size of the strip minimized clients are parked in, packed
/// left-to-right along the top of their monitor.
pub const DOCK_STRIP_W: i32 = 50;
pub const DOCK_STRIP_H: i32 = 20;

/// What the right-aligned bar segment shows on the selected monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusSource {
    /// Wall clock, refreshed from the run loop.
    Clock,
    /// The root window's WM_NAME property (xsetroot -name).
    RootTitle,
}

pub const STATUS_SOURCE: StatusSource = StatusSource::Clock;

pub static DATA_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("wmux")
});

pub static LOG_PATH: LazyLock<PathBuf> = LazyLock::new(|| DATA_PATH.join("wmux.log"));

pub struct Rule {
    pub class: Option<&'static str>,
    pub instance: Option<&'static str>,
    pub title: Option<&'static str>,
    pub tags: u32,
    pub is_floating: bool,
    /// Target monitor index, or -1 for the currently selected monitor.
    pub monitor: i32,
}

impl Rule {
    /// Substring matching on every present pattern; absent patterns are
    /// wildcards.
    pub fn matches(&self, class: &str, instance: &str, title: &str) -> bool {
        self.class.map_or(true, |p| class.contains(p))
            && self.instance.map_or(true, |p| instance.contains(p))
            && self.title.map_or(true, |p| title.contains(p))
    }
}

pub const RULES: [Rule; 2] = [
    Rule {
        class: Some("Gimp"),
        instance: None,
        title: None,
        tags: 0,
        is_floating: true,
        monitor: -1,
    },
    Rule {
        class: Some("Firefox"),
        instance: None,
        title: None,
        tags: 1 << 8,
        is_floating: false,
        monitor: -1,
    },
];

pub const MODKEY: u32 = xlib::Mod1Mask;

pub struct KeyBinding {
    pub mask: u32,
    pub keysym: u32,
    pub action: Action,
}

pub fn keys() -> Vec<KeyBinding> {
    let mut keys = vec![
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_p,
            action: Action::Spawn(Command::Dmenu),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_Return,
            action: Action::Spawn(Command::Terminal),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_b,
            action: Action::ToggleBar,
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_j,
            action: Action::FocusStack(1),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_k,
            action: Action::FocusStack(-1),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_i,
            action: Action::IncNMaster(1),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_d,
            action: Action::IncNMaster(-1),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_h,
            action: Action::SetMFact(-0.05),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_l,
            action: Action::SetMFact(0.05),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_Return,
            action: Action::Zoom,
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_Tab,
            action: Action::View(0),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_c,
            action: Action::KillClient,
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_t,
            action: Action::SetLayout(Some(&LAYOUTS[0])),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_f,
            action: Action::SetLayout(Some(&LAYOUTS[1])),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_m,
            action: Action::SetLayout(Some(&LAYOUTS[2])),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_space,
            action: Action::SetLayout(None),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_space,
            action: Action::ToggleFloating,
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_n,
            action: Action::ToggleMinimize,
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_0,
            action: Action::View(!0),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_0,
            action: Action::Tag(!0),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_comma,
            action: Action::FocusMon(-1),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_period,
            action: Action::FocusMon(1),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_comma,
            action: Action::TagMon(-1),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_period,
            action: Action::TagMon(1),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_q,
            action: Action::Quit,
        },
    ];

    const TAG_KEYS: [u32; 9] = [
        keysym::XK_1,
        keysym::XK_2,
        keysym::XK_3,
        keysym::XK_4,
        keysym::XK_5,
        keysym::XK_6,
        keysym::XK_7,
        keysym::XK_8,
        keysym::XK_9,
    ];

    for (tag_idx, &keysym) in TAG_KEYS.iter().enumerate() {
        keys.push(KeyBinding {
            mask: MODKEY,
            keysym,
            action: Action::View(1 << tag_idx),
        });
        keys.push(KeyBinding {
            mask: MODKEY | xlib::ControlMask,
            keysym,
            action: Action::ToggleView(1 << tag_idx),
        });
        keys.push(KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym,
            action: Action::Tag(1 << tag_idx),
        });
        keys.push(KeyBinding {
            mask: MODKEY | xlib::ControlMask | xlib::ShiftMask,
            keysym,
            action: Action::ToggleTag(1 << tag_idx),
        });
    }

    keys
}

/// Where on screen a button press landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    TagBar,
    LtSymbol,
    StatusText,
    WinTitle,
    ClientWin,
    RootWin,
}

pub struct ButtonBinding {
    pub click: Click,
    pub mask: u32,
    pub button: u32,
    /// Tag-mask actions with an empty mask are filled in with the
    /// clicked tag at dispatch time.
    pub action: Action,
}

pub fn buttons() -> Vec<ButtonBinding> {
    vec![
        ButtonBinding {
            click: Click::LtSymbol,
            mask: 0,
            button: xlib::Button1,
            action: Action::SetLayout(None),
        },
        ButtonBinding {
            click: Click::LtSymbol,
            mask: 0,
            button: xlib::Button3,
            action: Action::SetLayout(Some(&LAYOUTS[2])),
        },
        ButtonBinding {
            click: Click::WinTitle,
            mask: 0,
            button: xlib::Button2,
            action: Action::Zoom,
        },
        ButtonBinding {
            click: Click::StatusText,
            mask: 0,
            button: xlib::Button2,
            action: Action::Spawn(Command::Terminal),
        },
        ButtonBinding {
            click: Click::ClientWin,
            mask: MODKEY,
            button: xlib::Button1,
            action: Action::MoveMouse,
        },
        ButtonBinding {
            click: Click::ClientWin,
            mask: MODKEY,
            button: xlib::Button2,
            action: Action::ToggleFloating,
        },
        ButtonBinding {
            click: Click::ClientWin,
            mask: MODKEY,
            button: xlib::Button3,
            action: Action::ResizeMouse,
        },
        ButtonBinding {
            click: Click::TagBar,
            mask: 0,
            button: xlib::Button1,
            action: Action::View(0),
        },
        ButtonBinding {
            click: Click::TagBar,
            mask: 0,
            button: xlib::Button3,
            action: Action::ToggleView(0),
        },
        ButtonBinding {
            click: Click::TagBar,
            mask: MODKEY,
            button: xlib::Button1,
            action: Action::Tag(0),
        },
        ButtonBinding {
            click: Click::TagBar,
            mask: MODKEY,
            button: xlib::Button3,
            action: Action::ToggleTag(0),
        },
        ButtonBinding {
            click: Click::TagBar,
            mask: 0,
            button: xlib::Button4,
            action: Action::CycleTag(1),
        },
        ButtonBinding {
            click: Click::TagBar,
            mask: 0,
            button: xlib::Button5,
            action: Action::CycleTag(-1),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_patterns_match_anything() {
        let rule = Rule {
            class: None,
            instance: None,
            title: None,
            tags: 0,
            is_floating: false,
            monitor: -1,
        };
        assert!(rule.matches("Foo", "foo", "whatever"));
    }

    #[test]
    fn class_match_is_substring() {
        let rule = &RULES[0];
        assert!(rule.matches("Gimp", "gimp", "GNU Image Manipulation Program"));
        assert!(rule.matches("Gimp-2.10", "gimp", ""));
        assert!(!rule.matches("Firefox", "Navigator", ""));
    }

    #[test]
    fn all_present_patterns_must_match() {
        let rule = Rule {
            class: Some("term"),
            instance: None,
            title: Some("vim"),
            tags: 1 << 2,
            is_floating: false,
            monitor: -1,
        };
        assert!(rule.matches("xterm", "xterm", "vim main.rs"));
        assert!(!rule.matches("xterm", "xterm", "htop"));
    }

    #[test]
    fn tag_mask_covers_configured_tags() {
        assert_eq!(TAG_MASK, 0b1_1111_1111);
        assert_eq!((1u32 << 8) & TAG_MASK, 1 << 8);
        assert_eq!((1u32 << 9) & TAG_MASK, 0);
    }
}
