use std::fmt;

#[derive(Debug)]
pub enum WmuxError {
    DisplayOpen,
    OtherWmRunning,
    NoFonts,
    AtomIntern(String),
}

impl fmt::Display for WmuxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WmuxError::DisplayOpen => write!(f, "cannot open display"),
            WmuxError::OtherWmRunning => {
                write!(f, "another window manager is already running")
            }
            WmuxError::NoFonts => write!(f, "no fonts could be loaded"),
            WmuxError::AtomIntern(name) => write!(f, "cannot intern atom '{}'", name),
        }
    }
}
