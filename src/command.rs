/// External commands bound to keys and buttons. Argument vectors are
/// built per spawn so the dmenu invocation can carry the selected
/// monitor index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Dmenu,
    Terminal,
}

impl Command {
    pub fn argv(&self, mon_num: i32) -> Vec<String> {
        match self {
            Command::Dmenu => vec![
                "dmenu_run".to_string(),
                "-m".to_string(),
                mon_num.to_string(),
                "-fn".to_string(),
                "monospace:size=12".to_string(),
                "-nb".to_string(),
                "#222222".to_string(),
                "-nf".to_string(),
                "#bbbbbb".to_string(),
                "-sb".to_string(),
                "#005577".to_string(),
                "-sf".to_string(),
                "#eeeeee".to_string(),
            ],
            Command::Terminal => vec!["alacritty".to_string()],
        }
    }
}
