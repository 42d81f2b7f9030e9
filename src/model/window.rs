use std::fmt;

/// Непрозрачный идентификатор окна ОС (HWND на Windows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Информация об окне из снимка. Окном владеет ОС, ядро только ссылается на него.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowInfo {
    pub id: WindowId,
    pub exe_name: String,
    pub title: String,
    pub visible: bool,
    pub tool_window: bool,
    pub focused: bool,
}

impl WindowInfo {
    pub fn new(id: WindowId, exe_name: impl Into<String>) -> Self {
        Self {
            id,
            exe_name: exe_name.into(),
            title: String::new(),
            visible: true,
            tool_window: false,
            focused: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_focus(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn as_tool_window(mut self) -> Self {
        self.tool_window = true;
        self
    }

    /// Скрытые и служебные (tool) окна не раскрашиваются
    pub fn is_eligible(&self) -> bool {
        self.visible && !self.tool_window
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.is_empty() {
            write!(f, "{} [{}]", self.id, self.exe_name)
        } else {
            write!(f, "{} \"{}\" [{}]", self.id, self.title, self.exe_name)
        }
    }
}
