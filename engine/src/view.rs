//! Scroll position of the message view.

use spark_types::ui::ScrollState;

const LINE_STEP: u16 = 3;
const PAGE_STEP: u16 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewState {
    scroll: ScrollState,
    /// Content height minus viewport height, reported by the renderer.
    scroll_max: u16,
}

impl ViewState {
    #[must_use]
    pub fn scroll(&self) -> ScrollState {
        self.scroll
    }

    pub fn update_scroll_max(&mut self, max: u16) {
        self.scroll_max = max;

        if let ScrollState::Manual { offset_from_top } = self.scroll
            && offset_from_top >= max
        {
            self.scroll = ScrollState::AutoBottom;
        }
    }

    #[must_use]
    pub fn scroll_offset_from_top(&self) -> u16 {
        match self.scroll {
            ScrollState::AutoBottom => self.scroll_max,
            ScrollState::Manual { offset_from_top } => offset_from_top.min(self.scroll_max),
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_up_by(LINE_STEP);
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll_up_by(PAGE_STEP);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_down_by(LINE_STEP);
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll_down_by(PAGE_STEP);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = ScrollState::Manual { offset_from_top: 0 };
    }

    /// Jump to bottom and re-enable auto-scroll.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll = ScrollState::AutoBottom;
    }

    fn scroll_up_by(&mut self, delta: u16) {
        let from = self.scroll_offset_from_top();
        self.scroll = ScrollState::Manual {
            offset_from_top: from.saturating_sub(delta),
        };
    }

    fn scroll_down_by(&mut self, delta: u16) {
        let ScrollState::Manual { offset_from_top } = self.scroll else {
            return;
        };

        let new_offset = offset_from_top.saturating_add(delta);
        self.scroll = if new_offset >= self.scroll_max {
            ScrollState::AutoBottom
        } else {
            ScrollState::Manual {
                offset_from_top: new_offset,
            }
        };
    }
}
