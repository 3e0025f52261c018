/// Counts "show validation" requests since the last reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationVisibility {
    count: u32,
}

impl ValidationVisibility {
    pub fn show(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn hide(&mut self) {
        self.count = 0;
    }

    pub fn request_count(&self) -> u32 {
        self.count
    }

    pub fn requested(&self) -> bool {
        self.count > 0
    }
}
