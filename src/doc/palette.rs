/// A sprite's color table for one frame (§6.1).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Palette {
    pub frame: u16,
    colors: Vec<u32>,
}

impl Palette {
    pub fn new(frame: u16, colors: Vec<u32>) -> Self {
        Self { frame, colors }
    }

    pub fn size(&self) -> usize {
        self.colors.len()
    }

    pub fn entry(&self, index: usize) -> u32 {
        self.colors.get(index).copied().unwrap_or(0)
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    pub fn set_colors(&mut self, colors: Vec<u32>) -> Vec<u32> {
        std::mem::replace(&mut self.colors, colors)
    }

    pub fn set_range(&mut self, from: usize, to: usize, colors: &[u32]) -> Vec<u32> {
        if self.colors.len() <= to {
            self.colors.resize(to + 1, 0);
        }
        let previous = self.colors[from..=to].to_vec();
        self.colors[from..=to].copy_from_slice(colors);
        previous
    }
}
