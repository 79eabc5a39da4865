use image::Rgb;

pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const CYAN: Rgb<u8> = Rgb([0, 255, 255]);
pub const MAGENTA: Rgb<u8> = Rgb([255, 0, 255]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

/// Colors handed out to faces, in allocation order
pub const PALETTE: [Rgb<u8>; 7] = [BLUE, GREEN, CYAN, MAGENTA, RED, WHITE, YELLOW];

/// Colors assigned to one face graphic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    /// Position marker, contour, landmark and box color
    pub marker: Rgb<u8>,
    /// Label color
    pub text: Rgb<u8>,
}

/// Round-robin allocator over a fixed palette.
///
/// Each allocation advances two slots, so consecutive faces get pairs offset
/// by two. The sequence depends only on the palette and the number of
/// previous allocations.
#[derive(Debug, Clone)]
pub struct ColorAllocator {
    colors: Vec<Rgb<u8>>,
    index: usize,
}

impl Default for ColorAllocator {
    fn default() -> Self {
        Self::new(PALETTE.to_vec())
    }
}

impl ColorAllocator {
    /// Falls back to the default palette when `colors` is empty
    pub fn new(colors: Vec<Rgb<u8>>) -> Self {
        let colors = if colors.is_empty() {
            PALETTE.to_vec()
        } else {
            colors
        };
        Self { colors, index: 0 }
    }

    pub fn next(&mut self) -> ColorPair {
        self.index = (self.index + 1) % self.colors.len();
        let marker = self.colors[self.index];
        self.index = (self.index + 1) % self.colors.len();
        let text = self.colors[self.index];
        ColorPair { marker, text }
    }

    /// Restart from the beginning of the palette
    pub fn reset(&mut self) {
        self.index = 0;
    }
}
