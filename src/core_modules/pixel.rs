// THEORY:
// The `Pixel` module is the most fundamental unit of the engine. It is a "dumb" data
// container for one cell of a pixel-art grid: four 8-bit channels plus the
// `selected` flag the selection boundary toggles.
//
// Two rules govern every operation that touches a `Pixel`:
// - Color operations (relation previews, baking) rewrite only red, green and blue.
//   Alpha is carried through untouched, so transparency in the source art survives
//   any number of recolors.
// - Selection operations flip only `selected`. They never touch a channel.
//
// Anything that needs a second pixel (offsets from a base, comparisons) belongs in
// `SmartPixel`, not here.

pub mod pixel {
    use crate::core_modules::color::{Hsl, Rgb, rgb_to_hsl};

    pub type Byte = u8;
    pub type Channel = Byte;

    pub const CHANNELS: usize = 4;

    /// A single RGBA cell of a `PixelGrid` plus its selection flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
        /// Whether the cell is part of the current selection.
        pub selected: bool,
    }

    impl Pixel {
        /// A new, unselected pixel.
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
                selected: false,
            }
        }

        pub fn with_selected(mut self, selected: bool) -> Self {
            self.selected = selected;
            self
        }

        /// The color channels without alpha.
        pub fn rgb(&self) -> Rgb {
            Rgb::new(self.red, self.green, self.blue)
        }

        /// The HSL decomposition of the color channels.
        pub fn hsl(&self) -> Hsl {
            rgb_to_hsl(self.rgb())
        }

        /// Replaces red, green and blue. Alpha and the selection flag are kept.
        pub fn recolored(&self, rgb: Rgb) -> Self {
            Pixel {
                red: rgb.red,
                green: rgb.green,
                blue: rgb.blue,
                ..*self
            }
        }
    }

    impl TryFrom<&[Byte]> for Pixel {
        type Error = usize;

        /// Converts exactly four RGBA bytes; any other length is returned as the error.
        fn try_from(bytes: &[Byte]) -> Result<Self, Self::Error> {
            match *bytes {
                [red, green, blue, alpha] => Ok(Pixel::new(red, green, blue, alpha)),
                _ => Err(bytes.len()),
            }
        }
    }

    impl From<Pixel> for [Byte; CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            [pixel.red, pixel.green, pixel.blue, pixel.alpha]
        }
    }

}
