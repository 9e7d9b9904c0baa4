// THEORY:
// `SmartPixel` is the analytical wrapper around a "dumb" `Pixel`. A `Pixel` knows
// its channels; a `SmartPixel` knows how that color sits relative to another one.
//
// Key architectural principles:
// 1.  **Comparative Analysis**: The core method, `relation_to`, takes a base pixel
//     and returns the HSL offset that carries the base onto this pixel. A
//     `SmartPixel` is only interesting next to another one.
// 2.  **Derive Once**: The HSL decomposition is computed in the constructor and
//     cached. Relation extraction compares every selected cell against the same base,
//     so the base's HSL is derived exactly once per extraction.

pub mod smart_pixel {
    use crate::core_modules::color::{Hsl, HslDelta, shortest_hue_delta};
    use crate::core_modules::pixel::pixel::Pixel;

    /// A `Pixel` together with its cached HSL decomposition.
    #[derive(Debug, Clone, Copy)]
    pub struct SmartPixel {
        /// The raw `Pixel` data this `SmartPixel` is analyzing.
        pub pixel: Pixel,
        /// The pre-calculated HSL of the color channels.
        hsl: Hsl,
    }

    impl SmartPixel {
        pub fn new(pixel: Pixel) -> Self {
            Self {
                hsl: pixel.hsl(),
                pixel,
            }
        }

        pub fn hsl(&self) -> Hsl {
            self.hsl
        }

        /// The offset from `base` to this pixel: shortest hue rotation, plus signed
        /// saturation and lightness differences.
        pub fn relation_to(&self, base: &SmartPixel) -> HslDelta {
            HslDelta {
                hue: shortest_hue_delta(base.hsl.hue, self.hsl.hue),
                saturation: self.hsl.saturation - base.hsl.saturation,
                lightness: self.hsl.lightness - base.hsl.lightness,
            }
        }
    }

    impl From<Pixel> for SmartPixel {
        fn from(pixel: Pixel) -> Self {
            SmartPixel::new(pixel)
        }
    }
}
