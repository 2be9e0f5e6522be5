//! Single-bit access on fixed-width unsigned integers.
//!
//! Step flags, switch levels and LED states are all stored as packed
//! booleans. [`BitField`] gives each supported integer type a declared
//! width so a bad bit index is caught at the call instead of silently
//! shifting past the end of the field.

/// An unsigned integer used as a bank of boolean flags.
///
/// Bit `0` is the least significant bit. Valid indices are
/// `0..Self::WIDTH`.
pub trait BitField: Copy {
    /// Number of addressable bits.
    const WIDTH: u32;

    /// Returns the value of bit `index`.
    ///
    /// # Panics
    /// If `index >= Self::WIDTH`.
    fn get_flag(self, index: u32) -> bool;

    /// Returns a copy with bit `index` set to `value`. All other bits are
    /// unchanged.
    ///
    /// # Panics
    /// If `index >= Self::WIDTH`.
    fn set_flag(self, index: u32, value: bool) -> Self;
}

macro_rules! impl_bit_field {
    ($($ty:ty),*) => {
        $(
            impl BitField for $ty {
                const WIDTH: u32 = <$ty>::BITS;

                #[inline]
                fn get_flag(self, index: u32) -> bool {
                    assert!(index < Self::WIDTH, "bit index out of range");
                    (self >> index) & 1 == 1
                }

                #[inline]
                fn set_flag(self, index: u32, value: bool) -> Self {
                    assert!(index < Self::WIDTH, "bit index out of range");
                    let mask: $ty = 1 << index;
                    if value {
                        self | mask
                    } else {
                        self & !mask
                    }
                }
            }
        )*
    };
}

impl_bit_field!(u8, u16, u32);

/// Free-function form of [`BitField::get_flag`].
///
/// # Examples
///
/// ```
/// use stepseq::sequencer::get_flag;
///
/// assert!(get_flag(0b0100u8, 2));
/// assert!(!get_flag(0b0100u8, 1));
/// ```
#[inline]
pub fn get_flag<F: BitField>(field: F, index: u32) -> bool {
    field.get_flag(index)
}

/// Free-function form of [`BitField::set_flag`].
///
/// # Examples
///
/// ```
/// use stepseq::sequencer::set_flag;
///
/// assert_eq!(set_flag(0b0001u8, 3, true), 0b1001);
/// assert_eq!(set_flag(0b1001u8, 0, false), 0b1000);
/// ```
#[inline]
pub fn set_flag<F: BitField>(field: F, index: u32, value: bool) -> F {
    field.set_flag(index, value)
}
