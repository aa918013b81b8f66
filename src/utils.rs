
/// Easily performs a `return Err(format!("...").into())` for maximum laziness
macro_rules! error {
    ($($args:tt)*) => {{
        return Err(format!($($args)*).into());
    }}
}
pub(crate) use error;

/// Helper functions for carving addresses into offset/index/tag fields
pub mod bits {
    /// Calculates the number of bits a rust type requires
    pub const fn bit_size<T>() -> u32 {
        (std::mem::size_of::<T>() * 8) as u32
    }

    /// Calculates the minimum number of bits required to index `n` things.
    /// Only meaningful for powers of two; `min_bits(1) == 0`.
    pub fn min_bits(n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        bit_size::<u32>() - n.leading_zeros() - 1
    }

    /// Checks if a number is a power of 2
    pub fn is_pow2(n: u32) -> bool {
        n.count_ones() == 1
    }

    /// A mask of the low `n` bits. Saturates at the full word.
    pub fn low_mask(n: u32) -> u32 {
        if n >= bit_size::<u32>() {
            u32::MAX
        } else {
            (1 << n) - 1
        }
    }

    /// Splits `x` at bit `n`, returning `(upper, lower)`.
    ///
    /// `lower` is the low `n` bits, `upper` is everything above them shifted down.
    pub fn split_at(x: u32, n: u32) -> (u32, u32) {
        let lower = x & low_mask(n);
        let upper = x.checked_shr(n).unwrap_or(0);
        (upper, lower)
    }

    /// Extracts the `width`-bit field that starts at bit `start`.
    pub fn field(x: u32, start: u32, width: u32) -> u32 {
        x.checked_shr(start).unwrap_or(0) & low_mask(width)
    }

    /// Inverse of [`split_at`]: places `upper` above an `n`-bit `lower`.
    pub fn join(upper: u32, lower: u32, n: u32) -> u32 {
        upper.checked_shl(n).unwrap_or(0) | (lower & low_mask(n))
    }

    #[cfg(test)]
    mod test {
        use super::*;

        #[test]
        fn does_it_even_work() {
            let (x, y) = split_at(119, 3);
            assert_eq!((x,y), (14,7));
        }

        #[test]
        fn try_harder() {
            let (x, y) = split_at(2273197461, 13);
            assert_eq!((x,y), (277489,7573))
        }

        #[test]
        fn split_at_the_edges() {
            assert_eq!(split_at(0xdead_beef, 0), (0xdead_beef, 0));
            assert_eq!(split_at(0xdead_beef, 32), (0, 0xdead_beef));
        }

        #[test]
        fn fields_and_joins() {
            // 0x0c84 with 8 offset bits and 2 index bits
            assert_eq!(field(0x0c84, 8, 2), 0);
            assert_eq!(field(0x0d84, 8, 2), 1);
            assert_eq!(field(0x0c84, 10, 22), 3);
            assert_eq!(join(0x3, 0x84, 8), 0x384);
            assert_eq!(join(0x3, 0x1ff, 8), 0x3ff);
        }

        #[test]
        fn log2_of_powers() {
            assert_eq!(min_bits(1), 0);
            assert_eq!(min_bits(2), 1);
            assert_eq!(min_bits(256), 8);
            assert_eq!(min_bits(8192), 13);
            assert!(is_pow2(64));
            assert!(!is_pow2(0));
            assert!(!is_pow2(12));
        }
    }
}
