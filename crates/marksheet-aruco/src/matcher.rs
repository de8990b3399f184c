//! Nearest-code lookup under the four marker rotations.

use crate::Dictionary;

/// A dictionary hit for an observed code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    pub id: u32,
    /// `0..=3`, such that `observed == rotate_code_u64(dict_code, n, rotation)`.
    pub rotation: u8,
    /// Bit errors against the rotated dictionary code.
    pub hamming: u8,
}

/// Brute-force matcher over all ids and rotations.
///
/// The four rotations of every code are precomputed once; a lookup is
/// `4 * len` XOR/popcounts, which is nothing for a 50-marker dictionary.
#[derive(Clone, Debug)]
pub struct Matcher {
    dict: Dictionary,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    /// `max_hamming` is clamped to the dictionary's correction capacity, so a
    /// match is never ambiguous between two ids.
    pub fn new(dict: Dictionary, max_hamming: u8) -> Self {
        assert!(
            dict.bit_count() <= 64,
            "{}: {} inner bits do not fit a u64",
            dict.name,
            dict.bit_count()
        );

        let n = dict.marker_size;
        let rotated = dict
            .codes
            .iter()
            .map(|&code| [0u8, 1, 2, 3].map(|r| rotate_code_u64(code, n, r)))
            .collect();

        Self {
            dict,
            max_hamming: max_hamming.min(dict.max_correction_bits),
            rotated,
        }
    }

    #[inline]
    pub fn dictionary(&self) -> Dictionary {
        self.dict
    }

    #[inline]
    pub fn max_hamming(&self) -> u8 {
        self.max_hamming
    }

    /// Closest `(id, rotation)` within `max_hamming` bit errors.
    pub fn match_code(&self, observed: u64) -> Option<Match> {
        let mut best: Option<Match> = None;

        for (id, rots) in self.rotated.iter().enumerate() {
            for (rot, &cand) in rots.iter().enumerate() {
                let hamming = (observed ^ cand).count_ones() as u8;
                if hamming > self.max_hamming {
                    continue;
                }
                if best.is_some_and(|b| b.hamming <= hamming) {
                    continue;
                }
                best = Some(Match {
                    id: id as u32,
                    rotation: rot as u8,
                    hamming,
                });
                if hamming == 0 {
                    return best;
                }
            }
        }

        best
    }
}

/// Rotate an `n × n` code (row-major, `idx = y * n + x`) by `rot` quarter turns.
///
/// One quarter turn moves the code's bottom-left bit to the top-left.
pub fn rotate_code_u64(code: u64, n: usize, rot: u8) -> u64 {
    let rot = rot & 3;
    if rot == 0 {
        return code;
    }

    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            let (sx, sy) = match rot {
                1 => (y, n - 1 - x),
                2 => (n - 1 - x, n - 1 - y),
                _ => (n - 1 - y, x),
            };
            let bit = (code >> (sy * n + sx)) & 1;
            out |= bit << (y * n + x);
        }
    }
    out
}
