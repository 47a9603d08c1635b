const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-length bit vector backing pool occupancy and dirty-uniform masks.
///
/// Indexing past `len` panics like a slice access would. Scans mask the
/// trailing partial word so bits beyond `len` can never be reported.
#[derive(Clone, Debug, Default)]
pub struct Bitset {
    words: Vec<u64>,
    len: usize,
}

impl Bitset {
    /// A bitset of `len` bits, all clear.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check(&self, index: usize) {
        assert!(
            index < self.len,
            "bit index {index} out of range for length {}",
            self.len
        );
    }

    pub fn set(&mut self, index: usize) {
        self.check(index);
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    pub fn clear(&mut self, index: usize) {
        self.check(index);
        self.words[index / WORD_BITS] &= !(1 << (index % WORD_BITS));
    }

    pub fn test(&self, index: usize) -> bool {
        self.check(index);
        self.words[index / WORD_BITS] >> (index % WORD_BITS) & 1 != 0
    }

    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Append one bit, growing the set by a word when needed.
    pub fn push(&mut self, value: bool) {
        if self.len == self.words.len() * WORD_BITS {
            self.words.push(0);
        }
        self.len += 1;
        if value {
            self.set(self.len - 1);
        }
    }

    pub fn count_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    // Valid bits of the final word; all other words are fully in range.
    fn tail_mask(&self) -> u64 {
        match self.len % WORD_BITS {
            0 => u64::MAX,
            tail => (1 << tail) - 1,
        }
    }

    /// Index of the lowest set bit, if any.
    pub fn find_first_set(&self) -> Option<usize> {
        let last = self.words.len().wrapping_sub(1);
        for (wi, &word) in self.words.iter().enumerate() {
            let word = if wi == last {
                word & self.tail_mask()
            } else {
                word
            };
            if word != 0 {
                return Some(wi * WORD_BITS + word.trailing_zeros() as usize);
            }
        }
        None
    }

    /// Index of the lowest clear bit, if any.
    pub fn find_first_unset(&self) -> Option<usize> {
        let last = self.words.len().wrapping_sub(1);
        for (wi, &word) in self.words.iter().enumerate() {
            let inverted = if wi == last {
                !word & self.tail_mask()
            } else {
                !word
            };
            if inverted != 0 {
                let index = wi * WORD_BITS + inverted.trailing_zeros() as usize;
                if index < self.len {
                    return Some(index);
                }
            }
        }
        None
    }

    /// Iterate the indices of set bits in ascending order.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(move |(wi, &word)| {
                let word = if wi == self.words.len() - 1 {
                    word & self.tail_mask()
                } else {
                    word
                };
                BitIter { word, base: wi * WORD_BITS }
            })
    }
}

struct BitIter {
    word: u64,
    base: usize,
}

impl Iterator for BitIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.word == 0 {
            return None;
        }
        let bit = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;
        Some(self.base + bit)
    }
}
