//! Vector of sets as packed bit vectors, one word stripe per set.
//!
//! Fast unions and intersections, no sharing: every set owns its bits.
//! Posted elements are applied immediately, so `process_post` is a no-op.

use super::SetVec;

#[derive(Debug, Clone)]
pub struct PackSetVec {
    n_set: usize,
    end: usize,
    /// 64-bit words per set.
    n_word: usize,
    data: Vec<u64>,
}

impl PackSetVec {
    #[inline]
    fn words(&self, i: usize) -> &[u64] {
        &self.data[i * self.n_word..(i + 1) * self.n_word]
    }
}

impl SetVec for PackSetVec {
    type Iter<'a> = PackSetVecIter<'a>;

    fn with_sets(n_set: usize, end: usize) -> Self {
        let n_word = end.div_ceil(64);
        PackSetVec {
            n_set,
            end,
            n_word,
            data: vec![0; n_set * n_word],
        }
    }

    fn resize(&mut self, n_set: usize, end: usize) {
        self.n_set = n_set;
        self.end = end;
        self.n_word = end.div_ceil(64);
        self.data.clear();
        self.data.resize(n_set * self.n_word, 0);
    }

    fn n_set(&self) -> usize {
        self.n_set
    }

    fn end(&self) -> usize {
        self.end
    }

    fn clear(&mut self, i: usize) {
        let w = self.n_word;
        self.data[i * w..(i + 1) * w].fill(0);
    }

    fn add_element(&mut self, i: usize, e: usize) {
        assert!(e < self.end, "element {} not below end {}", e, self.end);
        self.data[i * self.n_word + e / 64] |= 1u64 << (e % 64);
    }

    fn post_element(&mut self, i: usize, e: usize) {
        self.add_element(i, e);
    }

    fn process_post(&mut self, _i: usize) {}

    fn is_element(&self, i: usize, e: usize) -> bool {
        self.data[i * self.n_word + e / 64] & (1u64 << (e % 64)) != 0
    }

    fn number_elements(&self, i: usize) -> usize {
        self.words(i).iter().map(|w| w.count_ones() as usize).sum()
    }

    fn assignment(&mut self, target: usize, source: usize) {
        if target == source {
            return;
        }
        let w = self.n_word;
        let (t, s) = (target * w, source * w);
        for k in 0..w {
            self.data[t + k] = self.data[s + k];
        }
    }

    fn assign_from(&mut self, target: usize, other: &Self, source: usize) {
        let w = self.n_word;
        self.data[target * w..(target + 1) * w].copy_from_slice(other.words(source));
    }

    fn binary_union(&mut self, target: usize, left: usize, right: usize) {
        let w = self.n_word;
        let (t, l, r) = (target * w, left * w, right * w);
        for k in 0..w {
            self.data[t + k] = self.data[l + k] | self.data[r + k];
        }
    }

    fn union_from(&mut self, target: usize, left: usize, other: &Self, right: usize) {
        let w = self.n_word;
        let (t, l) = (target * w, left * w);
        for k in 0..w {
            self.data[t + k] = self.data[l + k] | other.data[right * w + k];
        }
    }

    fn binary_intersection(&mut self, target: usize, left: usize, right: usize) {
        let w = self.n_word;
        let (t, l, r) = (target * w, left * w, right * w);
        for k in 0..w {
            self.data[t + k] = self.data[l + k] & self.data[r + k];
        }
    }

    fn iter(&self, i: usize) -> PackSetVecIter<'_> {
        PackSetVecIter {
            words: self.words(i),
            end: self.end,
            next: 0,
        }
    }
}

/// Iterator over one packed set, in increasing element order.
pub struct PackSetVecIter<'a> {
    words: &'a [u64],
    end: usize,
    next: usize,
}

impl<'a> Iterator for PackSetVecIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.next < self.end {
            let e = self.next;
            self.next += 1;
            if self.words[e / 64] & (1u64 << (e % 64)) != 0 {
                return Some(e);
            }
        }
        None
    }
}
