use crate::record::RecordId;

/// Bitset of record ids.
///
/// Filtering builds one set per predicate and intersects them, so membership,
/// intersection and ordered iteration are the operations that matter.
///
/// Ordering contract:
/// - `iter` yields ids in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    words: Vec<u64>,
    len: usize,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: RecordId) -> bool {
        let (word, mask) = locate(id);
        self.words.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Returns `true` if the set changed.
    pub fn insert(&mut self, id: RecordId) -> bool {
        let (word, mask) = locate(id);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        if self.words[word] & mask != 0 {
            return false;
        }
        self.words[word] |= mask;
        self.len += 1;
        true
    }

    /// Returns `true` if the set changed.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let (word, mask) = locate(id);
        match self.words.get_mut(word) {
            Some(w) if *w & mask != 0 => {
                *w &= !mask;
                self.len -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn intersect(&self, other: &Self) -> Self {
        let words: Vec<u64> = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a & b)
            .collect();
        let len = words.iter().map(|w| w.count_ones() as usize).sum();
        Self { words, len }
    }

    pub fn union(&self, other: &Self) -> Self {
        let (long, short) = if self.words.len() >= other.words.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut words = long.words.clone();
        for (w, s) in words.iter_mut().zip(&short.words) {
            *w |= s;
        }
        let len = words.iter().map(|w| w.count_ones() as usize).sum();
        Self { words, len }
    }

    pub fn iter(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros();
                bits &= bits - 1;
                Some(RecordId(wi as u32 * 64 + tz))
            })
        })
    }
}

impl FromIterator<RecordId> for RecordSet {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        let mut out = RecordSet::new();
        for id in iter {
            out.insert(id);
        }
        out
    }
}

fn locate(id: RecordId) -> (usize, u64) {
    ((id.0 / 64) as usize, 1u64 << (id.0 % 64))
}

#[cfg(test)]
mod tests {
    use super::RecordSet;
    use crate::record::RecordId;

    fn ids(set: &RecordSet) -> Vec<u32> {
        set.iter().map(|id| id.0).collect()
    }

    #[test]
    fn insert_remove_contains() {
        let mut s = RecordSet::new();
        assert!(s.insert(RecordId(3)));
        assert!(!s.insert(RecordId(3)));
        assert!(s.contains(RecordId(3)));
        assert!(!s.contains(RecordId(300)));
        assert_eq!(s.len(), 1);
        assert!(s.remove(RecordId(3)));
        assert!(!s.remove(RecordId(3)));
        assert!(s.is_empty());
    }

    #[test]
    fn iteration_is_ascending() {
        let s: RecordSet = [65, 2, 10, 128].into_iter().map(RecordId).collect();
        assert_eq!(ids(&s), vec![2, 10, 65, 128]);
    }

    #[test]
    fn intersect_and_union() {
        let a: RecordSet = [1, 2, 100].into_iter().map(RecordId).collect();
        let b: RecordSet = [2, 3, 101].into_iter().map(RecordId).collect();
        let i = a.intersect(&b);
        assert_eq!(ids(&i), vec![2]);
        assert_eq!(i.len(), 1);
        let u = a.union(&b);
        assert_eq!(ids(&u), vec![1, 2, 3, 100, 101]);
        assert_eq!(u.len(), 5);
    }
}
