/// All `k`-element index combinations of `0..n` in lexicographic order.
pub(crate) struct Combinations {
    n: usize,
    indices: Option<Vec<usize>>,
}

impl Combinations {
    pub(crate) fn new(n: usize, k: usize) -> Self {
        let indices = if k <= n { Some((0..k).collect()) } else { None };
        Combinations { n, indices }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.indices.take()?;
        let k = current.len();
        // advance the rightmost index that still has room
        let mut next = current.clone();
        let mut pos = k;
        while pos > 0 {
            pos -= 1;
            if next[pos] < self.n - k + pos {
                next[pos] += 1;
                for later in pos + 1..k {
                    next[later] = next[later - 1] + 1;
                }
                self.indices = Some(next);
                break;
            }
        }
        Some(current)
    }
}

/// Every non-empty subset of `0..n`, smallest subsets first.
///
/// There are `2^n - 1` of them; callers bound `n`.
pub(crate) fn non_empty_subsets(n: usize) -> impl Iterator<Item = Vec<usize>> {
    (1..=n).flat_map(move |k| Combinations::new(n, k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinations_in_order() {
        let all: Vec<_> = Combinations::new(4, 2).collect();
        assert_eq!(
            all,
            vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]
        );
        assert_eq!(Combinations::new(3, 3).collect::<Vec<_>>(), vec![vec![0, 1, 2]]);
        assert_eq!(Combinations::new(2, 3).count(), 0);
    }

    #[test]
    fn power_set_size() {
        for n in 1..=6 {
            assert_eq!(non_empty_subsets(n).count(), (1 << n) - 1);
        }
        assert_eq!(non_empty_subsets(0).count(), 0);
    }
}
