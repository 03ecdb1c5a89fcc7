// WHY: Linear merges over page lists sorted by address
// Output is unspecified unless both inputs are sorted by ascending address.
// Lists produced by segmentation and by the index are sorted this way.

use std::cmp::Ordering;

use crate::page::Addressed;

/// Pages in both `a` and `b`. Entries are taken from `a`.
pub fn intersect<P: Addressed + Clone>(a: &[P], b: &[P]) -> Vec<P> {
    let mut c = Vec::new();
    let (mut ai, mut bi) = (0, 0);
    while ai < a.len() && bi < b.len() {
        match a[ai].address().cmp(&b[bi].address()) {
            Ordering::Less => ai += 1,
            Ordering::Greater => bi += 1,
            Ordering::Equal => {
                c.push(a[ai].clone());
                ai += 1;
                bi += 1;
            }
        }
    }
    c
}

/// Pages in `a` but not in `b`
pub fn subtract<P: Addressed + Clone>(a: &[P], b: &[P]) -> Vec<P> {
    let mut c = Vec::with_capacity(a.len());
    let (mut ai, mut bi) = (0, 0);
    while ai < a.len() && bi < b.len() {
        match a[ai].address().cmp(&b[bi].address()) {
            // undecided about a, bring b forward
            Ordering::Greater => bi += 1,
            // keep a
            Ordering::Less => {
                c.push(a[ai].clone());
                ai += 1;
            }
            // discard a
            Ordering::Equal => {
                ai += 1;
                bi += 1;
            }
        }
    }
    // out of b, keep the rest of a
    c.extend_from_slice(&a[ai..]);
    c
}

/// Pages in either `a` or `b`, once each. On equal addresses the page from `a`
/// is kept.
pub fn union<P: Addressed + Clone>(mut a: &[P], mut b: &[P]) -> Vec<P> {
    let mut c = Vec::with_capacity(a.len() + b.len());
    while let (Some(x), Some(y)) = (a.first(), b.first()) {
        match x.address().cmp(&y.address()) {
            Ordering::Less => {
                c.push(x.clone());
                a = &a[1..];
            }
            Ordering::Greater => {
                c.push(y.clone());
                b = &b[1..];
            }
            Ordering::Equal => {
                c.push(x.clone());
                a = &a[1..];
                b = &b[1..];
            }
        }
    }
    c.extend_from_slice(a);
    c.extend_from_slice(b);
    c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct At(usize, &'static str);

    impl Addressed for At {
        fn address(&self) -> usize {
            self.0
        }
    }

    fn addresses(list: &[At]) -> Vec<usize> {
        list.iter().map(|p| p.0).collect()
    }

    fn list(addresses: &[usize], side: &'static str) -> Vec<At> {
        addresses.iter().map(|&a| At(a, side)).collect()
    }

    #[test]
    fn test_intersect() {
        let a = list(&[1, 3, 5, 7], "a");
        let b = list(&[2, 3, 4, 7, 9], "b");
        let c = intersect(&a, &b);
        assert_eq!(addresses(&c), vec![3, 7]);
        assert!(c.iter().all(|p| p.1 == "a"));
        assert!(intersect(&a, &[]).is_empty());
    }

    #[test]
    fn test_subtract() {
        let a = list(&[1, 3, 5, 7, 9, 11], "a");
        let b = list(&[0, 3, 4, 9], "b");
        assert_eq!(addresses(&subtract(&a, &b)), vec![1, 5, 7, 11]);
        assert_eq!(addresses(&subtract(&a, &[])), addresses(&a));
        assert!(subtract(&[], &b).is_empty());
    }

    #[test]
    fn test_union_prefers_a_on_ties() {
        let a = list(&[1, 4, 6], "a");
        let b = list(&[2, 4, 8, 10], "b");
        let c = union(&a, &b);
        assert_eq!(addresses(&c), vec![1, 2, 4, 6, 8, 10]);
        assert_eq!(c[2], At(4, "a"));
    }

    #[test]
    fn test_union_with_empty() {
        let a = list(&[1, 2], "a");
        assert_eq!(union(&a, &[]), a);
        assert_eq!(union(&[], &a), a);
    }
}
