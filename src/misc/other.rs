use hashbrown::HashMap;

/// Fuzzy string matching, used to pick audio devices and suggest composition names.
pub trait Similarity {
    fn similarity(&self, other: &Self) -> f64;
}

impl<T: AsRef<str>> Similarity for T {
    fn similarity(&self, other: &Self) -> f64 {
        similarity(self.as_ref(), other.as_ref())
    }
}

/// Dice coefficient over character bigrams, case and whitespace insensitive.
/// Returns 1.0 for equal strings and 0.0 when either is too short to have a bigram.
pub fn similarity(a: &str, b: &str) -> f64 {
    let clean = |s: &str| {
        s.chars()
            .filter(|x| !x.is_whitespace() && *x != '_')
            .flat_map(char::to_lowercase)
            .collect::<Vec<_>>()
    };
    let (a, b) = (clean(a), clean(b));

    if a == b {
        return 1.0;
    }

    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams = HashMap::<(char, char), usize>::new();
    for pair in a.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_default() += 1;
    }

    let mut shared = 0;
    for pair in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])).filter(|x| **x > 0) {
            *count -= 1;
            shared += 1;
        }
    }

    (2 * shared) as f64 / (a.len() + b.len() - 2) as f64
}

/// Finds the candidate most similar to `wanted`, if any scores above zero.
pub fn closest<'a, T: AsRef<str>>(wanted: &str, candidates: &'a [T]) -> Option<&'a T> {
    candidates
        .iter()
        .map(|x| (similarity(wanted, x.as_ref()), x))
        .filter(|x| x.0 > 0.0)
        .reduce(|a, b| if a.0 >= b.0 { a } else { b })
        .map(|x| x.1)
}
