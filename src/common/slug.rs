use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub const SLUG_LEN: usize = 8;

/// Short public identifier for a video. Uniqueness is probabilistic only;
/// the artifact directory creation is what actually catches a collision.
pub fn generate() -> String {
    let mut rng = rand::rng();
    (0..SLUG_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_short_and_url_safe() {
        for _ in 0..100 {
            let slug = generate();
            assert_eq!(slug.len(), SLUG_LEN);
            assert!(slug
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn slugs_vary() {
        let a = generate();
        let b = generate();
        // 36^8 values; two equal draws in a row means the RNG is broken.
        assert_ne!(a, b);
    }
}
