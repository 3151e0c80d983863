use rand::{Rng, distr::Alphanumeric};

/// Random alphanumeric string drawn from the thread-local CSPRNG.
pub fn generate_random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn length_matches_request(length: u8) -> bool {
        generate_random_string(length as usize).chars().count() == length as usize
    }

    #[test]
    fn output_is_alphanumeric() {
        assert!(
            generate_random_string(512)
                .chars()
                .all(|c| c.is_ascii_alphanumeric())
        );
    }

    #[test]
    fn consecutive_strings_differ() {
        assert_ne!(generate_random_string(32), generate_random_string(32));
    }
}
