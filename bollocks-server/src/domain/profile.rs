use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Profile {
    pub(crate) interests: Vec<String>,
}

impl Profile {
    /// Trims and lowercases interests, drops empty ones and collapses adjacent repeats.
    pub(crate) fn sanitized(interests: Vec<String>) -> Self {
        let mut clean: Vec<String> = Vec::with_capacity(interests.len());
        for interest in interests {
            let interest = interest.trim().to_lowercase();
            if interest.is_empty() {
                continue;
            }
            if clean.last() != Some(&interest) {
                clean.push(interest);
            }
        }
        Self { interests: clean }
    }
}
