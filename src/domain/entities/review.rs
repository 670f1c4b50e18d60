use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

/// Header placed between the user's query and the retrieved reviews.
pub const RESULTS_HEADER: &str = "\n\nReturned results from vector db (done automatically): ";

/// One professor review returned by the similarity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewMatch {
    /// Professor name, used as the record id in the index.
    pub professor: String,
    pub score: Option<f32>,
    pub metadata: ReviewMetadata,
}

impl ReviewMatch {
    pub fn new(professor: impl Into<String>, metadata: ReviewMetadata) -> Self {
        Self {
            professor: professor.into(),
            score: None,
            metadata,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Stored metadata. Any field may be absent in the index; absent fields render empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewMetadata {
    pub review: Option<String>,
    pub subject: Option<String>,
    pub stars: Option<Stars>,
}

/// Star rating as stored. Numbers print without a trailing `.0`; text prints verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Stars {
    Number(f64),
    Text(String),
}

impl fmt::Display for Stars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl ReviewMetadata {
    pub fn new(review: impl Into<String>, subject: impl Into<String>, stars: f64) -> Self {
        Self {
            review: Some(review.into()),
            subject: Some(subject.into()),
            stars: Some(Stars::Number(stars)),
        }
    }
}

/// Renders matches, in the order given, into the block appended to the user's query.
///
/// With no matches the result is just [`RESULTS_HEADER`].
pub fn format_matches(matches: &[ReviewMatch]) -> String {
    let mut out = String::from(RESULTS_HEADER);

    for m in matches {
        let stars = m
            .metadata
            .stars
            .as_ref()
            .map(Stars::to_string)
            .unwrap_or_default();
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "\n\n    Professor: {}\n    Review: {}\n    Subject: {}\n    Stars: {}\n    \n\n\n    ",
            m.professor,
            m.metadata.review.as_deref().unwrap_or_default(),
            m.metadata.subject.as_deref().unwrap_or_default(),
            stars,
        );
    }

    out
}
