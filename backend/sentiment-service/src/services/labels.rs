//! Mapping from the classifier's placeholder labels to sentiment categories
use crate::models::Sentiment;

/// `LABEL_0`/`LABEL_1`/`LABEL_2` become Negative/Neutral/Positive;
/// anything else is returned unchanged.
pub fn normalize_label(label: &str) -> Sentiment {
    match label {
        "LABEL_0" => Sentiment::Negative,
        "LABEL_1" => Sentiment::Neutral,
        "LABEL_2" => Sentiment::Positive,
        other => Sentiment::Raw(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(normalize_label("LABEL_0"), Sentiment::Negative);
        assert_eq!(normalize_label("LABEL_1"), Sentiment::Neutral);
        assert_eq!(normalize_label("LABEL_2"), Sentiment::Positive);
    }

    #[test]
    fn test_unknown_labels_pass_through() {
        for label in ["LABEL_3", "positive", "", "label_0"] {
            assert_eq!(normalize_label(label).as_str(), label);
        }
    }

    #[test]
    fn test_normalizing_twice_is_stable() {
        for label in ["LABEL_0", "LABEL_1", "LABEL_2", "POS"] {
            let once = normalize_label(label);
            let twice = normalize_label(once.as_str());
            assert_eq!(once.as_str(), twice.as_str());
        }
    }
}
