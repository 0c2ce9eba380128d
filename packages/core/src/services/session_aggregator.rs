//! Per-topic summaries over a lesson's practice history.

use std::collections::HashMap;

use crate::models::{SessionRecord, TopicSummary};

/// Group sessions by topic and blend their metrics.
///
/// `sessions` must be ordered newest first. The first record seen for a topic
/// seeds its summary (`last_practiced`, raw metric values, count 1). Every
/// later record for the same topic increments the count and blends each
/// average as `round((previous + current) / 2)`. This is a pairwise blend,
/// not a cumulative mean, so the result depends on input order. A missing
/// score counts as 0.
///
/// Summaries come back in order of each topic's first appearance.
pub fn summarize_sessions(sessions: &[SessionRecord]) -> Vec<TopicSummary> {
    let mut summaries: Vec<TopicSummary> = Vec::new();
    let mut by_topic: HashMap<&str, usize> = HashMap::new();

    for session in sessions {
        let score = session.overall_score.unwrap_or(0.0);
        let duration = session.duration_seconds as f64;
        let word_count = session.word_count as f64;

        match by_topic.get(session.topic.as_str()) {
            Some(&index) => {
                let summary = &mut summaries[index];
                summary.session_count += 1;
                summary.avg_duration = blend(summary.avg_duration, duration);
                summary.avg_word_count = blend(summary.avg_word_count, word_count);
                summary.avg_score = blend(summary.avg_score, score);
            }
            None => {
                by_topic.insert(session.topic.as_str(), summaries.len());
                summaries.push(TopicSummary {
                    topic: session.topic.clone(),
                    last_practiced: session.created_at,
                    session_count: 1,
                    avg_duration: duration,
                    avg_word_count: word_count,
                    avg_score: score,
                });
            }
        }
    }

    summaries
}

fn blend(previous: f64, current: f64) -> f64 {
    ((previous + current) / 2.0).round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn session(
        topic: &str,
        minutes_ago: i64,
        duration: i64,
        words: i64,
        score: Option<f64>,
    ) -> SessionRecord {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        SessionRecord {
            id: format!("{}-{}", topic, minutes_ago),
            subject: "English".into(),
            lesson: "Travel".into(),
            topic: topic.into(),
            transcript: None,
            feedback: None,
            duration_seconds: duration,
            word_count: words,
            overall_score: score,
            created_at: base - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_empty_history_yields_no_summaries() {
        assert!(summarize_sessions(&[]).is_empty());
    }

    #[test]
    fn test_one_summary_per_topic_with_counts() {
        let sessions = vec![
            session("Airports", 1, 60, 100, Some(70.0)),
            session("Hotels", 2, 30, 50, Some(60.0)),
            session("Airports", 3, 90, 120, Some(80.0)),
            session("Food", 4, 45, 80, None),
            session("Airports", 5, 30, 40, Some(90.0)),
            session("Hotels", 6, 30, 50, Some(60.0)),
        ];

        let summaries = summarize_sessions(&sessions);

        assert_eq!(summaries.len(), 3);
        let counts: Vec<(&str, u32)> = summaries
            .iter()
            .map(|s| (s.topic.as_str(), s.session_count))
            .collect();
        assert_eq!(counts, vec![("Airports", 3), ("Hotels", 2), ("Food", 1)]);
    }

    #[test]
    fn test_pairwise_blend_is_not_a_true_mean() {
        let sessions = vec![
            session("X", 1, 10, 10, Some(80.0)),
            session("X", 2, 10, 10, Some(60.0)),
            session("X", 3, 10, 10, Some(100.0)),
        ];

        let summaries = summarize_sessions(&sessions);

        // round((round((80 + 60) / 2) + 100) / 2) = round((70 + 100) / 2) = 85
        assert_eq!(summaries[0].avg_score, 85.0);
        assert_eq!(summaries[0].session_count, 3);
    }

    #[test]
    fn test_first_record_seeds_last_practiced_and_raw_values() {
        let newest = session("Airports", 1, 61, 101, Some(77.5));
        let sessions = vec![newest.clone(), session("Airports", 10, 20, 30, Some(40.0))];

        let summary = &summarize_sessions(&sessions)[0];

        assert_eq!(summary.last_practiced, newest.created_at);
        assert_eq!(summary.avg_duration, 41.0); // round((61 + 20) / 2) = round(40.5)
        assert_eq!(summary.avg_word_count, 66.0); // round(65.5)
        assert_eq!(summary.avg_score, 59.0); // round(58.75)
    }

    #[test]
    fn test_single_record_keeps_unrounded_seed() {
        let summary = &summarize_sessions(&[session("Food", 1, 5, 7, Some(72.5))])[0];
        assert_eq!(summary.avg_score, 72.5);
    }

    #[test]
    fn test_missing_score_counts_as_zero() {
        let sessions = vec![
            session("Food", 1, 10, 10, None),
            session("Food", 2, 10, 10, Some(50.0)),
        ];

        let summary = &summarize_sessions(&sessions)[0];
        assert_eq!(summary.avg_score, 25.0);
    }
}
