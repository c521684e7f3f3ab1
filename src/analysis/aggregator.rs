//! Engagement metrics aggregation.
//!
//! Turns a profile's latest posts into a bounded summary: averages over
//! the recent posts plus a small sample for the LLM prompt. Everything in
//! here is pure; the reference instant is always passed in.

use crate::models::{MetricsSummary, Post, Profile, SamplePost};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::debug;

/// Length of the recency window.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Below this many recent posts the recency filter is dropped.
pub const MIN_RECENT_POSTS: usize = 5;

/// Posts taken (by input order, regardless of age) when the fallback triggers.
pub const FALLBACK_SAMPLE_SIZE: usize = 10;

/// Maximum number of posts forwarded in `sample_posts`.
pub const MAX_SAMPLE_POSTS: usize = 15;

/// Captions are cut to this many characters.
pub const MAX_CAPTION_CHARS: usize = 400;

const FORMAT_WHOLE_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";
const FORMAT_FRACTIONAL: &str = "%Y-%m-%dT%H:%M:%S%.f";
const MAX_FRACTION_DIGITS: usize = 6;

/// Why a post was left out of the recency partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// No timestamp at all (or an empty string).
    Missing,
    /// Timestamp present but not in an accepted format.
    Malformed(String),
}

/// Outcome of reading a post's timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampCheck {
    Parsed(NaiveDateTime),
    Excluded(ExclusionReason),
}

/// Posts split by the recency cutoff.
#[derive(Debug)]
pub struct RecencyPartition<'a> {
    /// Posts strictly newer than the cutoff, in input order.
    pub recent: Vec<&'a Post>,
    /// Input index and reason for every post whose timestamp was unusable.
    pub excluded: Vec<(usize, ExclusionReason)>,
}

/// Parse a provider timestamp.
///
/// One trailing `Z` is stripped, then exactly two layouts are accepted:
/// `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DDTHH:MM:SS.ffffff` (1 to 6 fraction
/// digits). Offsets, dates without a time, and everything else are excluded.
pub fn classify_timestamp(raw: Option<&str>) -> TimestampCheck {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return TimestampCheck::Excluded(ExclusionReason::Missing),
    };

    let trimmed = raw.strip_suffix('Z').unwrap_or(raw);

    let parsed = match trimmed.split_once('.') {
        Some((_, fraction)) => {
            let valid_fraction = !fraction.is_empty()
                && fraction.len() <= MAX_FRACTION_DIGITS
                && fraction.bytes().all(|b| b.is_ascii_digit());
            if !valid_fraction {
                return TimestampCheck::Excluded(ExclusionReason::Malformed(raw.to_string()));
            }
            NaiveDateTime::parse_from_str(trimmed, FORMAT_FRACTIONAL)
        }
        None => NaiveDateTime::parse_from_str(trimmed, FORMAT_WHOLE_SECONDS),
    };

    match parsed {
        Ok(ts) => TimestampCheck::Parsed(ts),
        Err(_) => TimestampCheck::Excluded(ExclusionReason::Malformed(raw.to_string())),
    }
}

/// Split posts into those strictly newer than `cutoff` and those whose
/// timestamp could not be read. Old posts with valid timestamps appear in
/// neither list.
pub fn partition_recent(posts: &[Post], cutoff: DateTime<Utc>) -> RecencyPartition<'_> {
    let mut partition = RecencyPartition {
        recent: Vec::new(),
        excluded: Vec::new(),
    };

    for (index, post) in posts.iter().enumerate() {
        match classify_timestamp(post.timestamp.as_deref()) {
            TimestampCheck::Parsed(ts) => {
                if ts.and_utc() > cutoff {
                    partition.recent.push(post);
                }
            }
            TimestampCheck::Excluded(reason) => {
                debug!("Post #{} excluded from recency window: {:?}", index, reason);
                partition.excluded.push((index, reason));
            }
        }
    }

    partition
}

/// Pick the posts the averages are computed over.
///
/// With at least [`MIN_RECENT_POSTS`] recent posts that is exactly the
/// recent set. Otherwise it is the first [`FALLBACK_SAMPLE_SIZE`] posts of
/// the input, whatever their age; the fallback ignores the cutoff entirely.
pub fn select_working_sample(posts: &[Post], now: DateTime<Utc>) -> Vec<&Post> {
    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let partition = partition_recent(posts, cutoff);

    if partition.recent.len() < MIN_RECENT_POSTS {
        debug!(
            "Only {} recent posts, falling back to the first {}",
            partition.recent.len(),
            FALLBACK_SAMPLE_SIZE
        );
        posts.iter().take(FALLBACK_SAMPLE_SIZE).collect()
    } else {
        partition.recent
    }
}

/// Aggregate engagement metrics for `profile` over `posts`.
///
/// Never fails: malformed timestamps are dropped from the recency check,
/// missing or negative counts count as zero, missing captions are empty.
pub fn aggregate(profile: &Profile, posts: &[Post], now: DateTime<Utc>) -> MetricsSummary {
    let sample = select_working_sample(posts, now);

    let average_likes = rounded_mean(sample.iter().map(|p| count_or_zero(p.like_count)));
    let average_comments = rounded_mean(sample.iter().map(|p| count_or_zero(p.comment_count)));

    // Image posts and videos without a view count must not pull the mean down.
    let average_video_views = rounded_mean(
        sample
            .iter()
            .filter(|p| p.kind.is_video())
            .filter_map(|p| non_negative(p.video_view_count)),
    );

    let sample_posts = sample
        .iter()
        .take(MAX_SAMPLE_POSTS)
        .map(|p| SamplePost {
            kind: p.kind.clone(),
            caption: truncate_caption(p.caption.as_deref().unwrap_or_default()),
            like_count: count_or_zero(p.like_count),
            comment_count: count_or_zero(p.comment_count),
        })
        .collect();

    MetricsSummary {
        username: profile.username.clone(),
        follower_count: profile.follower_count,
        biography: profile.biography.clone(),
        external_url: profile.external_url.clone(),
        recent_post_count: sample.len(),
        average_likes,
        average_comments,
        average_video_views,
        sample_posts,
    }
}

/// Aggregate over the posts embedded in the profile itself.
pub fn aggregate_profile(profile: &Profile, now: DateTime<Utc>) -> MetricsSummary {
    aggregate(profile, &profile.posts, now)
}

fn non_negative(value: Option<i64>) -> Option<u64> {
    value.and_then(|v| u64::try_from(v).ok())
}

fn count_or_zero(value: Option<i64>) -> u64 {
    non_negative(value).unwrap_or(0)
}

/// Integer mean rounded to nearest, ties to even. Zero for no values.
fn rounded_mean<I>(values: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0u128, 0u128), |(sum, count), v| (sum + u128::from(v), count + 1));

    if count == 0 {
        return 0;
    }

    let quotient = sum / count;
    let twice_remainder = (sum % count) * 2;
    let rounded = if twice_remainder > count || (twice_remainder == count && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    };

    u64::try_from(rounded).unwrap_or(u64::MAX)
}

fn truncate_caption(caption: &str) -> String {
    caption.chars().take(MAX_CAPTION_CHARS).collect()
}
