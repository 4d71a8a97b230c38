//! Channel names and participant ids for a new call attempt.

use chrono::Utc;
use rand::Rng;

/// Highest participant id handed out; ids are drawn from `1..=MAX_PARTICIPANT_ID`.
pub const MAX_PARTICIPANT_ID: u32 = 99_999;

/// How many times the agent id is redrawn after colliding with the user id.
pub const MAX_REDRAWS: usize = 8;

/// Prefix used when the caller supplies none.
pub const DEFAULT_CHANNEL_PREFIX: &str = "voxbridge";

const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// The two participants of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantPair {
    pub user: u32,
    pub agent: u32,
}

/// Returns `"{prefix}-{unix_millis}-{suffix}"` with a 6 character lowercase
/// alphanumeric suffix.
///
/// Uniqueness rests on the timestamp plus the suffix; it is not
/// cryptographically bounded.
pub fn channel_name(prefix: &str) -> String {
    channel_name_with(prefix, &mut rand::thread_rng())
}

pub fn channel_name_with<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    let prefix = match prefix.trim() {
        "" => DEFAULT_CHANNEL_PREFIX,
        p => p,
    };
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), suffix)
}

/// Draws a user id and a distinct agent id.
///
/// The agent id is redrawn at most [`MAX_REDRAWS`] times; if it still
/// collides, the id next to the user's (wrapping inside the range) is used.
pub fn participant_pair<R: Rng + ?Sized>(rng: &mut R) -> ParticipantPair {
    let user = rng.gen_range(1..=MAX_PARTICIPANT_ID);
    for _ in 0..=MAX_REDRAWS {
        let agent = rng.gen_range(1..=MAX_PARTICIPANT_ID);
        if agent != user {
            return ParticipantPair { user, agent };
        }
    }
    let agent = if user == MAX_PARTICIPANT_ID { 1 } else { user + 1 };
    ParticipantPair { user, agent }
}
