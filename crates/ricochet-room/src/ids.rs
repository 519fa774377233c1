//! Room identifiers and display names.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ricochet_protocol::RoomId;

/// Characters a generated room id is drawn from. URL-safe.
pub const ROOM_ID_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

pub const ROOM_ID_LEN: usize = 6;

/// Nickname of every bot opponent.
pub const BOT_NICKNAME: &str = "Bot";

/// Produces candidate room ids. The directory retries on collision, so a
/// generator need not guarantee uniqueness.
pub trait RoomIdGenerator: Send + 'static {
    fn generate(&mut self) -> RoomId;
}

impl<F> RoomIdGenerator for F
where
    F: FnMut() -> RoomId + Send + 'static,
{
    fn generate(&mut self) -> RoomId {
        self()
    }
}

/// Random ids of [`ROOM_ID_LEN`] characters from [`ROOM_ID_ALPHABET`].
#[derive(Debug)]
pub struct RandomRoomIds {
    rng: StdRng,
}

impl RandomRoomIds {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomRoomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomIdGenerator for RandomRoomIds {
    fn generate(&mut self) -> RoomId {
        let id: String = (0..ROOM_ID_LEN)
            .map(|_| char::from(ROOM_ID_ALPHABET[self.rng.random_range(0..ROOM_ID_ALPHABET.len())]))
            .collect();
        RoomId(id)
    }
}

/// The requested nickname, or `Player_<n>` when it is missing or blank.
pub fn nickname_or_default(requested: Option<String>) -> String {
    match requested {
        Some(name) if !name.trim().is_empty() => name.trim().to_owned(),
        _ => format!("Player_{}", rand::rng().random_range(0..10_000)),
    }
}
