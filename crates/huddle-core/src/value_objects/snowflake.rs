//! 64-bit time-ordered ids
//!
//! Layout, high to low: 42 bits of milliseconds since [`Snowflake::EPOCH`],
//! 10 bits of worker id, 12 bits of per-millisecond sequence. Ids sort by
//! creation time and stay unique across workers without coordination.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const TIMESTAMP_SHIFT: u8 = 22;
const WORKER_SHIFT: u8 = 12;
const WORKER_MAX: u16 = 1 << 10;
const SEQUENCE_MASK: i64 = 0xFFF;

/// Time-ordered 64-bit id
///
/// JSON representation is a decimal string so JavaScript clients never hit
/// the 2^53 integer precision cliff; numbers are still accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(i64);

impl Snowflake {
    /// Epoch the timestamp bits count from: 2023-01-01 00:00:00 UTC
    pub const EPOCH: i64 = 1_672_531_200_000;

    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Milliseconds since the Unix epoch at which this id was minted
    #[inline]
    pub fn timestamp(&self) -> i64 {
        (self.0 >> TIMESTAMP_SHIFT) + Self::EPOCH
    }

    /// Worker that minted this id
    #[inline]
    pub fn worker_id(&self) -> u16 {
        ((self.0 >> WORKER_SHIFT) & i64::from(WORKER_MAX - 1)) as u16
    }
}

/// Error when parsing a Snowflake from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("not a valid snowflake id")]
    InvalidFormat,
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for Snowflake {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<Snowflake> for i64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl std::str::FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Snowflake)
            .map_err(|_| SnowflakeParseError::InvalidFormat)
    }
}

impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a snowflake id as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Snowflake, E> {
                v.parse().map_err(|_| E::custom("not a valid snowflake id"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Snowflake, E> {
                Ok(Snowflake(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snowflake, E> {
                Ok(Snowflake(v as i64))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Lock-free snowflake minting
///
/// The last-used timestamp and sequence live in one atomic word,
/// `(millis << 12) | sequence`, so a single compare-exchange claims both.
/// Up to 4096 ids per millisecond per worker; when a millisecond is
/// exhausted the caller spins into the next one.
pub struct SnowflakeGenerator {
    worker_id: u16,
    state: AtomicI64,
}

impl SnowflakeGenerator {
    /// # Panics
    /// Panics if `worker_id` does not fit in 10 bits.
    pub fn new(worker_id: u16) -> Self {
        assert!(worker_id < WORKER_MAX, "Worker ID must be < 1024");
        Self {
            worker_id,
            state: AtomicI64::new(0),
        }
    }

    /// Mint the next id
    pub fn generate(&self) -> Snowflake {
        loop {
            let observed = self.state.load(Ordering::Acquire);
            let last_millis = observed >> WORKER_SHIFT;
            let last_seq = observed & SEQUENCE_MASK;

            let now = now_millis();
            let (millis, seq) = if now > last_millis {
                (now, 0)
            } else if last_seq < SEQUENCE_MASK {
                // Same millisecond, or the clock stepped backwards
                (last_millis, last_seq + 1)
            } else {
                (spin_past(last_millis), 0)
            };

            let claimed = (millis << WORKER_SHIFT) | seq;
            if self
                .state
                .compare_exchange(observed, claimed, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                let id = ((millis - Snowflake::EPOCH) << TIMESTAMP_SHIFT)
                    | (i64::from(self.worker_id) << WORKER_SHIFT)
                    | seq;
                return Snowflake::new(id);
            }
            // Another thread won the word, take a fresh look
        }
    }

    pub fn worker_id(&self) -> u16 {
        self.worker_id
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

#[inline]
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Busy-wait until the wall clock passes `millis`
fn spin_past(millis: i64) -> i64 {
    let mut now = now_millis();
    while now <= millis {
        std::hint::spin_loop();
        now = now_millis();
    }
    now
}
