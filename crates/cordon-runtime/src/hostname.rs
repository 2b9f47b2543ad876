//! Decorative run-identifier generation.
//!
//! Names a run after a tarot card, prefixed with a low-bits hex
//! timestamp so simultaneous runs stay distinct. The result serves as
//! both the sandbox hostname and the cgroup directory name.

use std::time::{SystemTime, UNIX_EPOCH};

use cordon_common::error::Result;
use cordon_common::types::RunId;

const SUITS: [&str; 4] = ["swords", "wands", "pentacles", "cups"];

const MINOR: [&str; 14] = [
    "ace", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "page",
    "knight", "queen", "king",
];

const MAJOR: [&str; 22] = [
    "fool",
    "magician",
    "high-priestess",
    "empress",
    "emperor",
    "hierophant",
    "lovers",
    "chariot",
    "strength",
    "hermit",
    "wheel",
    "justice",
    "hanged-man",
    "death",
    "temperance",
    "devil",
    "tower",
    "star",
    "moon",
    "sun",
    "judgment",
    "world",
];

/// Draws a card from the 78-card deck and stamps it with the clock.
///
/// # Errors
///
/// Returns a usage error only if the generated name fails identifier
/// validation, which would indicate a broken word table.
pub fn choose() -> Result<RunId> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let secs = now.as_secs() & 0xf_ffff;
    let draw = now.subsec_nanos() as usize % (MAJOR.len() + MINOR.len() * SUITS.len());

    let name = if draw < MAJOR.len() {
        format!("{secs:05x}-{}", MAJOR[draw])
    } else {
        let draw = draw - MAJOR.len();
        format!(
            "{secs:05x}c-{}-of-{}",
            MINOR[draw % MINOR.len()],
            SUITS[draw / MINOR.len()]
        )
    };
    RunId::new(name)
}
