// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Random invite codes and document IDs.

use crate::error::AppError;
use ring::rand::{SecureRandom, SystemRandom};

/// Characters used in invite codes.
pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Length of a generated invite code.
pub const INVITE_CODE_LEN: usize = 6;

const DOCUMENT_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const DOCUMENT_ID_LEN: usize = 20;

/// Generate a 6-character shareable invite code.
///
/// Codes are random, not unique by construction; callers check for collisions.
pub fn invite_code() -> Result<String, AppError> {
    random_string(&SystemRandom::new(), INVITE_CODE_ALPHABET, INVITE_CODE_LEN)
}

/// Generate a Firestore-style auto ID.
pub fn document_id() -> Result<String, AppError> {
    random_string(&SystemRandom::new(), DOCUMENT_ID_ALPHABET, DOCUMENT_ID_LEN)
}

/// Uniform random string over `alphabet`.
///
/// Bytes at or above the largest multiple of the alphabet size are rejected
/// so every character is equally likely.
fn random_string(
    rng: &dyn SecureRandom,
    alphabet: &[u8],
    len: usize,
) -> Result<String, AppError> {
    let limit = 256 - (256 % alphabet.len());
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 32];

    while out.len() < len {
        rng.fill(&mut buf)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;

        for &byte in buf.iter().filter(|b| usize::from(**b) < limit) {
            out.push(char::from(alphabet[usize::from(byte) % alphabet.len()]));
            if out.len() == len {
                break;
            }
        }
    }

    Ok(out)
}
