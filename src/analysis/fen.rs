//! Syntactic FEN validation
//!
//! Checks the shape of a position string before anything is sent to the
//! engine. This is purely syntactic: piece counts, king presence and legality
//! are the engine's business.
//!
//! # Rules
//!
//! 1. Exactly 6 whitespace-separated fields
//! 2. Placement splits on `/` into 8 ranks; digits `1-8` count as that many
//!    empty squares, `pnbrqkPNBRQK` count as one square; each rank totals 8
//! 3. Side to move is `w` or `b`
//! 4. Castling is non-empty and made only of `K`, `Q`, `k`, `q`, `-`
//! 5. En passant is `-` or a file `a-h` followed by rank `3` or `6`
//!
//! Fields 5 and 6 (halfmove clock and fullmove number) must be present but
//! are not inspected.

use thiserror::Error;

/// Which rule a rejected position broke
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 6 fields, found {found}")]
    FieldCount { found: usize },

    #[error("expected 8 ranks, found {found}")]
    RankCount { found: usize },

    #[error("unexpected character '{ch}' in rank {rank}")]
    InvalidPiece { rank: usize, ch: char },

    #[error("rank {rank} describes {squares} squares instead of 8")]
    RankWidth { rank: usize, squares: u32 },

    #[error("invalid side to move '{0}'")]
    SideToMove(String),

    #[error("invalid castling rights '{0}'")]
    Castling(String),

    #[error("invalid en passant square '{0}'")]
    EnPassant(String),
}

const PIECES: &str = "pnbrqkPNBRQK";

/// Validate `fen`, reporting the first rule it breaks
pub fn validate_fen(fen: &str) -> Result<(), FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(FenError::FieldCount {
            found: fields.len(),
        });
    }

    validate_placement(fields[0])?;

    if !matches!(fields[1], "w" | "b") {
        return Err(FenError::SideToMove(fields[1].to_string()));
    }

    let castling = fields[2];
    if !castling.chars().all(|c| matches!(c, 'K' | 'Q' | 'k' | 'q' | '-')) {
        return Err(FenError::Castling(castling.to_string()));
    }

    if !is_en_passant_field(fields[3]) {
        return Err(FenError::EnPassant(fields[3].to_string()));
    }

    Ok(())
}

/// `true` when `fen` passes every syntactic rule
pub fn is_valid_fen(fen: &str) -> bool {
    validate_fen(fen).is_ok()
}

fn validate_placement(placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::RankCount { found: ranks.len() });
    }

    for (index, rank) in ranks.iter().enumerate() {
        let rank_number = 8 - index;
        let mut squares = 0u32;
        for ch in rank.chars() {
            match ch {
                '1'..='8' => squares += ch.to_digit(10).unwrap_or_default(),
                c if PIECES.contains(c) => squares += 1,
                c => {
                    return Err(FenError::InvalidPiece {
                        rank: rank_number,
                        ch: c,
                    })
                }
            }
        }
        if squares != 8 {
            return Err(FenError::RankWidth {
                rank: rank_number,
                squares,
            });
        }
    }

    Ok(())
}

fn is_en_passant_field(field: &str) -> bool {
    if field == "-" {
        return true;
    }
    let bytes = field.as_bytes();
    bytes.len() == 2 && (b'a'..=b'h').contains(&bytes[0]) && matches!(bytes[1], b'3' | b'6')
}
