/*
  Kestrel, a UCI-compatible chess engine.
  Copyright (C) 2024 The Kestrel Authors.

  Kestrel is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  Kestrel is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! Magic bitboards, which answer "which squares does a slider on square `s` attack under
//! occupancy `occ`?" with one multiply, one shift, and one table load.
//!
//! The attack tables are filled in once, on first use, by enumerating every subset of each
//! square's relevant-occupancy mask and walking the slider's rays to the first blocker. After
//! that the structure is never written again.

use crate::base::{Bitboard, Direction, Square};

use once_cell::sync::Lazy;

#[must_use]
/// Compute the set of squares a rook on `sq` attacks when the board is occupied by `occupancy`.
/// The attack set includes the first blocker along each ray, friend or foe.
pub fn rook_attacks(occupancy: Bitboard, sq: Square) -> Bitboard {
    SLIDING.rooks[sq.index()].lookup(&SLIDING.table, occupancy)
}

#[must_use]
/// Compute the set of squares a bishop on `sq` attacks when the board is occupied by `occupancy`.
/// The attack set includes the first blocker along each ray, friend or foe.
pub fn bishop_attacks(occupancy: Bitboard, sq: Square) -> Bitboard {
    SLIDING.bishops[sq.index()].lookup(&SLIDING.table, occupancy)
}

#[must_use]
/// Compute the set of squares a queen on `sq` attacks when the board is occupied by `occupancy`.
pub fn queen_attacks(occupancy: Bitboard, sq: Square) -> Bitboard {
    rook_attacks(occupancy, sq) | bishop_attacks(occupancy, sq)
}

/// The hashing constants locating one square's slice of the shared attack table.
struct MagicEntry {
    /// The mask extracting the occupancy bits that matter for this square.
    mask: Bitboard,
    /// The magic multiplier turning a masked occupancy into a table index.
    factor: u64,
    /// How far the product is shifted down to form the index.
    shift: u8,
    /// Where this square's slice begins in the shared table.
    offset: usize,
}

impl MagicEntry {
    /// Look up the attack set for `occupancy` in this entry's slice of `table`.
    fn lookup(&self, table: &[Bitboard], occupancy: Bitboard) -> Bitboard {
        table[self.offset + magic_index(occupancy & self.mask, self.factor, self.shift)]
    }
}

/// The attack tables for both sliders, shared behind a single startup-initialized handle.
struct SlidingAttacks {
    /// The backing storage for every (square, occupancy) attack set of both sliders.
    table: Vec<Bitboard>,
    rooks: Vec<MagicEntry>,
    bishops: Vec<MagicEntry>,
}

static SLIDING: Lazy<SlidingAttacks> = Lazy::new(SlidingAttacks::build);

impl SlidingAttacks {
    /// Build the complete lookup structure by brute-force enumeration of blocker subsets.
    fn build() -> SlidingAttacks {
        let mut table = Vec::new();
        let rooks = fill_slider(
            &mut table,
            &ROOK_MAGICS,
            &ROOK_BITS,
            rook_mask,
            &Direction::ROOK_RAYS,
        );
        let bishops = fill_slider(
            &mut table,
            &BISHOP_MAGICS,
            &BISHOP_BITS,
            bishop_mask,
            &Direction::BISHOP_RAYS,
        );
        SlidingAttacks {
            table,
            rooks,
            bishops,
        }
    }
}

/// Append one slider's 64 table slices onto `table`, returning the entries that index them.
fn fill_slider(
    table: &mut Vec<Bitboard>,
    magics: &[u64; 64],
    bits: &[u8; 64],
    mask_of: fn(Square) -> Bitboard,
    rays: &[Direction],
) -> Vec<MagicEntry> {
    let mut entries = Vec::with_capacity(64);
    for sq in Bitboard::ALL {
        let offset = table.len();
        let shift = 64 - bits[sq.index()];
        let mask = mask_of(sq);
        table.resize(offset + (1 << bits[sq.index()]), Bitboard::EMPTY);

        // Enumerate every subset of the mask with the carry-rippler, computing the true attack
        // set for each by ray walking.
        let mut subset = 0u64;
        loop {
            let occupancy = Bitboard::new(subset);
            let slot = offset + magic_index(occupancy, magics[sq.index()], shift);
            table[slot] = ray_attacks(sq, rays, occupancy);
            subset = subset.wrapping_sub(mask.as_u64()) & mask.as_u64();
            if subset == 0 {
                break;
            }
        }

        entries.push(MagicEntry {
            mask,
            factor: magics[sq.index()],
            shift,
            offset,
        });
    }
    entries
}

#[allow(clippy::cast_possible_truncation)]
/// Hash a masked occupancy into a table index.
fn magic_index(occupancy: Bitboard, factor: u64, shift: u8) -> usize {
    (occupancy.as_u64().wrapping_mul(factor) >> shift) as usize
}

/// The relevant-occupancy mask for a rook: its rank and file, without the final square of each
/// ray and without the rook's own square.
fn rook_mask(sq: Square) -> Bitboard {
    const FILE_ENDS: Bitboard = Bitboard::new(0xFF00_0000_0000_00FF);
    const RANK_ENDS: Bitboard = Bitboard::new(0x8181_8181_8181_8181);
    let horizontal = Bitboard::rank_of(sq) & !RANK_ENDS;
    let vertical = Bitboard::file_of(sq) & !FILE_ENDS;
    (horizontal | vertical) & !Bitboard::from(sq)
}

/// The relevant-occupancy mask for a bishop: both diagonals, without the board's border squares.
fn bishop_mask(sq: Square) -> Bitboard {
    const BORDER: Bitboard = Bitboard::new(0xFF81_8181_8181_81FF);
    (Bitboard::diagonal(sq) ^ Bitboard::anti_diagonal(sq)) & !BORDER
}

/// Compute a slider's attack set the slow way, stepping along each ray until the first occupied
/// square (inclusive) or the edge of the board.
pub(crate) fn ray_attacks(sq: Square, rays: &[Direction], occupancy: Bitboard) -> Bitboard {
    let mut result = Bitboard::EMPTY;
    for &ray in rays {
        let mut current = sq;
        loop {
            #[allow(clippy::cast_possible_truncation)]
            let stepped = current.index() as i16 + i16::from(ray.0);
            if !(0..64).contains(&stepped) {
                break;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let next = Square::wrapping(stepped as u8);
            if next.chebyshev_to(current) > 1 {
                // the step wrapped around a board edge
                break;
            }
            result.insert(next);
            if occupancy.contains(next) {
                break;
            }
            current = next;
        }
    }
    result
}

/// Saved magic factors for rooks.
///
/// The undersized rank-7 and rank-8 entries are published constants from the Chess Programming
/// Wiki, credited inline.
const ROOK_MAGICS: [u64; 64] = [
    0x4080_0020_4000_1480, // a1
    0x0040_0010_0140_2000, // b1
    0x0300_2000_1810_4100, // c1
    0x2100_0409_0110_0120, // d1
    0x8a00_0600_0408_2070, // e1
    0x0080_0144_0002_0080, // f1
    0x1100_2500_208a_0004, // g1
    0x0900_0042_2201_8100, // h1
    0x0208_8002_28c0_0081, // a2
    0x2280_4010_0340_2000, // b2
    0x0008_8010_0020_0184, // c2
    0x0001_0020_1000_0900, // d2
    0x0182_0006_0010_6008, // e2
    0x2058_8004_0080_0200, // f2
    0x0004_8002_0080_0900, // g2
    0x052d_0012_0040_a100, // h2
    0x0540_0880_0080_24c1, // a3
    0x2000_8480_4002_2000, // b3
    0x0400_4100_1100_6000, // c3
    0x0040_a100_3001_0108, // d3
    0x1204_8080_0800_0402, // e3
    0x0802_8080_0400_2201, // f3
    0x1002_8080_5200_0500, // g3
    0x0004_0a00_2112_4184, // h3
    0x0640_0128_8008_8040, // a4
    0x8410_4000_8020_008a, // b4
    0x0400_2008_8010_0080, // c4
    0x2001_0121_0009_1004, // d4
    0x1200_0d01_0008_0010, // e4
    0x6004_0004_0120_1008, // f4
    0x7500_aa04_0008_4110, // g4
    0x0100_0052_0004_0981, // h4
    0x0040_8040_0280_0020, // a5
    0x0470_0020_0640_0240, // b5
    0x0001_2000_8080_1000, // c5
    0x0000_0812_0200_2040, // d5
    0x00c0_8044_0080_0800, // e5
    0x9000_800a_0080_0400, // f5
    0x0001_0004_0100_0600, // g5
    0x0042_1088_ca00_2401, // h5
    0x0000_c000_228d_8000, // a6
    0x6410_0420_1440_4001, // b6
    0x1002_0040_8226_0014, // c6
    0x206a_0088_11c2_0021, // d6
    0x0002_0018_1022_0024, // e6
    0x2001_0200_0400_8080, // f6
    0x1000_0801_100c_001a, // g6
    0x0048_0082_5402_0011, // h6
    0x48FF_FE99_FECF_AA00, // a7, found by Grant Osborne
    0x48FF_FE99_FECF_AA00, // b7, found by Grant Osborne
    0x497F_FFAD_FF9C_2E00, // c7, found by Grant Osborne
    0x613F_FFDD_FFCE_9200, // d7, found by Grant Osborne
    0xffff_ffe9_ffe7_ce00, // e7, found by Volker Annuss
    0xffff_fff5_fff3_e600, // f7, found by Volker Annuss
    0x0003_ff95_e5e6_a4c0, // g7, found by Niklas Fiekas
    0x510F_FFF5_F63C_96A0, // h7, found by Grant Osborne
    0xEBFF_FFB9_FF9F_C526, // a8, found by Grant Osborne
    0x61FF_FEDD_FEED_AEAE, // b8, found by Grant Osborne
    0x53BF_FFED_FFDE_B1A2, // c8, found by Grant Osborne
    0x127F_FFB9_FFDF_B5F6, // d8, found by Grant Osborne
    0x411F_FFDD_FFDB_F4D6, // e8, found by Grant Osborne
    0x0822_0024_0810_4502, // f8
    0x0003_ffef_27ee_be74, // g8, found by Peter Österlund 
    0x7645_FFFE_CBFE_A79E, // h8, found by Grant Osborne
];

/// Saved magic factors for bishops.
///
/// The undersized entries are published constants from the Chess Programming Wiki, credited
/// inline.
const BISHOP_MAGICS: [u64; 64] = [
    0xffed_f9fd_7cfc_ffff, // a1, found by Gerd Isenberg
    0xfc09_6285_4a77_f576, // b1, found by Gerd Isenberg
    0x0012_2808_c102_a004, // c1
    0x2851_2400_8240_0440, // d1
    0x0011_1040_1100_0202, // e1
    0x0008_2208_2000_0010, // f1
    0xfc0a_66c6_4a7e_f576, // g1, found by Gerd Isenberg
    0x7ffd_fdfc_bd79_ffff, // h1, found by Gerd Isenberg
    0xfc08_46a6_4a34_fff6, // a2, found by Gerd Isenberg
    0xfc08_7a87_4a3c_f7f6, // b2, found by Gerd Isenberg
    0x0009_8802_0420_a000, // c2
    0x8000_4404_0080_8200, // d2
    0x208c_8450_c001_3407, // e2
    0x1980_1105_2010_8030, // f2
    0xfc08_64ae_59b4_ff76, // g2, found by Gerd Isenberg
    0x3c08_60af_4b35_ff76, // h2, found by Gerd Isenberg
    0x73C0_1AF5_6CF4_CFFB, // a3, found by Richard Pijl
    0x41A0_1CFA_D64A_AFFC, // b3, found by Richard Pijl
    0x0604_0002_04a2_0202, // c3
    0x0002_8208_0602_4000, // d3
    0x008a_0024_2201_0201, // e3
    0x2082_0040_8801_0802, // f3
    0x7c0c_028f_5b34_ff76, // g3, found by Gerd Isenberg
    0xfc0a_028e_5ab4_df76, // h3, found by Gerd Isenberg
    0x0810_0420_d104_1080, // a4
    0x0904_5100_0210_0100, // b4
    0x0202_2808_0406_4403, // c4
    0x004c_0040_0c03_0082, // d4
    0x0602_0010_0200_5011, // e4
    0x7209_0200_c108_9000, // f4
    0x4211_4104_2400_8805, // g4
    0x0002_8484_2126_0804, // h4
    0xc001_0412_1121_2004, // a5
    0x0208_0188_0004_4800, // b5
    0x0080_2064_1058_0800, // c5
    0x0000_2011_0008_0084, // d5
    0x0208_0034_0009_4100, // e5
    0x2190_4102_0000_4058, // f5
    0x0188_8214_0180_8080, // g5
    0x2006_0a02_0000_c4c0, // h5
    0xDCEF_D9B5_4BFC_C09F, // a6, found by Richard Pijl
    0xF95F_FA76_5AFD_602B, // b6, found by Richard Pijl
    0x200a_1041_1000_2040, // c6
    0x0800_000c_0831_0c00, // d6
    0x0218_0401_0a01_0400, // e6
    0x1092_2004_0022_4100, // f6
    0x43ff_9a5c_f4ca_0c01, // g6, found by Gerd Isenberg
    0x4BFF_CD8E_7C58_7601, // h6, found by Richard Pijl
    0xfc0f_f286_5334_f576, // a7, found by Gerd Isenberg
    0xfc0b_f6ce_5924_f576, // b7, found by Gerd Isenberg
    0x8052_2060_8c30_0001, // c7
    0x2084_1050_4202_0400, // d7
    0xe018_8010_2206_0220, // e7
    0x0001_1220_4901_0200, // f7
    0xc3ff_b7dc_36ca_8c89, // g7, found by Gerd Isenberg
    0xc3ff_8a54_f4ca_2c89, // h7, found by Gerd Isenberg
    0xffff_fcfc_fd79_edff, // a8, found by Gerd Isenberg
    0xfc08_63fc_cb14_7576, // b8, found by Gerd Isenberg
    0x40a0_0400_6213_3000, // c8
    0x0142_0280_0084_0400, // d8
    0x0009_0900_1006_1200, // e8
    0x0800_8445_2810_0308, // f8
    0xfc08_7e8e_4bb2_f736, // g8, found by Gerd Isenberg
    0x43ff_9e4e_f4ca_2c89, // h8, found by Gerd Isenberg
];

/// The table-index width for rook lookups at each square.
const ROOK_BITS: [u8; 64] = [
    12, 11, 11, 11, 11, 11, 11, 12, // rank 1
    11, 10, 10, 10, 10, 10, 10, 11, // 2
    11, 10, 10, 10, 10, 10, 10, 11, // 3
    11, 10, 10, 10, 10, 10, 10, 11, // 4
    11, 10, 10, 10, 10, 10, 10, 11, // 5
    11, 10, 10, 10, 10, 10, 10, 11, // 6
    10, 9, 9, 9, 9, 9, 9, 10, // 7
    11, 10, 10, 10, 10, 11, 10, 11, // 8
];

/// The table-index width for bishop lookups at each square.
const BISHOP_BITS: [u8; 64] = [
    5, 4, 5, 5, 5, 5, 4, 5, // rank 1
    4, 4, 5, 5, 5, 5, 4, 4, // 2
    4, 4, 7, 7, 7, 7, 4, 4, // 3
    5, 5, 7, 9, 9, 7, 5, 5, // 4
    5, 5, 7, 9, 9, 7, 5, 5, // 5
    4, 4, 7, 7, 7, 7, 4, 4, // 6
    4, 4, 5, 5, 5, 5, 4, 4, // 7
    5, 4, 5, 5, 5, 5, 4, 5, // 8
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_masks() {
        assert_eq!(rook_mask(Square::A1), Bitboard::new(0x0001_0101_0101_017E));
        assert_eq!(rook_mask(Square::E1), Bitboard::new(0x0010_1010_1010_106E));
        assert_eq!(rook_mask(Square::E5), Bitboard::new(0x0010_106E_1010_1000));
    }

    #[test]
    fn bishop_masks() {
        assert_eq!(
            bishop_mask(Square::A1),
            Bitboard::new(0x0040_2010_0804_0200)
        );
        assert_eq!(
            bishop_mask(Square::E1),
            Bitboard::new(0x0000_0000_0244_2800)
        );
        assert_eq!(
            bishop_mask(Square::E5),
            Bitboard::new(0x0044_2800_2844_0200)
        );
    }

    #[test]
    /// Every rook lookup must agree with ray walking, for every relevant occupancy.
    fn all_rook_attacks() {
        for sq in Bitboard::ALL {
            let mask = rook_mask(sq);
            let mut subset = 0u64;
            loop {
                let occupancy = Bitboard::new(subset);
                assert_eq!(
                    rook_attacks(occupancy, sq),
                    ray_attacks(sq, &Direction::ROOK_RAYS, occupancy)
                );
                subset = subset.wrapping_sub(mask.as_u64()) & mask.as_u64();
                if subset == 0 {
                    break;
                }
            }
        }
    }

    #[test]
    /// Every bishop lookup must agree with ray walking, for every relevant occupancy.
    fn all_bishop_attacks() {
        for sq in Bitboard::ALL {
            let mask = bishop_mask(sq);
            let mut subset = 0u64;
            loop {
                let occupancy = Bitboard::new(subset);
                assert_eq!(
                    bishop_attacks(occupancy, sq),
                    ray_attacks(sq, &Direction::BISHOP_RAYS, occupancy)
                );
                subset = subset.wrapping_sub(mask.as_u64()) & mask.as_u64();
                if subset == 0 {
                    break;
                }
            }
        }
    }

    #[test]
    fn queen_is_rook_plus_bishop() {
        let occupancy = Bitboard::new(0x0000_0012_4400_8100);
        for sq in Bitboard::ALL {
            assert_eq!(
                queen_attacks(occupancy, sq),
                rook_attacks(occupancy, sq) | bishop_attacks(occupancy, sq)
            );
        }
    }
}
