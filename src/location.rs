//! Row locations of a column group.
//!
//! One AES evaluation of an item's transformed value yields 16 bytes, which are cut into
//! `location_in_bytes`-byte little-endian integers, one per column of the group, masked to the height.

use crate::params::{ColumnGroup, PsiParams};
use anyhow::{anyhow, Result};
use scuttlebutt::{Aes128, Block};

/// Locations of every item for every column of one group, stored column by column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocationTable {
    columns: usize,
    items: usize,
    data: Vec<u32>,
}

/// Little-endian integer of up to four bytes.
#[inline]
pub fn read_location(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn fill_tile(
    parts: &mut [&mut [u32]],
    values: &[Block],
    cipher: &Aes128,
    location_in_bytes: usize,
    mask: u32,
    tile: usize,
) {
    let mut encrypted = Vec::with_capacity(tile.min(values.len()));
    for (t, chunk) in values.chunks(tile).enumerate() {
        encrypted.clear();
        encrypted.extend(chunk.iter().map(|&v| <[u8; 16]>::from(cipher.encrypt(v))));

        let low = t * tile;
        for (i, part) in parts.iter_mut().enumerate() {
            let range = i * location_in_bytes..(i + 1) * location_in_bytes;
            for (j, bytes) in encrypted.iter().enumerate() {
                part[low + j] = read_location(&bytes[range.clone()]) & mask;
            }
        }
    }
}

impl LocationTable {
    /// Derive the locations of `values` for `group` with the group's `cipher`.
    ///
    /// Items are encrypted `tile` at a time. With `threads > 1` the items are split into contiguous
    /// ranges handled by scoped workers, each writing only its own range of every column.
    pub fn compute(
        params: &PsiParams,
        group: &ColumnGroup,
        cipher: &Aes128,
        values: &[Block],
        tile: usize,
        threads: usize,
    ) -> Result<Self> {
        let items = values.len();
        let columns = group.len;
        let mut data = vec![0u32; columns * items];

        if items == 0 || columns == 0 {
            return Ok(Self {
                columns,
                items,
                data,
            });
        }

        let lb = params.location_in_bytes();
        let mask = params.location_mask();
        let tile = tile.max(1);
        let threads = threads.max(1);

        if threads == 1 {
            let mut parts = data.chunks_mut(items).collect::<Vec<_>>();
            fill_tile(&mut parts, values, cipher, lb, mask, tile);
        } else {
            let share = (items + threads - 1) / threads;
            let nshares = (items + share - 1) / share;
            let mut per_worker: Vec<Vec<&mut [u32]>> =
                (0..nshares).map(|_| Vec::with_capacity(columns)).collect();
            for column in data.chunks_mut(items) {
                for (parts, part) in per_worker.iter_mut().zip(column.chunks_mut(share)) {
                    parts.push(part);
                }
            }

            crossbeam::thread::scope(|s| {
                for (mut parts, chunk) in per_worker.into_iter().zip(values.chunks(share)) {
                    s.spawn(move |_| fill_tile(&mut parts, chunk, cipher, lb, mask, tile));
                }
            })
            .map_err(|_| anyhow!("location worker panicked @{}:{}", file!(), line!()))?;
        }

        Ok(Self {
            columns,
            items,
            data,
        })
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of items.
    pub fn items(&self) -> usize {
        self.items
    }

    /// Locations of all items for the `i`-th column of the group.
    #[inline]
    pub fn column(&self, i: usize) -> &[u32] {
        &self.data[i * self.items..(i + 1) * self.items]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{canonical_transform, CommonKeySchedule};
    use rand::Rng;
    use scuttlebutt::AesRng;

    fn random_items(n: usize, rng: &mut AesRng) -> Vec<Block> {
        (0..n).map(|_| rng.gen::<Block>()).collect()
    }

    #[test]
    fn test_read_location() {
        assert_eq!(read_location(&[0x01]), 1);
        assert_eq!(read_location(&[0x01, 0x02]), 0x0201);
        assert_eq!(read_location(&[0x01, 0x02, 0x03]), 0x030201);
        assert_eq!(read_location(&[0xff, 0xff, 0xff, 0xff]), u32::MAX);
    }

    #[test]
    fn test_locations_slice_the_prp_output() {
        let params = PsiParams::new(4, 4, 12, 10, 10, Block::default()).unwrap();
        let group = params.column_groups()[0];
        assert_eq!(group.len, 8);

        let cipher = CommonKeySchedule::new(Block::from(3u128)).next_cipher();
        let values = random_items(4, &mut AesRng::new());
        let table = LocationTable::compute(&params, &group, &cipher, &values, 256, 1).unwrap();

        for (j, &v) in values.iter().enumerate() {
            let bytes = <[u8; 16]>::from(cipher.encrypt(v));
            for i in 0..group.len {
                let raw = u16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]]) as u32;
                assert_eq!(table.column(i)[j], raw & 0xfff);
                assert!(table.column(i)[j] < 1 << 12);
            }
        }
    }

    #[test]
    fn test_locations_agree_between_parties() {
        let mut rng = AesRng::new();
        let seed = Block::from(123456u128);
        let params = PsiParams::new(300, 200, 20, 40, 10, seed).unwrap();

        let receiver_items = random_items(200, &mut rng);
        let mut sender_items = random_items(300, &mut rng);
        // plant common items at different positions
        for k in 0..50 {
            sender_items[250 - k] = receiver_items[3 * k];
        }

        let mut r_schedule = CommonKeySchedule::new(seed);
        let mut s_schedule = CommonKeySchedule::new(seed);
        let r_values = canonical_transform(&receiver_items, &r_schedule.next_cipher())
            .unwrap()
            .transformed_values;
        let s_values = canonical_transform(&sender_items, &s_schedule.next_cipher())
            .unwrap()
            .transformed_values;

        for group in params.column_groups() {
            let r = LocationTable::compute(
                &params,
                &group,
                &r_schedule.next_cipher(),
                &r_values,
                256,
                1,
            )
            .unwrap();
            let s = LocationTable::compute(
                &params,
                &group,
                &s_schedule.next_cipher(),
                &s_values,
                64,
                3,
            )
            .unwrap();

            for i in 0..group.len {
                for k in 0..50 {
                    assert_eq!(r.column(i)[3 * k], s.column(i)[250 - k]);
                }
            }
        }
    }

    #[test]
    fn test_tiles_and_threads_do_not_matter() {
        let mut rng = AesRng::new();
        let params = PsiParams::new(1, 1, 17, 64, 10, Block::default()).unwrap();
        let values = random_items(1000, &mut rng);
        let cipher = CommonKeySchedule::new(Block::from(11u128)).next_cipher();

        for group in params.column_groups() {
            let reference =
                LocationTable::compute(&params, &group, &cipher, &values, 1000, 1).unwrap();
            for (tile, threads) in [(1, 1), (7, 1), (64, 4), (256, 3), (4096, 8), (3, 50)] {
                let t = LocationTable::compute(&params, &group, &cipher, &values, tile, threads)
                    .unwrap();
                assert_eq!(t, reference);
            }
        }
    }

    #[test]
    fn test_empty_set() {
        let params = PsiParams::new(0, 0, 10, 16, 10, Block::default()).unwrap();
        let group = params.column_groups()[0];
        let cipher = CommonKeySchedule::new(Block::default()).next_cipher();
        let t = LocationTable::compute(&params, &group, &cipher, &[], 256, 4).unwrap();
        assert_eq!(t.items(), 0);
        assert_eq!(t.columns(), group.len);
        assert!(t.column(0).is_empty());
    }
}
