//! Column-major bit matrix in one owned buffer.

/// `columns` bit vectors of `rows` bits each. Bits are LSB-first within a byte and every column starts
/// on a byte boundary, so a column can be filled by a PRG or sent over a channel as a plain byte slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitMatrix {
    columns: usize,
    rows: usize,
    column_bytes: usize,
    data: Vec<u8>,
}

impl BitMatrix {
    /// All-zero matrix.
    pub fn new(columns: usize, rows: usize) -> Self {
        Self::filled(columns, rows, 0)
    }

    /// Matrix whose every byte is `byte`.
    pub fn filled(columns: usize, rows: usize, byte: u8) -> Self {
        let column_bytes = (rows + 7) / 8;
        Self {
            columns,
            rows,
            column_bytes,
            data: vec![byte; columns * column_bytes],
        }
    }

    /// Number of columns.
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Bytes of one column.
    #[inline]
    pub fn column_bytes(&self) -> usize {
        self.column_bytes
    }

    /// Raw bytes of column `c`.
    #[inline]
    pub fn column(&self, c: usize) -> &[u8] {
        &self.data[c * self.column_bytes..(c + 1) * self.column_bytes]
    }

    /// Mutable raw bytes of column `c`.
    #[inline]
    pub fn column_mut(&mut self, c: usize) -> &mut [u8] {
        &mut self.data[c * self.column_bytes..(c + 1) * self.column_bytes]
    }

    #[inline]
    fn position(&self, c: usize, r: usize) -> (usize, u8) {
        debug_assert!(c < self.columns && r < self.rows);
        (c * self.column_bytes + (r >> 3), 1 << (r & 7))
    }

    /// Bit at column `c`, row `r`.
    #[inline]
    pub fn get(&self, c: usize, r: usize) -> bool {
        let (i, m) = self.position(c, r);
        self.data[i] & m != 0
    }

    /// Set the bit at column `c`, row `r` to one.
    #[inline]
    pub fn set(&mut self, c: usize, r: usize) {
        let (i, m) = self.position(c, r);
        self.data[i] |= m;
    }

    /// Set the bit at column `c`, row `r` to zero.
    #[inline]
    pub fn clear(&mut self, c: usize, r: usize) {
        let (i, m) = self.position(c, r);
        self.data[i] &= !m;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let mut m = BitMatrix::new(3, 20);
        assert_eq!(m.column_bytes(), 3);

        m.set(1, 0);
        m.set(1, 9);
        m.set(2, 19);

        assert!(m.get(1, 0));
        assert!(m.get(1, 9));
        assert!(m.get(2, 19));
        assert!(!m.get(0, 0));
        assert!(!m.get(1, 1));
        assert_eq!(m.column(1), &[0b0000_0001, 0b0000_0010, 0]);
        assert_eq!(m.column(2), &[0, 0, 0b0000_1000]);

        m.clear(1, 9);
        assert!(!m.get(1, 9));
        assert_eq!(m.column(1), &[1, 0, 0]);
    }

    #[test]
    fn test_filled_columns_are_independent() {
        let mut m = BitMatrix::filled(2, 16, 0xff);
        m.clear(0, 3);
        m.column_mut(1).copy_from_slice(&[0xaa, 0x55]);

        assert_eq!(m.column(0), &[0b1111_0111, 0xff]);
        assert!(m.get(1, 1));
        assert!(!m.get(1, 0));
        assert!(m.get(1, 8));
    }
}
