use crate::archive::format::{parse_octal, BLOCK_SIZE, CHECKSUM_LEN, CHECKSUM_OFFSET};

/// Contribution of the checksum field itself: eight blanks (8 * 32)
const BLANK_CHECKSUM_SUM: u32 = 256;

/// Header checksum: 256 plus the unsigned sum of every byte outside the
/// checksum field.
pub fn compute(block: &[u8; BLOCK_SIZE]) -> u32 {
    let field = CHECKSUM_OFFSET..CHECKSUM_OFFSET + CHECKSUM_LEN;
    block
        .iter()
        .enumerate()
        .filter(|(i, _)| !field.contains(i))
        .fold(BLANK_CHECKSUM_SUM, |sum, (_, &b)| sum + u32::from(b))
}

/// Same sum with every byte taken as signed. Some writers produce this for
/// headers carrying bytes above 0x7F.
pub fn compute_signed(block: &[u8; BLOCK_SIZE]) -> i64 {
    let field = CHECKSUM_OFFSET..CHECKSUM_OFFSET + CHECKSUM_LEN;
    block
        .iter()
        .enumerate()
        .filter(|(i, _)| !field.contains(i))
        .fold(i64::from(BLANK_CHECKSUM_SUM), |sum, (_, &b)| sum + i64::from(b as i8))
}

/// True if `stored` matches either the unsigned or the signed sum
pub fn matches(block: &[u8; BLOCK_SIZE], stored: u32) -> bool {
    stored == compute(block) || i64::from(stored) == compute_signed(block)
}

/// Checksum value stored in the header, if the field parses
pub fn stored(block: &[u8; BLOCK_SIZE]) -> Option<u32> {
    parse_octal(&block[CHECKSUM_OFFSET..CHECKSUM_OFFSET + CHECKSUM_LEN]).map(|v| v as u32)
}

/// Render the checksum as six octal digits, a NUL, and a trailing space
pub fn write(block: &mut [u8; BLOCK_SIZE], checksum: u32) {
    let text = format!("{:06o}", checksum);
    let field = &mut block[CHECKSUM_OFFSET..CHECKSUM_OFFSET + CHECKSUM_LEN];
    field[..6].copy_from_slice(&text.as_bytes()[text.len() - 6..]);
    field[6] = 0;
    field[7] = b' ';
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_block_checksum() {
        let block = [0u8; BLOCK_SIZE];
        assert_eq!(compute(&block), 256);
    }

    #[test]
    fn test_checksum_field_ignored() {
        let mut block = [0u8; BLOCK_SIZE];
        block[0] = b'a';
        let before = compute(&block);

        block[CHECKSUM_OFFSET..CHECKSUM_OFFSET + CHECKSUM_LEN].fill(b'7');
        assert_eq!(compute(&block), before);
        assert_eq!(before, 256 + 97);
    }

    #[test]
    fn test_high_bytes_are_unsigned() {
        let mut block = [0u8; BLOCK_SIZE];
        block[10] = 0xFF;
        assert_eq!(compute(&block), 256 + 255);
    }

    #[test]
    fn test_signed_sum_accepted() {
        let mut block = [0u8; BLOCK_SIZE];
        block[0] = b'a';
        block[1] = 0xE9;
        assert_eq!(compute(&block), 256 + 97 + 0xE9);
        assert_eq!(compute_signed(&block), 256 + 97 - 23);

        assert!(matches(&block, 256 + 97 + 0xE9));
        assert!(matches(&block, 256 + 97 - 23));
        assert!(!matches(&block, 256 + 97));
    }

    #[test]
    fn test_write_and_read_back() {
        let mut block = [0u8; BLOCK_SIZE];
        block[0] = b'x';
        let sum = compute(&block);
        write(&mut block, sum);

        assert_eq!(&block[CHECKSUM_OFFSET + 6..CHECKSUM_OFFSET + 8], b"\0 ");
        assert_eq!(stored(&block), Some(sum));
        assert_eq!(compute(&block), sum);
    }
}
