//! Upload content sniffing.
//!
//! Matches the WHATWG MIME sniffing signature for MP4: only the first
//! [`SNIFF_LEN`] bytes are inspected, the leading box must be an `ftyp` box
//! whose declared size fits in that window, and one of its brands (major or
//! compatible) must start with `mp4`.

/// Number of leading bytes examined.
pub const SNIFF_LEN: usize = 512;

/// Whether `data` looks like an MP4 container.
pub fn is_mp4(data: &[u8]) -> bool {
    let data = &data[..data.len().min(SNIFF_LEN)];
    if data.len() < 12 {
        return false;
    }

    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if box_size > data.len() || box_size % 4 != 0 {
        return false;
    }
    if &data[4..8] != b"ftyp" {
        return false;
    }

    // Brands start at offset 8; offset 12 holds the minor version.
    (8..box_size)
        .step_by(4)
        .filter(|&offset| offset != 12)
        .any(|offset| data.get(offset..offset + 3) == Some(b"mp4".as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ftyp(major: &[u8; 4], compatible: &[&[u8; 4]]) -> Vec<u8> {
        let size = 16 + 4 * compatible.len();
        let mut data = Vec::with_capacity(size + 8);
        data.extend_from_slice(&(size as u32).to_be_bytes());
        data.extend_from_slice(b"ftyp");
        data.extend_from_slice(major);
        data.extend_from_slice(&[0, 0, 2, 0]);
        for brand in compatible {
            data.extend_from_slice(*brand);
        }
        // Start of the next box.
        data.extend_from_slice(&[0, 0, 0, 8]);
        data.extend_from_slice(b"free");
        data
    }

    #[test]
    fn test_mp4_major_brand() {
        assert!(is_mp4(&ftyp(b"mp42", &[b"isom"])));
    }

    #[test]
    fn test_mp4_compatible_brand() {
        assert!(is_mp4(&ftyp(b"isom", &[b"iso2", b"avc1", b"mp41"])));
    }

    #[test]
    fn test_other_iso_media_is_rejected() {
        // QuickTime
        assert!(!is_mp4(&ftyp(b"qt  ", &[b"qt  "])));
        // HEIF images also use ftyp
        assert!(!is_mp4(&ftyp(b"heic", &[b"mif1", b"heic"])));
    }

    #[test]
    fn test_minor_version_is_not_a_brand() {
        let mut data = ftyp(b"isom", &[b"avc1"]);
        data[12..16].copy_from_slice(b"mp4x");
        assert!(!is_mp4(&data));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(!is_mp4(b""));
        assert!(!is_mp4(b"not a video at all"));
        assert!(!is_mp4(b"GIF89a\x01\x00\x01\x00\x00\x00\x00"));
    }

    #[test]
    fn test_bad_box_size_is_rejected() {
        let mut data = ftyp(b"mp42", &[]);
        data[3] = 0xff;
        assert!(!is_mp4(&data));
        data[3] = 17;
        assert!(!is_mp4(&data));
    }
}
