use crate::disk_image::DiskImage;

/// calculate [blake3] hash of a finished image
pub fn digest(image: &DiskImage) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(image.as_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_follows_content() {
        let zeros = DiskImage::new();
        let mut touched = DiskImage::new();
        assert_eq!(digest(&zeros), digest(&touched));
        touched.as_bytes_mut()[0] = 0xeb;
        assert_ne!(digest(&zeros), digest(&touched));
    }
}
