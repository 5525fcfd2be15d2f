use crate::{
    compress::CompressedPhoto,
    error::{Error, Result},
};

/// Most photos a single report may carry. Checked by whoever selects photos,
/// not by [`PhotoStaging::add`].
pub const MAX_PHOTOS: usize = 10;

/// Compressed photos waiting for the next submission, in display and
/// submission order.
#[derive(Clone, Debug, Default)]
pub struct PhotoStaging {
    photos: Vec<CompressedPhoto>,
}

impl PhotoStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, photo: CompressedPhoto) {
        self.photos.push(photo);
    }

    /// Removes the photo at `index`, shifting the rest down.
    pub fn remove_at(&mut self, index: usize) -> Result<CompressedPhoto> {
        if index >= self.photos.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.photos.len(),
            });
        }
        Ok(self.photos.remove(index))
    }

    pub fn clear(&mut self) {
        self.photos.clear();
    }

    pub fn list(&self) -> &[CompressedPhoto] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Approximate bytes across all staged photos.
    pub fn total_size(&self) -> u64 {
        self.photos.iter().map(CompressedPhoto::size).sum()
    }

    /// One-line summary for the preview area.
    pub fn summary(&self) -> String {
        format!("{} photo(s) selected", self.photos.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::{tests::png, ImageCompressor};

    fn staged(n: usize) -> PhotoStaging {
        let compressor = ImageCompressor::default();
        let bytes = png(4, 4);
        let mut staging = PhotoStaging::new();
        for i in 0..n {
            staging.add(compressor.compress_bytes(&format!("p{i}.png"), &bytes).unwrap());
        }
        staging
    }

    fn names(staging: &PhotoStaging) -> Vec<&str> {
        staging.list().iter().map(CompressedPhoto::name).collect()
    }

    #[test]
    fn remove_keeps_order() {
        for k in 0..5 {
            let mut staging = staged(5);
            let removed = staging.remove_at(k).unwrap();
            assert_eq!(removed.name(), format!("p{k}.png"));
            let expected: Vec<String> = (0..5)
                .filter(|i| *i != k)
                .map(|i| format!("p{i}.png"))
                .collect();
            assert_eq!(names(&staging), expected);
        }
    }

    #[test]
    fn remove_out_of_range() {
        let mut staging = staged(2);
        assert!(matches!(
            staging.remove_at(2),
            Err(Error::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(staging.len(), 2);
    }

    #[test]
    fn add_is_unbounded_and_clear_empties() {
        let mut staging = staged(MAX_PHOTOS + 2);
        assert_eq!(staging.len(), 12);
        assert_eq!(staging.summary(), "12 photo(s) selected");
        assert!(staging.total_size() > 0);
        staging.clear();
        assert!(staging.is_empty());
        assert_eq!(staging.total_size(), 0);
    }
}
