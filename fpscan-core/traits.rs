use std::path::Path;

use crate::error::{ExtractError, LoadError};
use crate::types::{DescriptorSet, KnnMatch};
use crate::ImageBuffer;

/// Turns one decoded image into keypoints and descriptors.
pub trait Extractor {
    fn extract(&self, image: &ImageBuffer) -> Result<DescriptorSet, ExtractError>;
}

/// k=2 nearest-neighbour search between two descriptor sets.
///
/// Returns one entry per query descriptor that has at least one neighbour in
/// `train`, in query order. `second` is `None` when `train` holds a single
/// descriptor.
pub trait NearestNeighborMatcher {
    fn knn2(&self, query: &DescriptorSet, train: &DescriptorSet) -> Vec<KnnMatch>;
}

/// Decodes a candidate file into a grayscale buffer.
pub trait ImageLoader {
    fn load(&self, path: &Path) -> Result<ImageBuffer, LoadError>;
}

impl<T: Extractor + ?Sized> Extractor for &T {
    fn extract(&self, image: &ImageBuffer) -> Result<DescriptorSet, ExtractError> {
        (**self).extract(image)
    }
}

impl<T: NearestNeighborMatcher + ?Sized> NearestNeighborMatcher for &T {
    fn knn2(&self, query: &DescriptorSet, train: &DescriptorSet) -> Vec<KnnMatch> {
        (**self).knn2(query, train)
    }
}

impl<T: ImageLoader + ?Sized> ImageLoader for &T {
    fn load(&self, path: &Path) -> Result<ImageBuffer, LoadError> {
        (**self).load(path)
    }
}
