use super::error::SinkError;
use crate::structs::thumbnail::Thumbnail;

/// The only boundary the pipeline emits through. Implementations own the
/// output layout; the pipeline never touches the filesystem itself
pub trait ThumbnailSink {
    fn write(&mut self, thumbnail: &Thumbnail) -> Result<(), SinkError>;
}
