use super::{error::SinkError, sink::ThumbnailSink};
use crate::structs::thumbnail::Thumbnail;

/// Collects emitted thumbnails in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub thumbnails: Vec<Thumbnail>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }
}

impl ThumbnailSink for MemorySink {
    fn write(&mut self, thumbnail: &Thumbnail) -> Result<(), SinkError> {
        self.thumbnails.push(thumbnail.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemorySink;
    use crate::output::sink::ThumbnailSink;
    use crate::structs::thumbnail::Thumbnail;

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.write(&Thumbnail::new("Thumbs.db")).unwrap();
        assert_eq!(sink.thumbnails.len(), 1);
    }
}
