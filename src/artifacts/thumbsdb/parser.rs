use super::{
    catalog::{stream_id_from_name, Catalog},
    error::ThumbsDbError,
    stream::{decode_stream, DecodedStream},
};
use crate::artifacts::ole::olecf::OleFile;
use crate::filesystem::reader::ByteReader;
use crate::structs::thumbnail::CancelToken;
use log::{error, info, warn};

/// Everything recovered from one Thumbs.db container
#[derive(Debug)]
pub(crate) struct ThumbsDb {
    pub(crate) catalog: Option<Catalog>,
    pub(crate) streams: Vec<ThumbStream>,
    /**Streams whose decode failed and were skipped */
    pub(crate) skipped: u32,
}

#[derive(Debug)]
pub(crate) struct ThumbStream {
    pub(crate) name: String,
    /**Old numeric name convention, reversed back to the catalog id */
    pub(crate) stream_id: Option<u32>,
    /**Newer names are SIZE_THUMBCACHEID; the hex suffix joins the ESEDB */
    pub(crate) cache_id: Option<u64>,
    pub(crate) decoded: DecodedStream,
}

/// Parse a Thumbs.db OLE container: catalog first, then every image stream
/// in directory order
pub(crate) fn parse_thumbs_db(
    reader: &mut ByteReader,
    cancel: &CancelToken,
) -> Result<ThumbsDb, ThumbsDbError> {
    let ole_result = OleFile::parse(reader);
    let ole = match ole_result {
        Ok(result) => result,
        Err(err) => {
            error!("[thumbsdb] Could not parse OLE container {}: {err:?}", reader.path());
            return Err(ThumbsDbError::ParseOle);
        }
    };

    let catalog_name = "Catalog";
    let mut catalog = None;
    let catalog_index = ole.stream_by_name(catalog_name);
    if let Some(index) = catalog_index {
        let catalog_data_result = ole.stream(reader, index);
        match catalog_data_result {
            Ok(catalog_data) if catalog_data.is_empty() => {
                info!("[thumbsdb] Catalog stream is empty");
            }
            Ok(catalog_data) => match Catalog::parse_catalog(&catalog_data) {
                Ok(result) => {
                    if result.entry_count as usize != result.entries.len() {
                        warn!(
                            "[thumbsdb] Catalog declares {} entries but {} were parsed",
                            result.entry_count,
                            result.entries.len()
                        );
                    }
                    catalog = Some(result);
                }
                Err(err) => {
                    warn!("[thumbsdb] Could not decode Catalog stream: {err:?}");
                }
            },
            Err(err) => {
                warn!("[thumbsdb] Could not assemble Catalog stream: {err:?}");
            }
        }
    } else {
        info!("[thumbsdb] {} has no Catalog stream", reader.path());
    }

    let mut thumbs = ThumbsDb {
        catalog,
        streams: Vec::new(),
        skipped: 0,
    };

    for index in ole.stream_entries() {
        if cancel.is_cancelled() {
            return Err(ThumbsDbError::Cancelled);
        }
        if Some(index) == catalog_index {
            continue;
        }

        let name = ole.directory[index].name.clone();
        let stream_result = ole.stream(reader, index);
        let stream_data = match stream_result {
            Ok(result) => result,
            Err(err) => {
                warn!("[thumbsdb] Could not assemble stream {name}: {err:?}");
                thumbs.skipped += 1;
                continue;
            }
        };

        let decoded_result = decode_stream(&stream_data);
        let decoded = match decoded_result {
            Ok(result) => result,
            Err(err) => {
                warn!("[thumbsdb] Skipping stream {name}: {err:?}");
                thumbs.skipped += 1;
                continue;
            }
        };

        let entry = ThumbStream {
            stream_id: stream_id_from_name(&name),
            cache_id: cache_id_from_name(&name),
            name,
            decoded,
        };
        thumbs.streams.push(entry);
    }

    Ok(thumbs)
}

/// Vista-era Thumbs.db streams are named SIZE_THUMBCACHEID
/// (Ex: 256_1a2b3c4d5e6f7080)
pub(crate) fn cache_id_from_name(name: &str) -> Option<u64> {
    let (_, hex_id) = name.split_once('_')?;
    u64::from_str_radix(hex_id, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::cache_id_from_name;

    #[test]
    fn test_cache_id_from_name() {
        assert_eq!(
            cache_id_from_name("256_1a2b3c4d5e6f7080"),
            Some(0x1a2b3c4d5e6f7080)
        );
        assert_eq!(cache_id_from_name("1"), None);
        assert_eq!(cache_id_from_name("256_zz"), None);
    }
}
