use crate::artifacts::ole::header::{OLE_SIGNATURE, OLE_SIGNATURE_BETA};
use crate::artifacts::search::esedb::{EseRow, EsedbView};
use crate::artifacts::thumbcache::{
    cache::{parse_cache, CMMM_SIGNATURE},
    error::ThumbcacheError,
    index::{cache_ids, parse_index, IMMM_SIGNATURE},
};
use crate::artifacts::thumbsdb::{
    error::ThumbsDbError,
    parser::parse_thumbs_db,
    stream::ThumbKind,
};
use crate::error::ExtractError;
use crate::filesystem::{
    files::{file_extension, md5_file},
    metadata::{glob_paths, GlobInfo},
    reader::ByteReader,
};
use crate::output::sink::ThumbnailSink;
use crate::structs::thumbnail::{CancelToken, ExtractOptions, ExtractionSummary, Thumbnail};
use log::{error, info, warn};

/// Container families recognized by their leading bytes
#[derive(Debug, PartialEq)]
pub enum ContainerKind {
    Ole,
    OleInverted,
    ThumbcacheEntries,
    ThumbcacheIndex,
}

/// Identify the container family from the file's first bytes
pub(crate) fn detect_container(reader: &mut ByteReader) -> Result<ContainerKind, ExtractError> {
    let signature_size = 8;
    if reader.size() < signature_size {
        return Err(ExtractError::UnknownSignature);
    }

    let signature_result = reader.read_at(0, signature_size as usize);
    let signature = match signature_result {
        Ok(result) => result,
        Err(err) => {
            error!("[extractor] Could not read signature from {}: {err:?}", reader.path());
            return Err(ExtractError::Input);
        }
    };

    if signature == OLE_SIGNATURE {
        return Ok(ContainerKind::Ole);
    }
    if signature == OLE_SIGNATURE_BETA {
        return Ok(ContainerKind::OleInverted);
    }
    if signature[0..4] == CMMM_SIGNATURE {
        return Ok(ContainerKind::ThumbcacheEntries);
    }
    if signature[0..4] == IMMM_SIGNATURE {
        return Ok(ContainerKind::ThumbcacheIndex);
    }

    warn!("[extractor] {} matches no supported container", reader.path());
    Err(ExtractError::UnknownSignature)
}

/// Extract every thumbnail in one input file, emitting to the sink in
/// on-disk order. The optional ESEDB view joins extra metadata by Thumb
/// Cache ID
pub fn extract_file(
    path: &str,
    sink: &mut dyn ThumbnailSink,
    esedb: Option<&EsedbView>,
    options: &ExtractOptions,
    cancel: &CancelToken,
) -> Result<ExtractionSummary, ExtractError> {
    let reader_result = ByteReader::open(path);
    let mut reader = match reader_result {
        Ok(result) => result,
        Err(err) => {
            error!("[extractor] Could not open {path}: {err:?}");
            return Err(ExtractError::Input);
        }
    };

    let mut summary = ExtractionSummary {
        source: path.to_string(),
        ..Default::default()
    };
    if options.md5 {
        summary.md5 = md5_file(path, options.md5_max_size);
    }

    let kind = detect_container(&mut reader)?;
    match kind {
        ContainerKind::Ole | ContainerKind::OleInverted => {
            if kind == ContainerKind::OleInverted {
                info!("[extractor] {path} uses the inverted beta OLE signature");
                reader.set_inverted(true);
            }
            extract_thumbs_db(&mut reader, sink, esedb, cancel, &mut summary)?;
        }
        ContainerKind::ThumbcacheEntries => {
            extract_thumbcache(&mut reader, sink, esedb, options, cancel, &mut summary)?;
        }
        ContainerKind::ThumbcacheIndex => {
            extract_index(&mut reader, cancel, &mut summary)?;
        }
    }

    Ok(summary)
}

fn extract_thumbs_db(
    reader: &mut ByteReader,
    sink: &mut dyn ThumbnailSink,
    esedb: Option<&EsedbView>,
    cancel: &CancelToken,
    summary: &mut ExtractionSummary,
) -> Result<(), ExtractError> {
    let parse_result = parse_thumbs_db(reader, cancel);
    let thumbs = match parse_result {
        Ok(result) => result,
        Err(ThumbsDbError::Cancelled) => return Err(ExtractError::Cancelled),
        Err(err) => {
            error!("[extractor] Could not parse {}: {err:?}", reader.path());
            return Err(ExtractError::OleContainer);
        }
    };

    summary.skipped_streams = thumbs.skipped;
    if let Some(catalog) = &thumbs.catalog {
        summary.catalog_entries = catalog.entries.len() as u32;
    }

    for stream in &thumbs.streams {
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }

        // Type 1 sample layout is observed, not documented
        if stream.decoded.kind == ThumbKind::Type1 {
            info!(
                "[extractor] Stream {} rebuilt from raw Type 1 sample data",
                stream.name
            );
        }

        let mut thumbnail = Thumbnail::new(reader.path());
        thumbnail.stream_id = stream.stream_id;
        thumbnail.cache_id = stream.cache_id;
        thumbnail.width = Some(stream.decoded.width);
        thumbnail.height = Some(stream.decoded.height);
        thumbnail.mime = Some(String::from("image/jpeg"));
        thumbnail.data = stream.decoded.data.clone();

        if let (Some(stream_id), Some(catalog)) = (stream.stream_id, &thumbs.catalog) {
            if let Some(entry) = catalog.entry_for_id(stream_id) {
                thumbnail.original_name = Some(entry.name.clone());
                thumbnail.mtime = Some(entry.mtime);
            }
        }

        if let (Some(cache_id), Some(view)) = (stream.cache_id, esedb) {
            if let Some(row) = view.get(cache_id) {
                join_ese_row(&mut thumbnail, row);
            }
        }

        if let Err(err) = sink.write(&thumbnail) {
            error!("[extractor] Sink rejected stream {}: {err:?}", stream.name);
            return Err(ExtractError::Sink);
        }
        summary.emitted += 1;
    }

    if summary.catalog_entries > 0 {
        let agrees = summary.catalog_entries == summary.emitted;
        if !agrees {
            warn!(
                "[extractor] {} catalog names {} entries but {} streams were extracted",
                reader.path(),
                summary.catalog_entries,
                summary.emitted
            );
        }
        summary.catalog_agrees = Some(agrees);
    }

    Ok(())
}

fn extract_thumbcache(
    reader: &mut ByteReader,
    sink: &mut dyn ThumbnailSink,
    esedb: Option<&EsedbView>,
    options: &ExtractOptions,
    cancel: &CancelToken,
    summary: &mut ExtractionSummary,
) -> Result<(), ExtractError> {
    let parse_result = parse_cache(reader, cancel, options.verify_checksums);
    let (_header, entries, mismatches) = match parse_result {
        Ok(result) => result,
        Err(ThumbcacheError::Cancelled) => return Err(ExtractError::Cancelled),
        Err(err) => {
            error!("[extractor] Could not parse {}: {err:?}", reader.path());
            return Err(ExtractError::Thumbcache);
        }
    };
    summary.checksum_mismatches = mismatches;

    for entry in &entries {
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }

        let mut thumbnail = Thumbnail::new(reader.path());
        thumbnail.cache_id = Some(entry.cache_id);
        thumbnail.width = entry.width;
        thumbnail.height = entry.height;
        thumbnail.mime = entry.mime.clone();
        thumbnail.data = entry.data.clone();

        if thumbnail.data.is_empty() {
            summary.dormant += 1;
        }

        // Vista entries name their payload type even when magic sniffing fails
        if thumbnail.mime.is_none() && !thumbnail.data.is_empty() {
            if let Some(extension) = &entry.extension {
                thumbnail.mime = mime_from_extension(extension);
            }
        }

        if let Some(view) = esedb {
            if let Some(row) = view.get(entry.cache_id) {
                join_ese_row(&mut thumbnail, row);
            }
        }

        if let Err(err) = sink.write(&thumbnail) {
            error!(
                "[extractor] Sink rejected cache entry {}: {err:?}",
                entry.identifier
            );
            return Err(ExtractError::Sink);
        }
        summary.emitted += 1;
    }

    Ok(())
}

fn extract_index(
    reader: &mut ByteReader,
    cancel: &CancelToken,
    summary: &mut ExtractionSummary,
) -> Result<(), ExtractError> {
    let parse_result = parse_index(reader, cancel);
    let (_header, entries) = match parse_result {
        Ok(result) => result,
        Err(ThumbcacheError::Cancelled) => return Err(ExtractError::Cancelled),
        Err(err) => {
            error!("[extractor] Could not parse {}: {err:?}", reader.path());
            return Err(ExtractError::Thumbcache);
        }
    };

    // The index names no payloads; it only feeds reporting
    let ids = cache_ids(&entries);
    summary.index_entries = ids.len() as u32;
    for entry in ids.values() {
        info!(
            "[extractor] Cache id {:x} present in buckets {:?}",
            entry.cache_id,
            entry.present_buckets()
        );
    }
    info!(
        "[extractor] {} holds {} used index entries",
        reader.path(),
        summary.index_entries
    );
    Ok(())
}

/// Fill empty thumbnail fields from a Windows Search row. Catalog values
/// already present stay untouched
fn join_ese_row(thumbnail: &mut Thumbnail, row: &EseRow) {
    let ese_name = row.original_name();
    if let (Some(catalog_name), Some(search_name)) = (&thumbnail.original_name, &ese_name) {
        if !extensions_agree(catalog_name, search_name) {
            warn!(
                "[extractor] Catalog name {catalog_name} and Search name {search_name} disagree on extension"
            );
        }
    }

    if thumbnail.original_name.is_none() {
        thumbnail.original_name = ese_name;
    }
    if thumbnail.mtime.is_none() {
        thumbnail.mtime = row.modified;
    }
    if thumbnail.width.is_none() {
        thumbnail.width = row.image_width;
    }
    if thumbnail.height.is_none() {
        thumbnail.height = row.image_height;
    }
    if thumbnail.mime.is_none() {
        thumbnail.mime = row.mime.clone();
    }
}

/// Compare file extensions case-insensitively
fn extensions_agree(left: &str, right: &str) -> bool {
    file_extension(left).eq_ignore_ascii_case(&file_extension(right))
}

fn mime_from_extension(extension: &str) -> Option<String> {
    let lower = extension.to_lowercase();
    match lower.as_str() {
        "jpg" | "jpeg" => Some(String::from("image/jpeg")),
        "png" => Some(String::from("image/png")),
        "bmp" => Some(String::from("image/bmp")),
        _ => None,
    }
}

/// Identify a file's container family without extracting anything
pub fn identify_file(path: &str) -> Result<ContainerKind, ExtractError> {
    let reader_result = ByteReader::open(path);
    let mut reader = match reader_result {
        Ok(result) => result,
        Err(err) => {
            error!("[extractor] Could not open {path}: {err:?}");
            return Err(ExtractError::Input);
        }
    };
    detect_container(&mut reader)
}

/// Windows Search database location under a mounted system drive
pub fn default_esedb_path(base: &str) -> String {
    format!("{base}/ProgramData/Microsoft/Search/Data/Applications/Windows/Windows.edb")
}

/// Find per-user thumbcache files under a mounted system drive
pub fn discover_thumbcache(base: &str) -> Result<Vec<GlobInfo>, ExtractError> {
    let pattern =
        format!("{base}/Users/*/AppData/Local/Microsoft/Windows/Explorer/thumbcache_*.db");
    let glob_result = glob_paths(&pattern);
    match glob_result {
        Ok(result) => Ok(result),
        Err(err) => {
            error!("[extractor] Could not glob {pattern}: {err:?}");
            Err(ExtractError::Input)
        }
    }
}
