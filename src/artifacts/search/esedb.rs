use super::error::SearchError;
use crate::filesystem::files::get_filename;
use crate::utils::time::filetime_to_unixepoch;
use libesedb::{EseDb, Value};
use log::{error, info, warn};
use std::collections::HashMap;

/// Windows Search property tables, newest first
const PROPERTY_TABLES: [&str; 2] = ["SystemIndex_PropertyStore", "SystemIndex_0A"];

/// One Windows Search row that carries a Thumb Cache ID
#[derive(Debug, Clone, Default)]
pub struct EseRow {
    pub cache_id: u64,
    pub path: Option<String>,
    pub item_name: Option<String>,
    pub file_name: Option<String>,
    pub extension: Option<String>,
    pub size: Option<u64>,
    pub modified: Option<i64>,
    pub created: Option<i64>,
    pub accessed: Option<i64>,
    pub mime: Option<String>,
    pub item_type: Option<String>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
}

impl EseRow {
    /// Best original file name the row offers
    pub fn original_name(&self) -> Option<String> {
        if let Some(name) = &self.file_name {
            return Some(name.clone());
        }
        if let Some(name) = &self.item_name {
            return Some(name.clone());
        }
        let path = self.path.as_ref()?;
        let name = get_filename(path);
        if name.is_empty() {
            return None;
        }
        Some(name)
    }
}

/// Property columns the cross-referencer extracts. Search column names are
/// prefixed with a numeric tag (Ex: 4443-System_ItemPathDisplay), so
/// matching goes by suffix
enum ColumnTag {
    CacheId,
    Path,
    ItemName,
    FileName,
    Extension,
    Size,
    Modified,
    Created,
    Accessed,
    Mime,
    ItemType,
    ImageWidth,
    ImageHeight,
}

impl ColumnTag {
    fn from_name(name: &str) -> Option<ColumnTag> {
        if name.ends_with("System_ThumbnailCacheId") {
            Some(ColumnTag::CacheId)
        } else if name.ends_with("System_ItemPathDisplay") {
            Some(ColumnTag::Path)
        } else if name.ends_with("System_ItemName") {
            Some(ColumnTag::ItemName)
        } else if name.ends_with("System_FileName") {
            Some(ColumnTag::FileName)
        } else if name.ends_with("System_FileExtension") {
            Some(ColumnTag::Extension)
        } else if name.ends_with("System_Size") {
            Some(ColumnTag::Size)
        } else if name.ends_with("System_DateModified") {
            Some(ColumnTag::Modified)
        } else if name.ends_with("System_DateCreated") {
            Some(ColumnTag::Created)
        } else if name.ends_with("System_DateAccessed") {
            Some(ColumnTag::Accessed)
        } else if name.ends_with("System_MIMEType") {
            Some(ColumnTag::Mime)
        } else if name.ends_with("System_ItemType") {
            Some(ColumnTag::ItemType)
        } else if name.ends_with("System_Image_HorizontalSize") {
            Some(ColumnTag::ImageWidth)
        } else if name.ends_with("System_Image_VerticalSize") {
            Some(ColumnTag::ImageHeight)
        } else {
            None
        }
    }
}

/// Read-only view over the Windows Search database, indexed by Thumb Cache
/// ID. The ESE handle is released once the map is built
#[derive(Debug, Default)]
pub struct EsedbView {
    rows: HashMap<u64, EseRow>,
}

impl EsedbView {
    /// Open `Windows.edb` (or equivalent) read-only and index every row
    /// bearing a Thumb Cache ID
    pub fn from_file(path: &str) -> Result<EsedbView, SearchError> {
        let db_result = EseDb::open(path);
        let db = match db_result {
            Ok(result) => result,
            Err(err) => {
                error!("[search] Could not open ESE database {path}: {err:?}");
                return Err(SearchError::EsedbUnreadable);
            }
        };

        let mut table = None;
        for name in PROPERTY_TABLES {
            if let Ok(result) = db.table_by_name(name) {
                info!("[search] Using ESE table {name} from {path}");
                table = Some(result);
                break;
            }
        }
        let table = match table {
            Some(result) => result,
            None => {
                warn!("[search] {path} has no SystemIndex_PropertyStore or SystemIndex_0A table");
                return Err(SearchError::EsedbSchemaMissing);
            }
        };

        let columns_result = table.iter_columns();
        let columns = match columns_result {
            Ok(result) => result,
            Err(err) => {
                error!("[search] Could not list ESE columns in {path}: {err:?}");
                return Err(SearchError::EsedbSchemaMissing);
            }
        };

        let mut tags = Vec::new();
        for (index, column_result) in columns.enumerate() {
            let column = match column_result {
                Ok(result) => result,
                Err(_err) => continue,
            };
            let name = match column.name() {
                Ok(result) => result,
                Err(_err) => continue,
            };
            if let Some(tag) = ColumnTag::from_name(&name) {
                tags.push((index, tag));
            }
        }

        let has_cache_id = tags
            .iter()
            .any(|(_, tag)| matches!(tag, ColumnTag::CacheId));
        if !has_cache_id {
            warn!("[search] {path} has no System_ThumbnailCacheId column");
            return Err(SearchError::EsedbSchemaMissing);
        }

        let records_result = table.iter_records();
        let records = match records_result {
            Ok(result) => result,
            Err(err) => {
                error!("[search] Could not iterate ESE records in {path}: {err:?}");
                return Err(SearchError::EsedbSchemaMissing);
            }
        };

        let mut rows = HashMap::new();
        for record_result in records {
            let record = match record_result {
                Ok(result) => result,
                Err(_err) => continue,
            };

            let mut row = EseRow::default();
            let mut cache_id = None;
            for (index, tag) in &tags {
                let value_result = record.value(*index as i32);
                let value = match value_result {
                    Ok(result) => result,
                    Err(_err) => continue,
                };

                match tag {
                    ColumnTag::CacheId => cache_id = value_bytes(&value).and_then(cache_id_bytes),
                    ColumnTag::Path => row.path = value_string(&value),
                    ColumnTag::ItemName => row.item_name = value_string(&value),
                    ColumnTag::FileName => row.file_name = value_string(&value),
                    ColumnTag::Extension => row.extension = value_string(&value),
                    ColumnTag::Size => row.size = value_bytes(&value).and_then(size_bytes),
                    ColumnTag::Modified => row.modified = value_filetime(&value),
                    ColumnTag::Created => row.created = value_filetime(&value),
                    ColumnTag::Accessed => row.accessed = value_filetime(&value),
                    ColumnTag::Mime => row.mime = value_string(&value),
                    ColumnTag::ItemType => row.item_type = value_string(&value),
                    ColumnTag::ImageWidth => row.image_width = value_integer(&value),
                    ColumnTag::ImageHeight => row.image_height = value_integer(&value),
                }
            }

            // Rows without a cache id cannot join anything
            let id = match cache_id {
                Some(result) => result,
                None => continue,
            };
            row.cache_id = id;
            rows.insert(id, row);
        }

        info!("[search] Indexed {} ESE rows from {path}", rows.len());
        Ok(EsedbView { rows })
    }

    /// Build a view from rows extracted elsewhere
    pub fn from_rows(rows: Vec<EseRow>) -> EsedbView {
        let mut map = HashMap::new();
        for row in rows {
            map.insert(row.cache_id, row);
        }
        EsedbView { rows: map }
    }

    /// Look up the row for a Thumb Cache ID
    pub fn get(&self, cache_id: u64) -> Option<&EseRow> {
        self.rows.get(&cache_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::Text(result) | Value::LargeText(result) => Some(result.clone()),
        _ => None,
    }
}

fn value_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Binary(result) | Value::LargeBinary(result) => Some(result.clone()),
        _ => None,
    }
}

/// Search stores FILETIMEs in 8-byte binary columns
fn value_filetime(value: &Value) -> Option<i64> {
    let data = value_bytes(value)?;
    let filetime_size = 8;
    if data.len() != filetime_size {
        return None;
    }
    let filetime = u64::from_le_bytes(data.try_into().ok()?);
    let unset = 0;
    if filetime == unset {
        return None;
    }
    Some(filetime_to_unixepoch(&filetime))
}

fn value_integer(value: &Value) -> Option<u32> {
    match value {
        Value::I32(result) => u32::try_from(*result).ok(),
        Value::U32(result) => Some(*result),
        Value::I16(result) => u32::try_from(*result).ok(),
        Value::U16(result) => Some(u32::from(*result)),
        _ => None,
    }
}

/// The cache id column holds the id's big-endian bytes
fn cache_id_bytes(data: Vec<u8>) -> Option<u64> {
    let max_size = 8;
    if data.is_empty() || data.len() > max_size {
        return None;
    }
    let mut id: u64 = 0;
    for byte in data {
        id = (id << 8) | u64::from(byte);
    }
    Some(id)
}

/// System_Size is a little-endian binary column up to 8 bytes wide
fn size_bytes(data: Vec<u8>) -> Option<u64> {
    let max_size = 8;
    if data.is_empty() || data.len() > max_size {
        return None;
    }
    let mut size: u64 = 0;
    for (index, byte) in data.iter().enumerate() {
        size |= u64::from(*byte) << (index * 8);
    }
    Some(size)
}

#[cfg(test)]
mod tests {
    use super::{cache_id_bytes, size_bytes, value_filetime, value_string, EseRow, EsedbView};
    use libesedb::Value;

    #[test]
    fn test_cache_id_bytes() {
        let data = vec![0x1a, 0x2b, 0x3c, 0x4d, 0x5e, 0x6f, 0x70, 0x80];
        assert_eq!(cache_id_bytes(data), Some(0x1a2b3c4d5e6f7080));

        let short = vec![0x1a, 0x2b];
        assert_eq!(cache_id_bytes(short), Some(0x1a2b));

        assert_eq!(cache_id_bytes(Vec::new()), None);
        assert_eq!(cache_id_bytes(vec![0; 9]), None);
    }

    #[test]
    fn test_size_bytes() {
        assert_eq!(size_bytes(vec![0x00, 0x10]), Some(4096));
        assert_eq!(size_bytes(vec![1, 0, 0, 0, 0, 0, 0, 0]), Some(1));
    }

    #[test]
    fn test_value_string() {
        assert_eq!(
            value_string(&Value::Text(String::from("a.png"))),
            Some(String::from("a.png"))
        );
        assert_eq!(value_string(&Value::U32(5)), None);
    }

    #[test]
    fn test_value_filetime() {
        let value = Value::Binary(132038640000000000u64.to_le_bytes().to_vec());
        assert_eq!(value_filetime(&value), Some(1559390400));

        let unset = Value::Binary(vec![0; 8]);
        assert_eq!(value_filetime(&unset), None);
    }

    #[test]
    fn test_from_rows_and_get() {
        let row = EseRow {
            cache_id: 0x1a2b3c4d5e6f7080,
            path: Some(String::from("C:\\Users\\x\\a.png")),
            ..Default::default()
        };
        let view = EsedbView::from_rows(vec![row]);
        assert_eq!(view.len(), 1);

        let result = view.get(0x1a2b3c4d5e6f7080).unwrap();
        assert_eq!(result.original_name(), Some(String::from("a.png")));
        assert!(view.get(1).is_none());
    }

    #[test]
    fn test_original_name_prefers_file_name() {
        let row = EseRow {
            cache_id: 1,
            file_name: Some(String::from("photo.jpg")),
            path: Some(String::from("C:\\x\\other.jpg")),
            ..Default::default()
        };
        assert_eq!(row.original_name(), Some(String::from("photo.jpg")));
    }
}
