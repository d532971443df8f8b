//! User-visible message catalog.
//!
//! The admin frontend matches on several of these strings, so they are kept
//! byte-for-byte stable. Do not reword them.

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

pub const INVALID_RESOURCE_ID: &str = "ID tài nguyên không hợp lệ";
pub const INVALID_COLLECTION_ID: &str = "ID bộ sưu tập không hợp lệ";
pub const INVALID_PRIMARY_TAG_ID: &str = "ID thẻ tag không hợp lệ";
pub const INVALID_TAG_ID: &str = "ID tag không hợp lệ";
pub const INVALID_CATEGORY_ID: &str = "ID danh mục không hợp lệ";

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub const MISSING_REQUIRED_FIELDS: &str = "Vui lòng nhập đầy đủ thông tin bắt buộc";
pub const MISSING_FILE: &str = "Vui lòng chọn file";
pub const INVALID_PLAN: &str = "Gói tài nguyên không hợp lệ";
pub const INVALID_STATUS: &str = "Trạng thái không hợp lệ";
pub const EMPTY_STATUS: &str = "Trạng thái không được để trống";
pub const INVALID_TAG_LIST: &str = "Danh sách tag không hợp lệ";
pub const UNSUPPORTED_FILE_TYPE: &str = "Loại file không được hỗ trợ";

// ---------------------------------------------------------------------------
// Not found
// ---------------------------------------------------------------------------

/// Used by detail, update, delete and status operations.
pub const RESOURCE_NOT_FOUND: &str = "Không tìm thấy tài nguyên";
/// Used by tag and collection membership operations.
pub const RESOURCE_MISSING: &str = "Tài nguyên không tồn tại";
pub const CATEGORY_MISSING: &str = "Danh mục không tồn tại";
pub const TAG_MISSING: &str = "Thẻ tag không tồn tại";
pub const COLLECTION_MISSING: &str = "Bộ sưu tập không tồn tại";
pub const COLLECTION_MISSING_OR_DENIED: &str =
    "Bộ sưu tập không tồn tại hoặc bạn không có quyền truy cập";
pub const USER_MISSING: &str = "Người dùng không tồn tại";
pub const TAG_NOT_ON_RESOURCE: &str = "Tag không tồn tại trong tài nguyên này";
pub const RESOURCE_NOT_IN_COLLECTION: &str = "Tài nguyên không có trong bộ sưu tập này";

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

pub const EDIT_DENIED: &str = "Bạn không có quyền chỉnh sửa tài nguyên này";
pub const DELETE_DENIED: &str = "Bạn không có quyền xóa tài nguyên này";
pub const COLLECTION_DENIED: &str = "Bạn không có quyền truy cập bộ sưu tập này";
pub const OPERATION_DENIED: &str = "Bạn không có quyền thực hiện thao tác này";

// ---------------------------------------------------------------------------
// Conflicts and store failures
// ---------------------------------------------------------------------------

pub const ALREADY_IN_COLLECTION: &str = "Tài nguyên đã có trong bộ sưu tập này";
pub const DELETE_FAILED: &str = "Không thể xóa tài nguyên";
pub const STATUS_UPDATE_FAILED: &str = "Không thể cập nhật trạng thái";
pub const DETAIL_LOAD_FAILED: &str = "Không thể lấy thông tin tài nguyên";
pub const UPLOAD_FAILED: &str = "Lỗi khi upload file lên Cloudinary";

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

pub const UPDATED: &str = "Cập nhật tài nguyên thành công";
pub const DELETED: &str = "Xóa tài nguyên thành công";
pub const TAG_REMOVED: &str = "Xóa tag thành công";
pub const ADDED_TO_COLLECTION: &str = "Thêm tài nguyên vào bộ sưu tập thành công";
pub const REMOVED_FROM_COLLECTION: &str = "Xóa tài nguyên khỏi bộ sưu tập thành công";

/// Success message for a newly created resource carrying `total_tags` tags.
pub fn created(total_tags: usize) -> String {
    format!("Tạo tài nguyên thành công và đã thêm vào bộ sưu tập với {total_tags} tag(s)")
}

/// Success message for `add_tags_to_resource`.
pub fn tags_added(added: u64) -> String {
    format!("Thêm {added} tag(s) thành công")
}

/// Success message for a status transition.
pub fn status_updated(status: &str) -> String {
    format!("Cập nhật trạng thái thành \"{status}\" thành công")
}

/// Rejection for a file above `max_bytes`, with the limit in the largest
/// unit that divides it evenly.
pub fn file_too_large(max_bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;
    let limit = if max_bytes >= MB && max_bytes % MB == 0 {
        format!("{}MB", max_bytes / MB)
    } else if max_bytes >= KB && max_bytes % KB == 0 {
        format!("{}KB", max_bytes / KB)
    } else {
        format!("{max_bytes} bytes")
    };
    format!("File quá lớn. Vui lòng chọn file nhỏ hơn {limit}.")
}
