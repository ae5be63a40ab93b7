mod photo;
mod photo_store;

pub use photo::{Photo, format_timestamp};
pub use photo_store::{
    DATA_URI_PREFIX, PHOTO_EXTENSION, PhotoStore, StorageStats, generate_filename,
    is_safe_filename,
};
